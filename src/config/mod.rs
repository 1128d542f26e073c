mod settings;

use config::{Config, Environment, File};

use settings::PartialSettings;

use crate::utils::RelayError;

pub use settings::{BrokerSettings, LogSettings, ServerSettings, Settings};

/// Default location of the optional settings file (any format `config` knows).
pub const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, RelayError> {
    load_config_from(DEFAULT_CONFIG_FILE)
}

/// Loads the configuration from `path` (optional) and `ROOMCAST_*`
/// environment variables, e.g. `ROOMCAST_SERVER__PORT=9000`.
/// Environment values take precedence over the file; anything left unset
/// falls back to `Settings::default()`. A value of the wrong type is a
/// `RelayError::Config`.
pub fn load_config_from(path: &str) -> Result<Settings, RelayError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("ROOMCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}

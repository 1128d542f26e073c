use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the transports, the broker and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

/// Configuration settings for the transports.
///
/// `port` serves the HTTP/SSE routes, `ws_port` the WebSocket listener.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub ws_port: u16,
    pub allow_all_origins: bool,
    pub keep_alive_secs: u64,
}

/// Configuration settings for the broker.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    /// Pending messages a listener may fall behind by before new ones are dropped.
    pub inbox_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values are filled from
/// `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ws_port: Option<u16>,
    pub allow_all_origins: Option<bool>,
    pub keep_alive_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub inbox_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                ws_port: 8081,
                allow_all_origins: true,
                keep_alive_secs: 15,
            },
            broker: BrokerSettings {
                inbox_capacity: 256,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from `defaults`.
    pub fn merge(self, defaults: Settings) -> Settings {
        let server = self.server;
        let broker = self.broker;
        let log = self.log;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(defaults.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(defaults.server.port),
                ws_port: server
                    .as_ref()
                    .and_then(|s| s.ws_port)
                    .unwrap_or(defaults.server.ws_port),
                allow_all_origins: server
                    .as_ref()
                    .and_then(|s| s.allow_all_origins)
                    .unwrap_or(defaults.server.allow_all_origins),
                keep_alive_secs: server
                    .as_ref()
                    .and_then(|s| s.keep_alive_secs)
                    .unwrap_or(defaults.server.keep_alive_secs),
            },
            broker: BrokerSettings {
                inbox_capacity: broker
                    .as_ref()
                    .and_then(|b| b.inbox_capacity)
                    .unwrap_or(defaults.broker.inbox_capacity),
            },
            log: LogSettings {
                level: log
                    .and_then(|l| l.level)
                    .unwrap_or(defaults.log.level),
            },
        }
    }
}

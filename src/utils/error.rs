//! Process-level failures.
//!
//! The broker and stream sessions have no error surface of their own: empty
//! rooms, full inboxes and peer disconnects are ordinary outcomes. What can
//! fail is everything around them, such as reading configuration or binding
//! a listener.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

use serde::{Deserialize, Serialize};

/// Fields a client supplies when posting into a room.
///
/// Used both for the HTTP form body and for inbound WebSocket text frames.
/// Missing fields are treated as empty strings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PublishRequest {
    pub name: String,
    pub message: String,
}

/// Body returned by `POST /{room}/send`.
#[derive(Debug, Deserialize, Serialize)]
pub struct SendResponse {
    pub message: String,
}

impl SendResponse {
    pub fn sent() -> Self {
        Self {
            message: "The message was sent".to_string(),
        }
    }
}

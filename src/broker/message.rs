//! Message definitions for the broker
//!
//! `Message` is both the internal fan-out value and the wire shape written to
//! listeners. It is built once by the broker at publish time and shared with
//! every subscriber behind an `Arc`, so it is never mutated after creation.
//!
//! Notes on fields:
//! - `name`: sender name as supplied by the publisher (may be empty)
//! - `message`: message body as supplied by the publisher (may be empty)
//! - `timestamp`: milliseconds since UNIX epoch; set by the broker, never by
//!   the caller

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub message: String,
    pub timestamp: i64,
}

impl Message {
    /// Encode the message as one JSON event frame.
    pub fn to_frame(&self) -> String {
        // Three string/integer fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

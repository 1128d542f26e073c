//! The `transport` module exposes the broker to the network.
//!
//! - `http`: `POST /{room}/send` publishes, `GET /{room}/messages` streams the
//!   room as Server-Sent Events
//! - `websocket`: `ws://host/{room}` streams the room and accepts publish
//!   frames on the same socket
//!
//! Both adapters only translate requests into broker calls and stream
//! sessions; neither holds state of its own.

pub mod http;
pub mod message;
pub mod websocket;

pub use http::{router, start_http_server};
pub use message::{PublishRequest, SendResponse};
pub use websocket::start_websocket_server;

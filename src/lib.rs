//! # roomcast
//!
//! `roomcast` is a minimal real-time fan-out relay. Clients post messages
//! into a named room; everyone listening on that room receives each message
//! as a live event stream.
//!
//! ## Core Modules
//!
//! - `broker`: registry of rooms and their listeners, and the fan-out engine.
//! - `session`: the per-connection loop that forwards one listener's inbox to
//!   its peer and unsubscribes when the peer goes away.
//! - `transport`: HTTP (Server-Sent Events) and WebSocket adapters.
//! - `config`: loading server, broker and logging settings.
//! - `utils`: the process-level error type and logging setup.

pub mod broker;
pub mod config;
pub mod session;
pub mod transport;
pub mod utils;

pub use broker::{Broker, Delivery, Message};
pub use session::{SessionEnd, StreamSession};

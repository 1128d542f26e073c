//! The `broker` module is the process-wide registry of rooms and their
//! listeners, and the fan-out engine that delivers published messages.

pub mod engine;
pub mod message;
pub mod room;
pub mod subscriber;

pub use engine::{Broker, Delivery};
pub use message::Message;
pub use subscriber::{Subscriber, Unsubscribe};

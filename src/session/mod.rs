//! The `session` module bridges one long-lived listener connection to one
//! broker subscriber.
//!
//! A `StreamSession` subscribes on open, forwards every message from its
//! inbox to the peer as one event frame, and unsubscribes exactly once when it
//! ends, whichever way it ends.

pub mod stream;

pub use stream::{SessionEnd, StreamSession};

#[cfg(test)]
mod tests;

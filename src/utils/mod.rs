//! The `utils` module provides definitions shared across `roomcast`: the
//! process-level error type and logging setup.

pub mod error;
pub mod logging;

pub use error::RelayError;

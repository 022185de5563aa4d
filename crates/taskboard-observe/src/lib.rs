//! Logging setup and a pipeline observer that reports events through `tracing`.

mod logger;
pub use logger::*;

mod subscriber;
pub use subscriber::{EventLogger, message_for};

#[cfg(test)]
pub(crate) mod testing;

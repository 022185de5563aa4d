mod config;
mod error;
mod format;
mod log;

pub use config::{FORMAT_VAR, LEVEL_VAR, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

#[cfg(test)]
pub(crate) use log::build;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when called twice.
pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    log::install(cfg)
}

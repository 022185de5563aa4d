use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::{Directive, Filtered},
    fmt::{self, MakeWriter, time::OffsetTime},
    layer::{Layered, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// HTTP stack under the store client; chatty below `warn`.
const TRANSPORT_TARGETS: [&str; 3] = ["hyper_util", "reqwest", "h2"];

type Output = Box<dyn Layer<Registry> + Send + Sync>;

/// Subscriber assembled from a [`LoggerConfig`].
pub(crate) type Pipeline = Layered<Filtered<Output, EnvFilter, Registry>, Registry>;

/// Build the subscriber described by `cfg`, writing text and json to `writer`.
pub(crate) fn build<W>(cfg: &LoggerConfig, writer: W) -> Result<Pipeline, LoggerError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let output: Output = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(local_timer())
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_current_span(true)
            .with_span_list(false)
            .with_timer(local_timer())
            .boxed(),
        LoggerFormat::Journald => journald()?,
    };
    Ok(tracing_subscriber::registry().with(output.with_filter(filter(&cfg.level)?)))
}

/// Install the subscriber for `cfg` as the global default, logging to stdout.
pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    build(cfg, std::io::stdout)?.try_init().map_err(init_error)
}

/// Parse `level`, capping the transport crates at `warn` unless it names them.
fn filter(level: &str) -> Result<EnvFilter, LoggerError> {
    let invalid = || LoggerError::InvalidLogLevel(level.to_string());
    let mut filter = EnvFilter::try_new(level).map_err(|_| invalid())?;
    for target in TRANSPORT_TARGETS {
        if level.contains(target) {
            continue;
        }
        let directive: Directive = format!("{target}=warn").parse().map_err(|_| invalid())?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn init_error(e: TryInitError) -> LoggerError {
    let message = e.to_string();
    // Both the dispatcher and the `log` bridge report "already ... set".
    if message.contains("already") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(message)
    }
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald() -> Result<Output, LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("taskboard".to_string());
    Ok(layer.boxed())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald() -> Result<Output, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

//! Subscriber installation.
//!
//! Log output goes to stderr so result envelopes on stdout stay parseable.

use crate::error::{Error, Result};
use crate::telemetry::config::{LogFormat, LogLevel, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(layer(config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}

/// Install the global subscriber, raised by `-v` flags.
///
/// Verbosity only ever makes logging more detailed than configured.
pub fn init_from_verbosity(mut config: LoggingConfig, verbosity: u8) -> Result<()> {
    if verbosity > 0 {
        config.level = config.level.min(LogLevel::from_verbosity(verbosity));
        config.with_target |= verbosity >= 2;
        config.with_file |= verbosity >= 3;
    }
    init(&config)
}

/// A formatting layer for `config`, filtered and writing to stderr.
pub fn layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
{
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_file(config.with_file)
        .with_line_number(config.with_file);

    match config.format {
        LogFormat::Pretty => fmt
            .pretty()
            .with_ansi(config.ansi_colors)
            .with_filter(filter(config))
            .boxed(),
        LogFormat::Compact => fmt
            .compact()
            .with_ansi(config.ansi_colors)
            .with_filter(filter(config))
            .boxed(),
        LogFormat::Json => fmt
            .json()
            .with_current_span(false)
            .with_filter(filter(config))
            .boxed(),
    }
}

/// `RUST_LOG` wins over configured directives, which win over the level.
fn filter(config: &LoggingConfig) -> EnvFilter {
    let level = config.level.as_str();

    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return from_env;
    }
    config
        .filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

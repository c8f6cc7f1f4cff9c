use crate::config::{AppConfig, AppEnvironment};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' is not a valid tracing directive")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the configured
/// log level. Production output stays compact and ANSI-free for log
/// shippers; development keeps targets and colors for local reading.
pub fn init(config: &AppConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| level_filter(&config.telemetry.log_level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.environment {
        AppEnvironment::Production => builder
            .with_target(false)
            .with_ansi(false)
            .compact()
            .try_init(),
        AppEnvironment::Development | AppEnvironment::Test => builder.try_init(),
    }
    .map_err(TelemetryError::AlreadyInitialized)
}

fn level_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level).map_err(|source| TelemetryError::Filter {
        value: level.to_string(),
        source,
    })
}

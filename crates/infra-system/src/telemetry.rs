// Logging setup
// IMOBILE_LOG_FORMAT=json for structured output, anything else for pretty
use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FORMAT_ENV: &str = "IMOBILE_LOG_FORMAT";
const DEFAULT_FILTER: &str = "imobile=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var(LOG_FORMAT_ENV).unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global tracing subscriber.
/// `RUST_LOG` overrides the default filter.
///
/// # Errors
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_tracing() -> Result<()> {
    init_tracing_with(LogFormat::from_env())
}

pub fn init_tracing_with(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow!("invalid log filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

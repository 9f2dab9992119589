//! Logging and tracing utilities
//!
//! - Production: structured JSON logs
//! - Development: human-readable, coloured logs

use crate::config::Environment;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// JSON in production, pretty everywhere else
    pub fn from_environment() -> Self {
        if Environment::from_env().is_production() {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing subscriber with the format picked from the environment
pub fn init_tracing() {
    init_tracing_with(LogFormat::from_environment());
}

/// Initialize tracing subscriber with an explicit output format
///
/// Logs go to stderr so that reports written to stdout stay clean.
pub fn init_tracing_with(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter());

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("Tracing already initialised: {}", e);
    }
}

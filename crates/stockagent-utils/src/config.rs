//! Runtime environment detection and `.env` loading

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable selecting the runtime environment
pub const ENVIRONMENT_VAR: &str = "STOCKAGENT_ENV";

/// Runtime environment the process is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (default)
    #[default]
    Development,
    /// Production deployment
    Production,
}

impl Environment {
    /// Parse an environment name; anything unrecognised is development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Read the environment from `STOCKAGENT_ENV`
    pub fn from_env() -> Self {
        std::env::var(ENVIRONMENT_VAR)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Load variables from a `.env` file in the current directory or any parent.
///
/// Variables already present in the process environment win. Returns the path
/// of the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to parse .env file: {}", e);
            None
        }
    }
}

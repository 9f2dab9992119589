//! Configuration for stock analysis runs

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the Polygon.io API key
pub const POLYGON_API_KEY_VAR: &str = "POLYGON_API_KEY";
/// Environment variable holding the Finnhub API key
pub const FINNHUB_API_KEY_VAR: &str = "FINNHUB_API_KEY";
/// Environment variable selecting the market data provider
pub const PROVIDER_VAR: &str = "STOCKAGENT_PROVIDER";

/// Longest price history a run may request (about 30 years)
pub const MAX_HISTORY_DAYS: u32 = 11_000;
/// Longest news search window
pub const MAX_NEWS_LOOKBACK_DAYS: u32 = 365;

/// Market data provider for price history and company details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataProvider {
    /// Polygon.io (default, requires API key)
    #[default]
    Polygon,
    /// Yahoo Finance (no API key required)
    Yahoo,
}

impl std::str::FromStr for DataProvider {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polygon" => Ok(Self::Polygon),
            "yahoo" => Ok(Self::Yahoo),
            other => Err(StockError::ConfigError(format!(
                "Unknown data provider '{other}'. Supported: polygon, yahoo"
            ))),
        }
    }
}

/// Configuration for stock analysis runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Provider for price history and company details
    pub data_provider: DataProvider,

    /// Polygon.io API key
    pub polygon_api_key: Option<String>,

    /// Finnhub API key; news sentiment is skipped without it
    pub finnhub_api_key: Option<String>,

    /// Calendar days of daily bars to fetch
    pub history_days: u32,

    /// Maximum headlines requested from the news provider
    pub max_headlines: usize,

    /// Headlines kept in the sentiment result (highest |score| first)
    pub top_headlines: usize,

    /// Calendar days of news to search
    pub news_lookback_days: u32,

    /// Polygon requests per minute
    pub polygon_rate_limit: u32,

    /// News provider requests per minute
    pub news_rate_limit: u32,

    /// Request timeout duration
    pub request_timeout: Duration,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            data_provider: DataProvider::Polygon,
            polygon_api_key: None,
            finnhub_api_key: None,
            history_days: 90,
            max_headlines: 8,
            top_headlines: 5,
            news_lookback_days: 7,
            polygon_rate_limit: 5, // free tier
            news_rate_limit: 60,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Build and validate a configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.data_provider == DataProvider::Polygon && self.polygon_api_key.is_none() {
            return Err(StockError::ConfigError(format!(
                "{POLYGON_API_KEY_VAR} environment variable is required for the Polygon provider. \
                 Set it in your .env file or environment (free keys at https://polygon.io/), \
                 or use the yahoo provider"
            )));
        }

        if self.history_days == 0 || self.history_days > MAX_HISTORY_DAYS {
            return Err(StockError::ConfigError(format!(
                "history_days must be between 1 and {MAX_HISTORY_DAYS}, got {}",
                self.history_days
            )));
        }

        if self.news_lookback_days == 0 || self.news_lookback_days > MAX_NEWS_LOOKBACK_DAYS {
            return Err(StockError::ConfigError(format!(
                "news_lookback_days must be between 1 and {MAX_NEWS_LOOKBACK_DAYS}, got {}",
                self.news_lookback_days
            )));
        }

        if self.max_headlines == 0 || self.top_headlines == 0 {
            return Err(StockError::ConfigError(
                "max_headlines and top_headlines must be greater than 0".to_string(),
            ));
        }

        if self.polygon_rate_limit == 0 || self.news_rate_limit == 0 {
            return Err(StockError::ConfigError(
                "rate limits must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    data_provider: Option<DataProvider>,
    polygon_api_key: Option<String>,
    finnhub_api_key: Option<String>,
    history_days: Option<u32>,
    max_headlines: Option<usize>,
    top_headlines: Option<usize>,
    news_lookback_days: Option<u32>,
    polygon_rate_limit: Option<u32>,
    news_rate_limit: Option<u32>,
    request_timeout: Option<Duration>,
    env_provider_error: Option<StockError>,
}

impl StockConfigBuilder {
    /// Set the market data provider
    pub fn data_provider(mut self, provider: DataProvider) -> Self {
        self.data_provider = Some(provider);
        self
    }

    /// Set the Polygon.io API key
    pub fn polygon_api_key(mut self, key: impl Into<String>) -> Self {
        self.polygon_api_key = Some(key.into());
        self
    }

    /// Set the Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    /// Set how many calendar days of history to fetch
    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Set the maximum number of headlines to fetch
    pub fn max_headlines(mut self, count: usize) -> Self {
        self.max_headlines = Some(count);
        self
    }

    /// Set the number of headlines kept in the result
    pub fn top_headlines(mut self, count: usize) -> Self {
        self.top_headlines = Some(count);
        self
    }

    /// Set the news search window
    pub fn news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = Some(days);
        self
    }

    /// Set the Polygon rate limit (requests per minute)
    pub fn polygon_rate_limit(mut self, per_minute: u32) -> Self {
        self.polygon_rate_limit = Some(per_minute);
        self
    }

    /// Set the news provider rate limit (requests per minute)
    pub fn news_rate_limit(mut self, per_minute: u32) -> Self {
        self.news_rate_limit = Some(per_minute);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Fill unset keys and provider from the environment
    pub fn with_env(mut self) -> Self {
        if self.polygon_api_key.is_none() {
            self.polygon_api_key = non_empty_var(POLYGON_API_KEY_VAR);
        }
        if self.finnhub_api_key.is_none() {
            self.finnhub_api_key = non_empty_var(FINNHUB_API_KEY_VAR);
        }
        if self.data_provider.is_none() {
            if let Some(value) = non_empty_var(PROVIDER_VAR) {
                match value.parse() {
                    Ok(provider) => self.data_provider = Some(provider),
                    Err(e) => self.env_provider_error = Some(e),
                }
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        if let Some(err) = self.env_provider_error {
            return Err(err);
        }

        let defaults = StockConfig::default();

        let config = StockConfig {
            data_provider: self.data_provider.unwrap_or(defaults.data_provider),
            polygon_api_key: self.polygon_api_key,
            finnhub_api_key: self.finnhub_api_key,
            history_days: self.history_days.unwrap_or(defaults.history_days),
            max_headlines: self.max_headlines.unwrap_or(defaults.max_headlines),
            top_headlines: self.top_headlines.unwrap_or(defaults.top_headlines),
            news_lookback_days: self
                .news_lookback_days
                .unwrap_or(defaults.news_lookback_days),
            polygon_rate_limit: self
                .polygon_rate_limit
                .unwrap_or(defaults.polygon_rate_limit),
            news_rate_limit: self.news_rate_limit.unwrap_or(defaults.news_rate_limit),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

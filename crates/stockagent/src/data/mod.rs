//! Market data providers

mod polygon;
mod yahoo;

pub use polygon::PolygonClient;
pub use yahoo::YahooFinanceClient;

use crate::config::{DataProvider, StockConfig};
use crate::error::{Result, StockError};
use crate::models::Bar;
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Company name and sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerDetails {
    pub company_name: String,
    pub sector: String,
}

/// Latest daily prices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviousClose {
    pub previous_close: f64,
    pub current_price: f64,
}

/// Source of daily bars, company details and recent prices.
///
/// Implementations normalise tickers (trim, upper-case) before querying.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars covering the last `days` calendar days, oldest first
    async fn price_history(&self, ticker: &str, days: u32) -> Result<Vec<Bar>>;

    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails>;

    async fn previous_close(&self, ticker: &str) -> Result<PreviousClose>;
}

/// Build the market data source selected in the configuration
pub fn create_market_data_source(config: &StockConfig) -> Result<Arc<dyn MarketDataSource>> {
    match config.data_provider {
        DataProvider::Polygon => {
            let api_key = config.polygon_api_key.as_deref().ok_or_else(|| {
                StockError::ConfigError("Polygon provider requires POLYGON_API_KEY".to_string())
            })?;
            let client = PolygonClient::new(api_key, config.polygon_rate_limit)
                .with_timeout(config.request_timeout);
            Ok(Arc::new(client))
        }
        DataProvider::Yahoo => Ok(Arc::new(YahooFinanceClient::new())),
    }
}

pub(crate) fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Start of a window reaching `days` calendar days back from `end`
pub(crate) fn lookback_start(end: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    end.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| StockError::ConfigError(format!("a {days}-day window is out of range")))
}

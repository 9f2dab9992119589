//! Yahoo Finance client (no API key required)

use super::{MarketDataSource, PreviousClose, TickerDetails, lookback_start, normalize_ticker};
use crate::error::{Result, StockError};
use crate::models::Bar;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// Calendar days fetched to find the two most recent sessions
const RECENT_WINDOW_DAYS: u32 = 10;

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    /// Daily quotes between `start` and `end`, oldest first
    async fn quote_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        tracing::debug!(symbol, %start, %end, "Fetching Yahoo quote history");

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| StockError::YahooFinanceError(format!("{symbol}: {e}")))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(format!("{symbol}: {e}")))?;

        let bars: Vec<Bar> = quotes
            .iter()
            .filter_map(|q| {
                let timestamp = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(Bar {
                    timestamp,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(StockError::TickerNotFound(symbol.to_string()));
        }
        Ok(bars)
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn price_history(&self, ticker: &str, days: u32) -> Result<Vec<Bar>> {
        let symbol = normalize_ticker(ticker);
        let end = Utc::now();
        let start = lookback_start(end, days)?;
        self.quote_history(&symbol, start, end).await
    }

    /// Yahoo's quote API carries no company profile; the ticker stands in for the name
    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails> {
        Ok(TickerDetails {
            company_name: normalize_ticker(ticker),
            sector: "Unknown".to_string(),
        })
    }

    async fn previous_close(&self, ticker: &str) -> Result<PreviousClose> {
        let bars = self.price_history(ticker, RECENT_WINDOW_DAYS).await?;
        Ok(latest_prices(&bars))
    }
}

/// Second-to-last close as the previous close, last close as the current price
fn latest_prices(bars: &[Bar]) -> PreviousClose {
    let current_price = bars.last().map_or(0.0, |b| b.close);
    let previous_close = bars
        .len()
        .checked_sub(2)
        .map_or(current_price, |i| bars[i].close);

    PreviousClose {
        previous_close,
        current_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[test]
    fn test_latest_prices() {
        let prices = latest_prices(&[bar(1, 10.0), bar(4, 11.0), bar(5, 12.5)]);
        assert_eq!(prices.previous_close, 11.0);
        assert_eq!(prices.current_price, 12.5);

        let single = latest_prices(&[bar(1, 10.0)]);
        assert_eq!(single.previous_close, 10.0);
        assert_eq!(single.current_price, 10.0);
    }

    #[tokio::test]
    async fn test_ticker_details_fallback() {
        let client = YahooFinanceClient::new();
        let details = client.ticker_details(" msft").await.unwrap();
        assert_eq!(details.company_name, "MSFT");
        assert_eq!(details.sector, "Unknown");
    }

    #[tokio::test]
    async fn test_oversized_window_is_config_error() {
        let client = YahooFinanceClient::new();
        let err = client.price_history("AAPL", 1_000_000_000).await.unwrap_err();
        assert!(matches!(err, StockError::ConfigError(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_price_history() {
        let client = YahooFinanceClient::new();
        let bars = client.price_history("AAPL", 30).await.unwrap();
        assert!(!bars.is_empty());
        assert!(bars.iter().all(|b| b.close > 0.0));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_previous_close() {
        let client = YahooFinanceClient::new();
        let prices = client.previous_close("AAPL").await.unwrap();
        assert!(prices.current_price > 0.0);
        assert!(prices.previous_close > 0.0);
    }
}

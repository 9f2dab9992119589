//! Polygon.io REST client

use super::{MarketDataSource, PreviousClose, TickerDetails, lookback_start, normalize_ticker};
use crate::error::{Result, StockError};
use crate::models::Bar;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://api.polygon.io";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// One daily aggregate bar
#[derive(Debug, Clone, Deserialize)]
struct AggregateBar {
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    /// Polygon reports volume as a float for some tickers
    #[serde(rename = "v", default)]
    volume: f64,
    /// Bar start (UNIX milliseconds)
    #[serde(rename = "t")]
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResult {
    name: Option<String>,
    sic_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: Option<TickerDetailsResult>,
}

impl TryFrom<AggregateBar> for Bar {
    type Error = StockError;

    fn try_from(agg: AggregateBar) -> Result<Self> {
        let timestamp = DateTime::from_timestamp_millis(agg.timestamp)
            .ok_or_else(|| StockError::ApiError(format!("Invalid bar timestamp {}", agg.timestamp)))?
            .date_naive();

        Ok(Self {
            timestamp,
            open: agg.open,
            high: agg.high,
            low: agg.low,
            close: agg.close,
            volume: agg.volume.max(0.0) as u64,
        })
    }
}

/// Polygon.io client with a per-minute rate limiter (free tier: 5 requests/min)
#[derive(Debug, Clone)]
pub struct PolygonClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl PolygonClient {
    /// Create a new Polygon client
    ///
    /// # Arguments
    /// * `api_key` - Polygon.io API key
    /// * `rate_limit` - Maximum requests per minute
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Point the client at another host (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    /// GET `path` with the API key attached and map Polygon's error statuses
    async fn get_json<T: DeserializeOwned>(
        &self,
        ticker: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{path}", self.base_url);
        tracing::debug!(ticker, path, "Polygon request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StockError::ApiError(format!("API error for ticker '{ticker}': {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StockError::TickerNotFound(ticker.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(StockError::RateLimitExceeded {
                    provider: "Polygon".to_string(),
                });
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(StockError::ApiError(format!(
                    "API error for ticker '{ticker}': HTTP {status}: {body}"
                )));
            }
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StockError::ApiError(format!("API error for ticker '{ticker}': {e}")))
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    async fn price_history(&self, ticker: &str, days: u32) -> Result<Vec<Bar>> {
        let ticker = normalize_ticker(ticker);
        let now = Utc::now();
        let to = now.date_naive();
        let from = lookback_start(now, days)?.date_naive();

        let path = format!(
            "/v2/aggs/ticker/{ticker}/range/1/day/{}/{}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        // Buffer for weekends and holidays
        let limit = (u64::from(days) + 10).to_string();
        let query = [
            ("adjusted", "true".to_string()),
            ("sort", "asc".to_string()),
            ("limit", limit),
        ];

        let response: AggregatesResponse = self.get_json(&ticker, &path, &query).await?;
        let results = response.results.unwrap_or_default();
        if results.is_empty() {
            return Err(StockError::TickerNotFound(ticker));
        }

        let bars = results
            .into_iter()
            .map(Bar::try_from)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(ticker = %ticker, bars = bars.len(), "Fetched price history");
        Ok(bars)
    }

    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails> {
        let ticker = normalize_ticker(ticker);
        let path = format!("/v3/reference/tickers/{ticker}");

        let response: TickerDetailsResponse = self.get_json(&ticker, &path, &[]).await?;
        let details = response
            .results
            .ok_or_else(|| StockError::TickerNotFound(ticker.clone()))?;

        Ok(TickerDetails {
            company_name: details.name.unwrap_or_else(|| ticker.clone()),
            sector: details
                .sic_description
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }

    async fn previous_close(&self, ticker: &str) -> Result<PreviousClose> {
        let ticker = normalize_ticker(ticker);
        let path = format!("/v2/aggs/ticker/{ticker}/prev");

        let response: AggregatesResponse = self
            .get_json(&ticker, &path, &[("adjusted", "true".to_string())])
            .await?;
        let bar = response
            .results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| StockError::TickerNotFound(ticker.clone()))?;

        // Daily data: the latest known price is the previous close
        Ok(PreviousClose {
            previous_close: bar.close,
            current_price: bar.close,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> PolygonClient {
        PolygonClient::new("test_key", 600).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_price_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v2/aggs/ticker/AAPL/range/1/day/\d{4}-\d{2}-\d{2}/\d{4}-\d{2}-\d{2}$"))
            .and(query_param("apiKey", "test_key"))
            .and(query_param("limit", "40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ticker": "AAPL",
                "status": "OK",
                "results": [
                    {"o": 150.0, "h": 152.0, "l": 149.0, "c": 151.0, "v": 5.5e7, "t": 1_704_153_600_000_i64},
                    {"o": 151.0, "h": 153.5, "l": 150.5, "c": 153.0, "v": 6.1e7, "t": 1_704_240_000_000_i64}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let bars = client.price_history(" aapl", 30).await.unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].close, 153.0);
        assert_eq!(bars[1].volume, 61_000_000);
    }

    #[tokio::test]
    async fn test_oversized_window_is_config_error() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        let err = client.price_history("AAPL", u32::MAX).await.unwrap_err();
        assert!(matches!(err, StockError::ConfigError(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_price_history_empty_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v2/aggs/ticker/ZZZZ/range/.*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ticker": "ZZZZ",
                "resultsCount": 0
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.price_history("ZZZZ", 90).await.unwrap_err();
        assert!(matches!(err, StockError::TickerNotFound(ref t) if t == "ZZZZ"));
    }

    #[tokio::test]
    async fn test_ticker_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/reference/tickers/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": {
                    "ticker": "AAPL",
                    "name": "Apple Inc.",
                    "sic_description": "ELECTRONIC COMPUTERS"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let details = client.ticker_details("AAPL").await.unwrap();
        assert_eq!(details.company_name, "Apple Inc.");
        assert_eq!(details.sector, "ELECTRONIC COMPUTERS");
    }

    #[tokio::test]
    async fn test_ticker_details_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/reference/tickers/XYZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": {"ticker": "XYZ"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let details = client.ticker_details("xyz").await.unwrap();
        assert_eq!(details.company_name, "XYZ");
        assert_eq!(details.sector, "Unknown");
    }

    #[tokio::test]
    async fn test_previous_close() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/MSFT/prev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"o": 410.0, "h": 415.0, "l": 405.0, "c": 412.5, "v": 2.0e7, "t": 1_704_240_000_000_i64}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let prices = client.previous_close("MSFT").await.unwrap();
        assert_eq!(prices.previous_close, 412.5);
        assert_eq!(prices.current_price, 412.5);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/NOPE/prev"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/BUSY/prev"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/FAIL/prev"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let err = client.previous_close("NOPE").await.unwrap_err();
        assert!(matches!(err, StockError::TickerNotFound(_)));

        let err = client.previous_close("BUSY").await.unwrap_err();
        assert!(matches!(err, StockError::RateLimitExceeded { ref provider } if provider == "Polygon"));

        let err = client.previous_close("FAIL").await.unwrap_err();
        assert!(matches!(err, StockError::ApiError(_)));
        assert!(err.to_string().contains("FAIL"));
    }
}

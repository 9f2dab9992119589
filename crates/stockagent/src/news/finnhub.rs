//! Finnhub company news client

use super::{NewsArticle, NewsSource};
use crate::data::lookback_start;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://finnhub.io/api/v1";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Finnhub news article as returned by `/company-news`
#[derive(Debug, Clone, Deserialize)]
struct FinnhubArticle {
    /// Publish time (UNIX seconds)
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    url: String,
}

impl From<FinnhubArticle> for NewsArticle {
    fn from(article: FinnhubArticle) -> Self {
        let date = DateTime::from_timestamp(article.datetime, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        Self {
            title: article.headline,
            url: article.url,
            date,
            source: article.source,
        }
    }
}

/// Finnhub client for company news
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    base_url: String,
    lookback_days: u32,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            lookback_days: 7,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Point the client at another host (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Days of news to search, ending today
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    /// Company news for `symbol` published between `from` and `to` (YYYY-MM-DD), newest first
    async fn company_news(&self, symbol: &str, from: &str, to: &str) -> Result<Vec<FinnhubArticle>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/company-news", self.base_url);
        tracing::debug!(symbol, from, to, "Fetching Finnhub company news");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("from", from),
                ("to", to),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StockError::ApiError(format!("Finnhub request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(StockError::RateLimitExceeded {
                provider: "Finnhub".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::ApiError(format!(
                "Finnhub API error {status}: {body}"
            )));
        }

        let mut articles = response
            .json::<Vec<FinnhubArticle>>()
            .await
            .map_err(|e| StockError::ApiError(format!("Failed to parse Finnhub response: {e}")))?;

        articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(articles)
    }
}

#[async_trait]
impl NewsSource for FinnhubClient {
    async fn fetch_headlines(
        &self,
        ticker: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>> {
        let symbol = ticker.trim().to_uppercase();
        let now = Utc::now();
        let to = now.date_naive();
        let from = lookback_start(now, self.lookback_days)?.date_naive();

        tracing::debug!(symbol = %symbol, query, "Searching news");

        let articles = self
            .company_news(
                &symbol,
                &from.format("%Y-%m-%d").to_string(),
                &to.format("%Y-%m-%d").to_string(),
            )
            .await?;

        Ok(articles
            .into_iter()
            .filter(|a| !a.headline.trim().is_empty())
            .take(max_results)
            .map(NewsArticle::from)
            .collect())
    }
}

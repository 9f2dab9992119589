//! News search providers

mod finnhub;

pub use finnhub::FinnhubClient;

use crate::config::StockConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A news article headline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub date: String,
    pub source: String,
}

/// Source of recent news headlines for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch up to `max_results` recent articles.
    ///
    /// `query` is the free-text search ("Apple Inc. stock"); providers with a
    /// symbol-based API may only use `ticker`.
    async fn fetch_headlines(
        &self,
        ticker: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>>;
}

/// News source for the configuration, `None` without a Finnhub key
pub fn create_news_source(config: &StockConfig) -> Option<Arc<dyn NewsSource>> {
    let Some(api_key) = config.finnhub_api_key.as_deref() else {
        tracing::debug!("No Finnhub API key configured, news sentiment disabled");
        return None;
    };

    let client = FinnhubClient::new(api_key, config.news_rate_limit)
        .with_lookback_days(config.news_lookback_days)
        .with_timeout(config.request_timeout);

    Some(Arc::new(client))
}

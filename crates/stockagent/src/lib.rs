//! Stock recommendation engine
//!
//! This crate turns a ticker symbol into a buy/sell/hold recommendation by
//! combining technical indicators with keyword-based news sentiment:
//!
//! - Market data from Polygon.io or Yahoo Finance ([`data`])
//! - Company news from Finnhub ([`news`])
//! - RSI, MACD, Bollinger Bands and moving averages ([`indicators`])
//! - Headline sentiment scoring ([`sentiment`])
//! - A fixed-weight scoring engine producing a composite score, a
//!   recommendation, a confidence and ranked explanations ([`scoring`])
//! - A markdown report ([`report`])
//!
//! # Architecture
//!
//! [`StockAnalysisPipeline`] fetches market data, runs technical and sentiment
//! analysis concurrently, scores the result and renders the report. Providers
//! sit behind the [`MarketDataSource`] and [`NewsSource`] traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockagent::{StockAnalysisPipeline, StockConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StockConfig::from_env()?;
//!     let pipeline = StockAnalysisPipeline::from_config(&config)?;
//!
//!     let analysis = pipeline.run("AAPL").await?;
//!     println!("{}", analysis.report);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod news;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod sentiment;

pub use config::{DataProvider, StockConfig};
pub use data::{MarketDataSource, PolygonClient, YahooFinanceClient};
pub use error::{Result, StockError};
pub use models::{Recommendation, SentimentResult, TechnicalSignals};
pub use news::{FinnhubClient, NewsSource};
pub use pipeline::{StockAnalysis, StockAnalysisPipeline};
pub use scoring::{ScoreCard, ScoringEngine};

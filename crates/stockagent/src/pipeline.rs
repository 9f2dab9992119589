//! End-to-end stock analysis: fetch, analyze, recommend, report
//!
//! ```text
//! fetch (history, details, previous close)
//!   -> technical analysis | news sentiment   (concurrent)
//!   -> recommend
//!   -> synthesize report
//! ```
//!
//! Provider failures never abort a run. Each one is recorded in
//! [`StockAnalysis::errors`] and the affected stage falls back to neutral input.

use crate::config::{FINNHUB_API_KEY_VAR, StockConfig};
use crate::data::{MarketDataSource, create_market_data_source};
use crate::error::{Result, StockError};
use crate::indicators;
use crate::models::{Bar, SentimentResult, TechnicalSignals};
use crate::news::{NewsSource, create_news_source};
use crate::report::render_report;
use crate::scoring::{ScoreCard, ScoringEngine};
use crate::sentiment::SentimentAnalyzer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Factor shown when no signal moved the score
pub const INSUFFICIENT_DATA_FACTOR: &str = "Insufficient data for detailed analysis";

/// Complete result of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct StockAnalysis {
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub generated_at: DateTime<Utc>,
    pub current_price: f64,
    pub previous_close: f64,
    #[serde(skip)]
    pub price_data: Vec<Bar>,
    pub technical_signals: TechnicalSignals,
    pub news_sentiment: SentimentResult,
    #[serde(flatten)]
    pub score: ScoreCard,
    /// Markdown report
    pub report: String,
    /// Non-fatal problems met along the way
    pub errors: Vec<String>,
}

/// Output of the fetch stage
#[derive(Debug, Default)]
struct FetchedData {
    price_data: Vec<Bar>,
    company_name: String,
    sector: String,
    current_price: f64,
    previous_close: f64,
    errors: Vec<String>,
}

/// Analysis pipeline over a market data source and an optional news source
pub struct StockAnalysisPipeline {
    market_data: Arc<dyn MarketDataSource>,
    sentiment: Option<SentimentAnalyzer>,
    engine: ScoringEngine,
    history_days: u32,
}

impl StockAnalysisPipeline {
    pub fn new(
        market_data: Arc<dyn MarketDataSource>,
        news: Option<Arc<dyn NewsSource>>,
        config: &StockConfig,
    ) -> Self {
        Self {
            market_data,
            sentiment: news.map(|source| {
                SentimentAnalyzer::new(source, config.max_headlines, config.top_headlines)
            }),
            engine: ScoringEngine::standard(),
            history_days: config.history_days,
        }
    }

    /// Pipeline with the providers selected in the configuration
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let market_data = create_market_data_source(config)?;
        let news = create_news_source(config);
        Ok(Self::new(market_data, news, config))
    }

    /// Replace the standard scoring engine
    pub fn with_engine(mut self, engine: ScoringEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Run the full analysis for `ticker`
    pub async fn run(&self, ticker: &str) -> Result<StockAnalysis> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(StockError::InvalidSymbol("No ticker provided".to_string()));
        }

        tracing::info!(ticker = %ticker, "Starting analysis");

        let FetchedData {
            price_data,
            company_name,
            sector,
            current_price,
            previous_close,
            mut errors,
        } = self.fetch(&ticker).await;

        let (technical_signals, (news_sentiment, sentiment_error)) = tokio::join!(
            async { technical_analysis(&price_data, current_price) },
            self.news_sentiment(&ticker, &company_name),
        );
        errors.extend(sentiment_error);

        let mut score = self.engine.evaluate(&technical_signals, Some(&news_sentiment));
        if score.explanation_factors.is_empty() {
            score
                .explanation_factors
                .push(INSUFFICIENT_DATA_FACTOR.to_string());
        }

        tracing::info!(
            ticker = %ticker,
            recommendation = %score.recommendation,
            composite_score = score.composite_score,
            confidence = score.confidence,
            warnings = errors.len(),
            "Analysis complete"
        );

        let mut analysis = StockAnalysis {
            ticker,
            company_name,
            sector,
            generated_at: Utc::now(),
            current_price,
            previous_close,
            price_data,
            technical_signals,
            news_sentiment,
            score,
            report: String::new(),
            errors,
        };
        analysis.report = render_report(&analysis);

        Ok(analysis)
    }

    async fn fetch(&self, ticker: &str) -> FetchedData {
        let (history, details, prices) = tokio::join!(
            self.market_data.price_history(ticker, self.history_days),
            self.market_data.ticker_details(ticker),
            self.market_data.previous_close(ticker),
        );

        let mut fetched = FetchedData {
            company_name: ticker.to_string(),
            sector: "Unknown".to_string(),
            ..FetchedData::default()
        };

        match history {
            Ok(bars) => fetched.price_data = bars,
            Err(e) => {
                tracing::warn!(ticker, error = %e, "Price history unavailable");
                fetched.errors.push(format!("Error fetching price data: {e}"));
            }
        }

        match details {
            Ok(details) => {
                fetched.company_name = details.company_name;
                fetched.sector = details.sector;
            }
            Err(e) => {
                tracing::warn!(ticker, error = %e, "Company details unavailable");
                fetched.errors.push(format!("Error fetching company details: {e}"));
            }
        }

        match prices {
            Ok(prices) => {
                fetched.current_price = prices.current_price;
                fetched.previous_close = prices.previous_close;
            }
            Err(e) => {
                tracing::warn!(ticker, error = %e, "Latest price unavailable");
                fetched.errors.push(format!("Error fetching price: {e}"));
            }
        }

        tracing::debug!(
            ticker,
            bars = fetched.price_data.len(),
            current_price = fetched.current_price,
            "Fetched market data"
        );
        fetched
    }

    /// Neutral sentiment plus a warning when news is unavailable
    async fn news_sentiment(
        &self,
        ticker: &str,
        company_name: &str,
    ) -> (SentimentResult, Option<String>) {
        let Some(analyzer) = &self.sentiment else {
            tracing::warn!("{FINNHUB_API_KEY_VAR} not set, skipping news sentiment");
            return (
                SentimentResult::neutral(),
                Some(format!(
                    "News sentiment skipped: {FINNHUB_API_KEY_VAR} is not set"
                )),
            );
        };

        match analyzer.analyze(ticker, Some(company_name)).await {
            Ok(sentiment) => (sentiment, None),
            Err(e) => (
                SentimentResult::neutral(),
                Some(format!("Error analyzing news sentiment: {e}")),
            ),
        }
    }
}

/// Indicators from the price history; a known latest price replaces the last close
fn technical_analysis(price_data: &[Bar], current_price: f64) -> TechnicalSignals {
    let mut signals = indicators::calculate_all(price_data);
    if current_price > 0.0 {
        signals.current_price = current_price;
    }
    signals
}

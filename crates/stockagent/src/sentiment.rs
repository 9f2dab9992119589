//! Keyword-based news headline sentiment

use crate::error::Result;
use crate::models::{HeadlineSentiment, SentimentLabel, SentimentResult};
use crate::news::{NewsArticle, NewsSource};
use std::sync::Arc;

/// Bullish keywords, lowercase
pub const POSITIVE_KEYWORDS: [&str; 30] = [
    "surge",
    "surges",
    "growth",
    "profit",
    "profits",
    "bullish",
    "upgrade",
    "upgraded",
    "beat",
    "beats",
    "record",
    "strong",
    "gain",
    "gains",
    "rally",
    "rallies",
    "soar",
    "soars",
    "jump",
    "jumps",
    "rise",
    "rises",
    "positive",
    "boost",
    "outperform",
    "buy",
    "winner",
    "success",
    "breakthrough",
    "innovation",
];

/// Bearish keywords, lowercase
pub const NEGATIVE_KEYWORDS: [&str; 36] = [
    "crash",
    "crashes",
    "loss",
    "losses",
    "decline",
    "declines",
    "bearish",
    "downgrade",
    "downgraded",
    "miss",
    "misses",
    "weak",
    "fall",
    "falls",
    "drop",
    "drops",
    "plunge",
    "plunges",
    "sink",
    "sinks",
    "tumble",
    "tumbles",
    "negative",
    "warning",
    "layoff",
    "layoffs",
    "cut",
    "cuts",
    "sell",
    "underperform",
    "loser",
    "failure",
    "concern",
    "risk",
    "lawsuit",
    "investigation",
];

/// Sentiment of a single headline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlineScore {
    pub score: f64,
    pub label: SentimentLabel,
    pub positive_count: usize,
    pub negative_count: usize,
}

/// Score a headline by keyword counts.
///
/// Matching is case-insensitive substring search, so "surges" also counts
/// "surge". The score is `(pos - neg) / (pos + neg + 1)`.
pub fn analyze_headline(headline: &str) -> HeadlineScore {
    let lower = headline.to_lowercase();

    let positive_count = POSITIVE_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();
    let negative_count = NEGATIVE_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();

    let score = (positive_count as f64 - negative_count as f64)
        / (positive_count + negative_count + 1) as f64;
    let score = score.clamp(-1.0, 1.0);

    HeadlineScore {
        score,
        label: SentimentLabel::from_score(score),
        positive_count,
        negative_count,
    }
}

/// Aggregate article headlines into a sentiment result.
///
/// Articles without a title are skipped. Headlines are ordered by absolute score
/// (ties keep input order) and the first `top_n` are kept.
pub fn aggregate(articles: &[NewsArticle], top_n: usize) -> SentimentResult {
    let mut headlines: Vec<HeadlineSentiment> = articles
        .iter()
        .filter(|a| !a.title.is_empty())
        .map(|a| {
            let scored = analyze_headline(&a.title);
            HeadlineSentiment {
                title: a.title.clone(),
                url: a.url.clone(),
                date: a.date.clone(),
                score: scored.score,
                label: scored.label,
            }
        })
        .collect();

    if headlines.is_empty() {
        return SentimentResult::neutral();
    }

    let headline_count = headlines.len();
    let overall_score = headlines.iter().map(|h| h.score).sum::<f64>() / headline_count as f64;

    headlines.sort_by(|a, b| b.score.abs().total_cmp(&a.score.abs()));
    headlines.truncate(top_n);

    SentimentResult {
        overall_score,
        overall_label: SentimentLabel::from_score(overall_score),
        headlines,
        headline_count,
    }
}

/// Fetches headlines from a [`NewsSource`] and aggregates their sentiment
#[derive(Clone)]
pub struct SentimentAnalyzer {
    source: Arc<dyn NewsSource>,
    max_headlines: usize,
    top_headlines: usize,
}

impl SentimentAnalyzer {
    pub fn new(source: Arc<dyn NewsSource>, max_headlines: usize, top_headlines: usize) -> Self {
        Self {
            source,
            max_headlines,
            top_headlines,
        }
    }

    /// News sentiment for a ticker; `company_name` improves the search query when known
    pub async fn analyze(&self, ticker: &str, company_name: Option<&str>) -> Result<SentimentResult> {
        let query = match company_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => format!("{name} stock"),
            None => format!("{ticker} stock"),
        };

        let articles = self
            .source
            .fetch_headlines(ticker, &query, self.max_headlines)
            .await
            .inspect_err(|e| tracing::warn!(ticker, error = %e, "Error fetching news"))?;

        let result = aggregate(&articles, self.top_headlines);
        tracing::info!(
            ticker,
            score = result.overall_score,
            label = %result.overall_label,
            headlines = result.headline_count,
            "Analyzed news sentiment"
        );
        Ok(result)
    }
}

//! Data models shared across the analysis layers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Open/High/Low/Close/Volume price bar for one trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// MACD line, signal line and histogram (`macd_line - signal_line`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdSignal {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

/// Bollinger Bands; `upper >= middle >= lower` when produced by the indicator layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// RSI reading category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiInterpretation {
    Overbought,
    Oversold,
    Neutral,
}

/// MACD momentum direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacdInterpretation {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for RsiInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
        })
    }
}

impl fmt::Display for MacdInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::Neutral => "Neutral",
        })
    }
}

/// Technical indicator snapshot for one analysis run.
///
/// `current_price` uses `0.0` for "unknown"; read it through [`TechnicalSignals::price`],
/// which maps any non-positive value to `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TechnicalSignals {
    pub rsi: Option<f64>,
    pub macd: Option<MacdSignal>,
    pub bollinger: Option<BollingerBands>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub current_price: f64,
}

impl TechnicalSignals {
    /// All indicators absent
    pub fn empty(current_price: f64) -> Self {
        Self {
            current_price,
            ..Self::default()
        }
    }

    /// Current price, `None` when unknown
    pub fn price(&self) -> Option<f64> {
        (self.current_price > 0.0).then_some(self.current_price)
    }

    pub fn rsi_interpretation(&self) -> RsiInterpretation {
        match self.rsi {
            Some(rsi) if rsi > 70.0 => RsiInterpretation::Overbought,
            Some(rsi) if rsi < 30.0 => RsiInterpretation::Oversold,
            _ => RsiInterpretation::Neutral,
        }
    }

    pub fn macd_interpretation(&self) -> MacdInterpretation {
        match self.macd {
            Some(m) if m.histogram > 0.0 => MacdInterpretation::Bullish,
            Some(m) if m.histogram < 0.0 => MacdInterpretation::Bearish,
            _ => MacdInterpretation::Neutral,
        }
    }
}

/// Sentiment label shared by single headlines and the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// Label for a score in [-1, 1]
    pub fn from_score(score: f64) -> Self {
        if score > 0.2 {
            Self::Positive
        } else if score < -0.2 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored news headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineSentiment {
    pub title: String,
    pub url: String,
    pub date: String,
    pub score: f64,
    pub label: SentimentLabel,
}

/// Aggregate news sentiment for a ticker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Mean headline score in [-1, 1]
    pub overall_score: f64,
    /// Informational; scoring only reads `overall_score`
    pub overall_label: SentimentLabel,
    /// Strongest headlines by absolute score
    pub headlines: Vec<HeadlineSentiment>,
    /// Number of headlines that were scored
    pub headline_count: usize,
}

impl SentimentResult {
    /// No news found
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Discrete recommendation label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

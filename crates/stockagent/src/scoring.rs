//! Recommendation scoring engine
//!
//! Turns a [`TechnicalSignals`] snapshot and an optional [`SentimentResult`] into:
//! - a composite score in [-100, 100]
//! - a [`Recommendation`] label and a confidence percentage
//! - explanation factors ranked by how much each signal moved the score
//!
//! Every signal contributes a bounded amount. With the standard weights the bounds
//! sum to 100, so the clamp on the composite only matters for out-of-contract input.
//! All functions are pure; missing inputs contribute zero.

use crate::error::{Result, StockError};
use crate::models::{BollingerBands, MacdSignal, Recommendation, SentimentResult, TechnicalSignals};
use serde::{Deserialize, Serialize};

/// Composite scores are clamped to `[-SCORE_BOUND, SCORE_BOUND]`
pub const SCORE_BOUND: f64 = 100.0;

/// Share of the MACD weight given when histogram and MACD line disagree in sign
const MACD_MODERATE_FACTOR: f64 = 0.6;

/// Maximum contribution of each signal to the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub rsi: f64,
    pub macd: f64,
    pub moving_averages: f64,
    pub bollinger: f64,
    pub sentiment: f64,
}

impl ScoringWeights {
    /// RSI 20, MACD 25, moving averages 20, Bollinger 15, sentiment 20
    pub const STANDARD: Self = Self {
        rsi: 20.0,
        macd: 25.0,
        moving_averages: 20.0,
        bollinger: 15.0,
        sentiment: 20.0,
    };

    pub fn total(&self) -> f64 {
        self.rsi + self.macd + self.moving_averages + self.bollinger + self.sentiment
    }

    fn validate(&self) -> Result<()> {
        let all = [
            ("rsi", self.rsi),
            ("macd", self.macd),
            ("moving_averages", self.moving_averages),
            ("bollinger", self.bollinger),
            ("sentiment", self.sentiment),
        ];
        for (name, weight) in all {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(StockError::ConfigError(format!(
                    "{name} weight must be a positive number, got {weight}"
                )));
            }
        }
        if !self.total().is_finite() {
            return Err(StockError::ConfigError(format!(
                "weights must have a finite total, got {}",
                self.total()
            )));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Score boundaries between recommendation buckets.
///
/// Buy-side boundaries are exclusive (`score > buy`), sell-side boundaries are
/// inclusive (`score >= sell`), so a score sitting exactly on a boundary lands in
/// the more conservative bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    pub strong_buy: f64,
    pub buy: f64,
    pub sell: f64,
    pub strong_sell: f64,
}

impl RecommendationThresholds {
    pub const STANDARD: Self = Self {
        strong_buy: 60.0,
        buy: 20.0,
        sell: -20.0,
        strong_sell: -60.0,
    };

    fn validate(&self) -> Result<()> {
        let ordered = self.strong_sell < self.sell
            && self.sell <= self.buy
            && self.buy < self.strong_buy;
        if !ordered {
            return Err(StockError::ConfigError(format!(
                "thresholds must satisfy strong_sell < sell <= buy < strong_buy, got {self:?}"
            )));
        }
        Ok(())
    }
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Per-signal contributions to the composite score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rsi: f64,
    pub macd: f64,
    pub moving_averages: f64,
    pub bollinger: f64,
    pub sentiment: f64,
}

impl ScoreBreakdown {
    /// Sum of all contributions, clamped to [-100, 100]; a non-finite sum reads 0
    pub fn total(&self) -> f64 {
        let sum = self.rsi + self.macd + self.moving_averages + self.bollinger + self.sentiment;
        if sum.is_finite() {
            sum.clamp(-SCORE_BOUND, SCORE_BOUND)
        } else {
            0.0
        }
    }
}

/// Everything the report renderer needs from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub composite_score: f64,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub breakdown: ScoreBreakdown,
    /// Ranked by absolute contribution; empty when every signal is neutral
    pub explanation_factors: Vec<String>,
}

/// Scoring engine with fixed weights and thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    thresholds: RecommendationThresholds,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScoringEngine {
    /// Engine with the standard weights and thresholds
    pub const fn standard() -> Self {
        Self {
            weights: ScoringWeights::STANDARD,
            thresholds: RecommendationThresholds::STANDARD,
        }
    }

    /// Engine with custom parameters
    pub fn new(weights: ScoringWeights, thresholds: RecommendationThresholds) -> Result<Self> {
        weights.validate()?;
        thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Oversold is bullish, overbought is bearish.
    ///
    /// | RSI | contribution |
    /// |---|---|
    /// | < 30 | +w |
    /// | [30, 40) | +w/2 |
    /// | [40, 60] | 0 |
    /// | (60, 70] | -w/2 |
    /// | > 70 | -w |
    pub fn score_rsi(&self, rsi: Option<f64>) -> f64 {
        let Some(rsi) = rsi.filter(|v| v.is_finite()) else {
            return 0.0;
        };
        let w = self.weights.rsi;

        if rsi < 30.0 {
            w
        } else if rsi < 40.0 {
            w / 2.0
        } else if rsi <= 60.0 {
            0.0
        } else if rsi <= 70.0 {
            -w / 2.0
        } else {
            -w
        }
    }

    /// Histogram sign gives the direction; a MACD line on the same side of zero
    /// confirms the trend and earns the full weight.
    pub fn score_macd(&self, macd: Option<&MacdSignal>) -> f64 {
        let Some(macd) = macd else {
            return 0.0;
        };
        let w = self.weights.macd;

        if macd.histogram > 0.0 {
            if macd.macd_line > 0.0 {
                w
            } else {
                w * MACD_MODERATE_FACTOR
            }
        } else if macd.histogram < 0.0 {
            if macd.macd_line < 0.0 {
                -w
            } else {
                -w * MACD_MODERATE_FACTOR
            }
        } else {
            0.0
        }
    }

    /// Moving-average alignment. First matching rule wins:
    ///
    /// 1. no price or no SMA-20: 0
    /// 2. SMA-50 and SMA-200 known: `price > sma20 > sma50 > sma200` gives +w,
    ///    the inverse ordering gives -w
    /// 3. SMA-50 known: price above both SMA-20 and SMA-50 gives +w/2, below both -w/2
    /// 4. price above SMA-20 gives +w/4, below gives -w/4, equal gives 0
    pub fn score_moving_averages(&self, signals: &TechnicalSignals) -> f64 {
        let (Some(price), Some(sma_20)) = (signals.price(), signals.sma_20) else {
            return 0.0;
        };
        let w = self.weights.moving_averages;

        if let (Some(sma_50), Some(sma_200)) = (signals.sma_50, signals.sma_200) {
            if price > sma_20 && sma_20 > sma_50 && sma_50 > sma_200 {
                return w;
            }
            if price < sma_20 && sma_20 < sma_50 && sma_50 < sma_200 {
                return -w;
            }
        }

        if let Some(sma_50) = signals.sma_50 {
            if price > sma_20 && price > sma_50 {
                return w / 2.0;
            }
            if price < sma_20 && price < sma_50 {
                return -w / 2.0;
            }
        }

        if price > sma_20 {
            w / 4.0
        } else if price < sma_20 {
            -w / 4.0
        } else {
            0.0
        }
    }

    /// Position of the price inside the bands, `p = (price - lower) / (upper - lower)`.
    ///
    /// Near the lower band (`p < 0.2`) is a bounce setup (+w), near the upper band
    /// (`p > 0.8`) a pullback setup (-w); `[0.2, 0.4)` and `(0.6, 0.8]` give half
    /// weight. Degenerate bands or an unknown price give 0. `price` is
    /// [`TechnicalSignals::price`], so the 0 sentinel is already `None`.
    pub fn score_bollinger(&self, bands: Option<&BollingerBands>, price: Option<f64>) -> f64 {
        let (Some(bands), Some(current_price)) = (bands, price) else {
            return 0.0;
        };
        if bands.upper <= bands.lower || bands.middle <= 0.0 {
            return 0.0;
        }
        let w = self.weights.bollinger;

        let position = (current_price - bands.lower) / (bands.upper - bands.lower);

        if position < 0.2 {
            w
        } else if position > 0.8 {
            -w
        } else if position < 0.4 {
            w / 2.0
        } else if position > 0.6 {
            -w / 2.0
        } else {
            0.0
        }
    }

    /// Linear mapping of the overall sentiment score; not clamped here.
    pub fn score_sentiment(&self, sentiment: Option<&SentimentResult>) -> f64 {
        sentiment
            .map(|s| s.overall_score)
            .filter(|score| score.is_finite())
            .map_or(0.0, |score| score * self.weights.sentiment)
    }

    /// Evaluate all five scorers
    pub fn breakdown(
        &self,
        signals: &TechnicalSignals,
        sentiment: Option<&SentimentResult>,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            rsi: self.score_rsi(signals.rsi),
            macd: self.score_macd(signals.macd.as_ref()),
            moving_averages: self.score_moving_averages(signals),
            bollinger: self.score_bollinger(signals.bollinger.as_ref(), signals.price()),
            sentiment: self.score_sentiment(sentiment),
        }
    }

    /// Sum of all contributions, clamped to [-100, 100]
    pub fn composite_score(
        &self,
        signals: &TechnicalSignals,
        sentiment: Option<&SentimentResult>,
    ) -> f64 {
        self.breakdown(signals, sentiment).total()
    }

    /// Map a composite score to a recommendation bucket
    pub fn classify(&self, score: f64) -> Recommendation {
        let t = &self.thresholds;
        if score > t.strong_buy {
            Recommendation::StrongBuy
        } else if score > t.buy {
            Recommendation::Buy
        } else if score >= t.sell {
            Recommendation::Hold
        } else if score >= t.strong_sell {
            Recommendation::Sell
        } else {
            Recommendation::StrongSell
        }
    }

    /// Recommendation plus confidence (`min(|score|, 100)`)
    pub fn generate_recommendation(&self, score: f64) -> (Recommendation, f64) {
        (self.classify(score), confidence(score))
    }

    /// Human-readable reasons for the score, strongest first
    pub fn explanation_factors(
        &self,
        signals: &TechnicalSignals,
        sentiment: Option<&SentimentResult>,
    ) -> Vec<String> {
        let breakdown = self.breakdown(signals, sentiment);
        self.rank_factors(&breakdown, signals, sentiment)
    }

    /// Score, classify and explain in one pass
    pub fn evaluate(
        &self,
        signals: &TechnicalSignals,
        sentiment: Option<&SentimentResult>,
    ) -> ScoreCard {
        let breakdown = self.breakdown(signals, sentiment);
        let composite_score = breakdown.total();
        let (recommendation, confidence) = self.generate_recommendation(composite_score);
        let explanation_factors = self.rank_factors(&breakdown, signals, sentiment);

        tracing::debug!(
            composite_score,
            %recommendation,
            factors = explanation_factors.len(),
            "Scored signals"
        );

        ScoreCard {
            composite_score,
            recommendation,
            confidence,
            breakdown,
            explanation_factors,
        }
    }

    fn rank_factors(
        &self,
        breakdown: &ScoreBreakdown,
        signals: &TechnicalSignals,
        sentiment: Option<&SentimentResult>,
    ) -> Vec<String> {
        let mut factors: Vec<(f64, String)> = Vec::new();

        if let Some(rsi) = signals.rsi {
            if breakdown.rsi > 0.0 {
                factors.push((breakdown.rsi, format!("RSI at {rsi:.1} indicates oversold (bullish)")));
            } else if breakdown.rsi < 0.0 {
                factors.push((breakdown.rsi, format!("RSI at {rsi:.1} indicates overbought (bearish)")));
            }
        }

        if let Some(macd) = &signals.macd {
            let histogram = macd.histogram;
            if breakdown.macd > 0.0 {
                factors.push((
                    breakdown.macd,
                    format!("MACD histogram positive at {histogram:.2} (bullish)"),
                ));
            } else if breakdown.macd < 0.0 {
                factors.push((
                    breakdown.macd,
                    format!("MACD histogram negative at {histogram:.2} (bearish)"),
                ));
            }
        }

        if let Some(sma_20) = signals.sma_20 {
            let ma = breakdown.moving_averages;
            let strong = self.weights.moving_averages / 2.0;
            let price = signals.current_price;
            if ma > strong {
                factors.push((ma, format!("Price ${price:.2} above all moving averages (strong uptrend)")));
            } else if ma > 0.0 {
                factors.push((ma, format!("Price ${price:.2} above SMA-20 ${sma_20:.2} (uptrend)")));
            } else if ma < -strong {
                factors.push((ma, format!("Price ${price:.2} below all moving averages (strong downtrend)")));
            } else if ma < 0.0 {
                factors.push((ma, format!("Price ${price:.2} below SMA-20 ${sma_20:.2} (downtrend)")));
            }
        }

        if breakdown.bollinger > 0.0 {
            factors.push((
                breakdown.bollinger,
                "Price near lower Bollinger Band (potential bounce)".to_string(),
            ));
        } else if breakdown.bollinger < 0.0 {
            factors.push((
                breakdown.bollinger,
                "Price near upper Bollinger Band (potential pullback)".to_string(),
            ));
        }

        if let Some(s) = sentiment {
            let direction = if breakdown.sentiment > 0.0 {
                Some("bullish")
            } else if breakdown.sentiment < 0.0 {
                Some("bearish")
            } else {
                None
            };
            if let Some(direction) = direction {
                factors.push((
                    breakdown.sentiment,
                    format!(
                        "News sentiment {} ({:.2}) from {} headlines ({direction})",
                        s.overall_label, s.overall_score, s.headline_count
                    ),
                ));
            }
        }

        // sort_by is stable: ties keep RSI, MACD, MA, Bollinger, sentiment order
        factors.sort_by(|a, b| b.0.abs().total_cmp(&a.0.abs()));

        factors.into_iter().map(|(_, text)| text).collect()
    }
}

/// `min(|score|, 100)`
pub fn confidence(score: f64) -> f64 {
    score.abs().min(SCORE_BOUND)
}

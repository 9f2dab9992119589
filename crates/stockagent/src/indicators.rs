//! Technical indicator calculations over daily closes
//!
//! All functions take prices oldest first and return `None` when the series is
//! too short for the requested period.

use crate::models::{Bar, BollingerBands, MacdSignal, TechnicalSignals};
use ta::Next;
use ta::indicators::{BollingerBands as TaBollingerBands, SimpleMovingAverage};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;

/// Mean of the last `period` prices
pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    let window = last_window(prices, period)?;
    let mut indicator = SimpleMovingAverage::new(period).ok()?;
    window.iter().map(|&p| indicator.next(p)).last()
}

/// Relative Strength Index using simple averages of the last `period` changes.
///
/// A window without losses reads 100 when it has gains and 50 when flat.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let changes = &prices[prices.len() - period - 1..];
    let (gains, losses) = changes
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gain, loss), delta| {
            if delta > 0.0 {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        });

    let n = period as f64;
    let avg_gain = gains / n;
    let avg_loss = losses / n;

    if avg_loss == 0.0 {
        return Some(if avg_gain > 0.0 { 100.0 } else { 50.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Exponential moving average seeded with the SMA of the first `period` prices
pub fn ema(prices: &[f64], period: usize) -> Option<f64> {
    ema_series(prices, period).last().copied()
}

/// Running EMA values; element `i` is the EMA after `prices[period - 1 + i]`
fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = prices[..period].iter().sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(prices.len() - period + 1);
    series.push(seed);
    let mut current = seed;
    for &price in &prices[period..] {
        current = (price - current) * multiplier + current;
        series.push(current);
    }
    series
}

/// MACD (12, 26, 9).
///
/// With fewer than nine MACD points the signal line equals the MACD line and the
/// histogram is zero.
pub fn macd(prices: &[f64]) -> Option<MacdSignal> {
    if prices.len() < MACD_SLOW {
        return None;
    }

    let fast = ema_series(prices, MACD_FAST);
    let slow = ema_series(prices, MACD_SLOW);

    // Align both series on the first bar where the slow EMA exists
    let offset = MACD_SLOW - MACD_FAST;
    let macd_values: Vec<f64> = fast[offset..]
        .iter()
        .zip(&slow)
        .map(|(f, s)| f - s)
        .collect();

    let macd_line = *macd_values.last()?;

    match ema(&macd_values, MACD_SIGNAL) {
        Some(signal_line) => Some(MacdSignal {
            macd_line,
            signal_line,
            histogram: macd_line - signal_line,
        }),
        None => Some(MacdSignal {
            macd_line,
            signal_line: macd_line,
            histogram: 0.0,
        }),
    }
}

/// Bollinger Bands over the last `period` prices using the population standard deviation
pub fn bollinger_bands(prices: &[f64], period: usize, multiplier: f64) -> Option<BollingerBands> {
    let window = last_window(prices, period)?;
    let mut indicator = TaBollingerBands::new(period, multiplier).ok()?;
    let output = window.iter().map(|&p| indicator.next(p)).last()?;

    Some(BollingerBands {
        upper: output.upper,
        middle: output.average,
        lower: output.lower,
    })
}

/// Compute every indicator the scoring engine reads.
///
/// The current price is the last close, or 0 when there are no bars.
pub fn calculate_all(bars: &[Bar]) -> TechnicalSignals {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();

    let Some(&current_price) = closes.last() else {
        return TechnicalSignals::empty(0.0);
    };

    let signals = TechnicalSignals {
        rsi: rsi(&closes, RSI_PERIOD),
        macd: macd(&closes),
        bollinger: bollinger_bands(&closes, BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER),
        sma_20: sma(&closes, 20),
        sma_50: sma(&closes, 50),
        sma_200: sma(&closes, 200),
        current_price,
    };

    tracing::debug!(
        bars = closes.len(),
        rsi = ?signals.rsi,
        sma_200 = ?signals.sma_200,
        "Calculated technical indicators"
    );

    signals
}

fn last_window(prices: &[f64], period: usize) -> Option<&[f64]> {
    if period == 0 || prices.len() < period {
        return None;
    }
    Some(&prices[prices.len() - period..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn close_enough(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn bars_from(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000,
            })
            .collect()
    }

    #[test]
    fn test_sma() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 5), Some(3.0));
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 2), Some(4.5));
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[1.0, 2.0], 0), None);
    }

    #[test]
    fn test_rsi_directions() {
        assert_eq!(rsi(&rising(20), 14), Some(100.0));

        let falling: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        assert_eq!(rsi(&falling, 14), Some(0.0));

        assert_eq!(rsi(&[50.0; 20], 14), Some(50.0));
    }

    #[test]
    fn test_rsi_mixed_window() {
        // Alternating +2 / -1 over 14 changes: 7 gains of 2, 7 losses of 1
        let mut prices = vec![100.0];
        for i in 0..14 {
            let last = prices[prices.len() - 1];
            prices.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let value = rsi(&prices, 14).unwrap();
        // RS = 1.0 / 0.5 = 2
        assert!(close_enough(value, 100.0 - 100.0 / 3.0));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert_eq!(rsi(&rising(14), 14), None);
        assert!(rsi(&rising(15), 14).is_some());
    }

    #[test]
    fn test_ema() {
        // Constant series stays constant
        assert_eq!(ema(&[10.0; 30], 12), Some(10.0));
        assert_eq!(ema(&[1.0, 2.0], 3), None);

        // Seed 2.0, then (4 - 2) * 0.5 + 2
        assert_eq!(ema(&[1.0, 2.0, 3.0, 4.0], 3), Some(3.0));
    }

    #[test]
    fn test_macd_insufficient_data() {
        assert!(macd(&rising(25)).is_none());
    }

    #[test]
    fn test_macd_short_history_has_flat_signal() {
        let result = macd(&rising(30)).unwrap();
        assert_eq!(result.histogram, 0.0);
        assert_eq!(result.signal_line, result.macd_line);
        assert!(result.macd_line > 0.0);
    }

    #[test]
    fn test_macd_uptrend_is_positive() {
        let result = macd(&rising(60)).unwrap();
        assert!(result.macd_line > 0.0);
        assert!(close_enough(
            result.histogram,
            result.macd_line - result.signal_line
        ));
    }

    #[test]
    fn test_macd_flat_series() {
        let result = macd(&[42.0; 60]).unwrap();
        assert!(close_enough(result.macd_line, 0.0));
        assert!(close_enough(result.histogram, 0.0));
    }

    #[test]
    fn test_bollinger_bands() {
        let prices: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 98.0 } else { 102.0 }).collect();
        let bands = bollinger_bands(&prices, 20, 2.0).unwrap();
        // Population std of +/-2 around 100 is 2
        assert!(close_enough(bands.middle, 100.0));
        assert!(close_enough(bands.upper, 104.0));
        assert!(close_enough(bands.lower, 96.0));

        assert!(bollinger_bands(&prices[..19], 20, 2.0).is_none());
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let bands = bollinger_bands(&[50.0; 25], 20, 2.0).unwrap();
        assert!(close_enough(bands.upper, bands.lower));
    }

    #[test]
    fn test_calculate_all_empty() {
        let signals = calculate_all(&[]);
        assert_eq!(signals, TechnicalSignals::empty(0.0));
    }

    #[test]
    fn test_calculate_all_short_history() {
        let signals = calculate_all(&bars_from(&rising(30)));
        assert_eq!(signals.current_price, 129.0);
        assert!(signals.rsi.is_some());
        assert!(signals.macd.is_some());
        assert!(signals.bollinger.is_some());
        assert!(signals.sma_20.is_some());
        assert!(signals.sma_50.is_none());
        assert!(signals.sma_200.is_none());
    }

    #[test]
    fn test_calculate_all_long_history() {
        let signals = calculate_all(&bars_from(&rising(220)));
        assert_eq!(signals.current_price, 319.0);
        let (sma20, sma50, sma200) = (
            signals.sma_20.unwrap(),
            signals.sma_50.unwrap(),
            signals.sma_200.unwrap(),
        );
        assert!(signals.current_price > sma20 && sma20 > sma50 && sma50 > sma200);
    }
}

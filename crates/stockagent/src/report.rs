//! Markdown report rendering

use crate::models::{SentimentResult, TechnicalSignals};
use crate::pipeline::StockAnalysis;
use crate::scoring::ScoreCard;
use std::fmt::Write;

/// Headlines listed in the sentiment section
const MAX_REPORT_HEADLINES: usize = 5;

const DISCLAIMER: &str = "---

## Disclaimer

This report is generated for **educational and informational purposes only** and does not constitute financial advice. The analysis is based on historical data and automated algorithms, which may not accurately predict future performance.

**Data Sources:**
- Market data provided by [Polygon.io](https://polygon.io) or Yahoo Finance
- News headlines provided by [Finnhub](https://finnhub.io)

**Important:**
- Past performance is not indicative of future results
- Always conduct your own research before making investment decisions
- Consider consulting a qualified financial advisor

---

*Generated by StockAgent*
";

/// Render the full markdown report for a completed analysis
pub fn render_report(analysis: &StockAnalysis) -> String {
    let mut out = String::new();

    header(&mut out, analysis);
    price_summary(&mut out, analysis.current_price, analysis.previous_close);
    technical_section(&mut out, &analysis.technical_signals);
    sentiment_section(&mut out, &analysis.news_sentiment);
    recommendation_section(&mut out, &analysis.score);

    if !analysis.errors.is_empty() {
        out.push_str("## Analysis Warnings\n\n");
        for error in &analysis.errors {
            let _ = writeln!(out, "- {error}");
        }
        out.push('\n');
    }

    out.push_str(DISCLAIMER);
    out
}

fn header(out: &mut String, analysis: &StockAnalysis) {
    let company = if analysis.company_name.is_empty() {
        analysis.ticker.as_str()
    } else {
        analysis.company_name.as_str()
    };

    let _ = write!(
        out,
        "# Stock Analysis Report: {ticker}\n\n\
         **Company:** {company}\n\
         **Generated:** {generated}\n\n\
         ---\n\n",
        ticker = analysis.ticker,
        generated = analysis.generated_at.format("%Y-%m-%d %H:%M UTC"),
    );
}

fn price_summary(out: &mut String, current_price: f64, previous_close: f64) {
    let (change, trend) = if current_price > 0.0 && previous_close > 0.0 {
        let change = current_price - previous_close;
        let pct = change / previous_close * 100.0;
        let sign = if change < 0.0 { "-" } else { "+" };
        let trend = if change > 0.0 {
            "Up"
        } else if change < 0.0 {
            "Down"
        } else {
            "Unchanged"
        };
        (
            format!(
                "{sign}{} ({sign}{:.2}%)",
                format_price(change.abs()),
                pct.abs()
            ),
            trend,
        )
    } else {
        ("N/A".to_string(), "Unchanged")
    };

    let _ = write!(
        out,
        "## Price Summary\n\n\
         | Metric | Value |\n\
         |--------|-------|\n\
         | Current Price | {current} |\n\
         | Previous Close | {previous} |\n\
         | Change | {change} |\n\
         | Trend | {trend} |\n\n",
        current = format_optional_price(current_price),
        previous = format_optional_price(previous_close),
    );
}

fn technical_section(out: &mut String, signals: &TechnicalSignals) {
    let (macd_line, signal_line, histogram) = match &signals.macd {
        Some(m) => (
            format_number(Some(m.macd_line)),
            format_number(Some(m.signal_line)),
            format_number(Some(m.histogram)),
        ),
        None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
    };

    let (bb_upper, bb_middle, bb_lower) = match &signals.bollinger {
        Some(b) => (
            format_optional_price(b.upper),
            format_optional_price(b.middle),
            format_optional_price(b.lower),
        ),
        None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
    };

    let _ = write!(
        out,
        "## Technical Analysis\n\n\
         ### Momentum Indicators\n\n\
         | Indicator | Value | Signal |\n\
         |-----------|-------|--------|\n\
         | RSI (14) | {rsi} | {rsi_signal} |\n\
         | MACD Line | {macd_line} | {macd_signal} |\n\
         | MACD Signal | {signal_line} | - |\n\
         | MACD Histogram | {histogram} | - |\n\n\
         ### Trend Indicators\n\n\
         | Indicator | Value |\n\
         |-----------|-------|\n\
         | SMA (20) | {sma20} |\n\
         | SMA (50) | {sma50} |\n\
         | SMA (200) | {sma200} |\n\
         | Current Price | {price} |\n\n\
         ### Volatility Indicators\n\n\
         | Bollinger Bands | Value |\n\
         |-----------------|-------|\n\
         | Upper Band | {bb_upper} |\n\
         | Middle Band | {bb_middle} |\n\
         | Lower Band | {bb_lower} |\n\n",
        rsi = format_number(signals.rsi),
        rsi_signal = signals.rsi_interpretation(),
        macd_signal = signals.macd_interpretation(),
        sma20 = signals.sma_20.map_or_else(|| "N/A".to_string(), format_optional_price),
        sma50 = signals.sma_50.map_or_else(|| "N/A".to_string(), format_optional_price),
        sma200 = signals.sma_200.map_or_else(|| "N/A".to_string(), format_optional_price),
        price = format_optional_price(signals.current_price),
    );
}

fn sentiment_section(out: &mut String, sentiment: &SentimentResult) {
    let label = capitalize(sentiment.overall_label.as_str());
    let _ = write!(
        out,
        "## News Sentiment\n\n\
         **Overall Sentiment:** {label} ({score:+.2})\n\
         **Headlines Analyzed:** {count}\n\n\
         ### Recent Headlines\n\n",
        score = sentiment.overall_score,
        count = sentiment.headline_count,
    );

    if sentiment.headlines.is_empty() {
        out.push_str("- No recent headlines found\n");
    } else {
        for headline in sentiment.headlines.iter().take(MAX_REPORT_HEADLINES) {
            let _ = writeln!(
                out,
                "- {} **[{}]** ({:+.2})",
                headline.title, headline.label, headline.score
            );
        }
    }
    out.push('\n');
}

fn recommendation_section(out: &mut String, score: &ScoreCard) {
    let _ = write!(
        out,
        "## Recommendation\n\n\
         ### **{label}**\n\n\
         **Confidence:** {confidence:.0}%\n\n\
         ### Contributing Factors\n\n",
        label = score.recommendation,
        confidence = score.confidence,
    );

    if score.explanation_factors.is_empty() {
        out.push_str("- No specific factors identified\n");
    } else {
        for factor in &score.explanation_factors {
            let _ = writeln!(out, "- {factor}");
        }
    }
    out.push('\n');
}

/// `$1,234.56`
pub fn format_price(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Prices of zero mean "unknown"
fn format_optional_price(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        "N/A".to_string()
    } else {
        format_price(value)
    }
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

//! Command-line interface for stockagent
//!
//! # Usage
//!
//! ```bash
//! # Polygon (default) needs an API key; Finnhub enables news sentiment
//! export POLYGON_API_KEY="..."
//! export FINNHUB_API_KEY="..."
//!
//! stockagent analyze AAPL
//! stockagent analyze MSFT --provider yahoo --summary
//! stockagent headline "Apple shares surge to record high"
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use stockagent::scoring::ScoringEngine;
use stockagent::sentiment::analyze_headline;
use stockagent::{DataProvider, StockAnalysis, StockAnalysisPipeline, StockConfig};
use stockagent_utils::LogFormat;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stockagent")]
#[command(about = "Buy/sell/hold recommendations from technical indicators and news sentiment", long_about = None)]
struct Cli {
    /// Log output format (pretty, json); defaults from STOCKAGENT_ENV
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a ticker and print the report
    Analyze {
        /// Ticker symbol, e.g. AAPL
        ticker: String,

        /// Market data provider (polygon, yahoo)
        #[arg(short, long)]
        provider: Option<DataProvider>,

        /// Calendar days of price history
        #[arg(short, long)]
        days: Option<u32>,

        /// Print the analysis as JSON
        #[arg(long, conflicts_with = "summary")]
        json: bool,

        /// Print a compact score table instead of the full report
        #[arg(long)]
        summary: bool,

        /// Also write the markdown report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score a single headline offline
    Headline {
        /// Headline text
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = stockagent_utils::load_dotenv();

    let cli = Cli::parse();

    match cli.log_format {
        Some(format) => stockagent_utils::init_tracing_with(format),
        None => stockagent_utils::init_tracing(),
    }
    if let Some(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Analyze {
            ticker,
            provider,
            days,
            json,
            summary,
            output,
        } => {
            let mut builder = StockConfig::builder();
            if let Some(provider) = provider {
                builder = builder.data_provider(provider);
            }
            if let Some(days) = days {
                builder = builder.history_days(days);
            }
            let config = builder.with_env().build()?;

            info!(provider = ?config.data_provider, "Running analysis for {}", ticker);

            let pipeline = StockAnalysisPipeline::from_config(&config)?;
            let analysis = pipeline.run(&ticker).await?;

            if let Some(path) = &output {
                std::fs::write(path, &analysis.report)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                info!("Report written to {}", path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else if summary {
                println!("{}", summary_table(&analysis));
            } else {
                println!("{}", analysis.report);
            }
        }
        Commands::Headline { text } => {
            let result = analyze_headline(&text);
            println!(
                "{} ({:+.2}) [{} positive, {} negative keywords]",
                result.label, result.score, result.positive_count, result.negative_count
            );
        }
    }

    Ok(())
}

fn summary_table(analysis: &StockAnalysis) -> Table {
    let weights = *ScoringEngine::standard().weights();
    let breakdown = &analysis.score.breakdown;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            format!("{} ({})", analysis.ticker, analysis.company_name),
            "Contribution".to_string(),
            "Max".to_string(),
        ]);

    let rows = [
        ("RSI", breakdown.rsi, weights.rsi),
        ("MACD", breakdown.macd, weights.macd),
        ("Moving averages", breakdown.moving_averages, weights.moving_averages),
        ("Bollinger Bands", breakdown.bollinger, weights.bollinger),
        ("News sentiment", breakdown.sentiment, weights.sentiment),
    ];
    for (name, contribution, max) in rows {
        table.add_row(vec![
            name.to_string(),
            format!("{contribution:+.1}"),
            format!("±{max:.0}"),
        ]);
    }

    table.add_row(vec![
        "Composite score".to_string(),
        format!("{:+.1}", analysis.score.composite_score),
        "±100".to_string(),
    ]);
    table.add_row(vec![
        "Recommendation".to_string(),
        analysis.score.recommendation.to_string(),
        format!("{:.0}% confidence", analysis.score.confidence),
    ]);

    for error in &analysis.errors {
        table.add_row(vec!["Warning".to_string(), error.clone(), String::new()]);
    }

    table
}

//! Command-line front end: forecast or summarise a CSV of sale records.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use commodity_forecast::analysis;
use commodity_forecast::core::RawRecord;
use commodity_forecast::engine::ForecastEngine;
use commodity_forecast::ingest::{read_records_from_path, ColumnMapping};
use commodity_forecast::prepare::{prepare_with, GapPolicy, PrepareConfig};
use commodity_forecast::report::ForecastTable;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "commodity-forecast")]
#[command(about = "Monthly SARIMA forecasts of commodity sale records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast the monthly mean of the target column
    Forecast {
        /// CSV file with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Number of months to forecast (1-36)
        #[arg(long, default_value_t = 12)]
        horizon: usize,

        #[arg(long, default_value = "Date")]
        date_column: String,

        #[arg(long, default_value = "AveragePrice")]
        target_column: String,

        /// How to treat months without records
        #[arg(long, value_enum, default_value_t = GapArg::Fail)]
        gap_policy: GapArg,

        /// Add prediction intervals at this level, e.g. 0.95
        #[arg(long)]
        level: Option<f64>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Descriptive summaries of the records
    Summary {
        #[arg(short, long)]
        input: PathBuf,

        /// Number of regions in the ranking
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the summaries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GapArg {
    Fail,
    Interpolate,
}

impl From<GapArg> for GapPolicy {
    fn from(arg: GapArg) -> Self {
        match arg {
            GapArg::Fail => GapPolicy::Fail,
            GapArg::Interpolate => GapPolicy::Interpolate,
        }
    }
}

const SIZE_COLUMNS: [&str; 3] = ["4046", "4225", "4770"];
const BAG_COLUMNS: [&str; 3] = ["Small Bags", "Large Bags", "XLarge Bags"];
const CORRELATION_COLUMNS: [&str; 8] = [
    "Total Volume",
    "4046",
    "4225",
    "4770",
    "Total Bags",
    "Small Bags",
    "Large Bags",
    "XLarge Bags",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Forecast {
            input,
            horizon,
            date_column,
            target_column,
            gap_policy,
            level,
            json,
        } => {
            let mapping = ColumnMapping::avocado()
                .with_date(date_column)
                .with_target(target_column);
            let records = read_records_from_path(&input, &mapping)
                .with_context(|| format!("reading {}", input.display()))?;
            info!(records = records.len(), path = %input.display(), "loaded records");

            let config = PrepareConfig::new().with_gap_policy(gap_policy.into());
            let series = prepare_with(&records, &config).context("preparing monthly series")?;
            info!(
                months = series.len(),
                first = %series.first_period(),
                last = %series.last_period(),
                "prepared series"
            );

            let engine = ForecastEngine::default();
            let result = match level {
                Some(level) => engine.forecast_with_intervals(&series, horizon, level),
                None => engine.forecast(&series, horizon),
            }
            .context("forecasting")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.order());
                print!("{}", ForecastTable::from(&result));
            }
        }
        Commands::Summary { input, top, json } => {
            let records = read_records_from_path(&input, &ColumnMapping::avocado())
                .with_context(|| format!("reading {}", input.display()))?;

            if json {
                let summary = serde_json::json!({
                    "trend": analysis::monthly_trend(&records, "Total Volume")?,
                    "sizes": analysis::monthly_volume_totals(&records, &SIZE_COLUMNS)?,
                    "bags": analysis::composition(&records, &BAG_COLUMNS)?,
                    "by_type": analysis::mean_target_by(&records, "type")?,
                    "top_regions": analysis::top_by_mean_target(&records, "region", top)?,
                    "correlation": analysis::correlation_matrix(&records, &CORRELATION_COLUMNS)?,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&records, top)?;
            }
        }
    }
    Ok(())
}

fn print_summary(records: &[RawRecord], top: usize) -> Result<()> {
    println!("Bag composition");
    for share in analysis::composition(records, &BAG_COLUMNS)? {
        println!("  {:<12} {:>16.2} {:>7.2}%", share.column, share.total, share.share * 100.0);
    }

    println!("Mean price by type");
    for group in analysis::mean_target_by(records, "type")? {
        println!("  {:<12} {:>8.2} ({} records)", group.value, group.mean_target, group.count);
    }

    println!("Top {} regions by mean price", top);
    for group in analysis::top_by_mean_target(records, "region", top)? {
        println!("  {:<20} {:>8.2}", group.value, group.mean_target);
    }

    let matrix = analysis::correlation_matrix(records, &CORRELATION_COLUMNS)?;
    println!("Correlation with price");
    for label in matrix.labels.iter().skip(1) {
        if let Some(r) = matrix.get(analysis::TARGET_LABEL, label) {
            println!("  {:<12} {:>6.2}", label, r);
        }
    }
    Ok(())
}

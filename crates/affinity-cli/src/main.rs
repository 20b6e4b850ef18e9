//! Affinity CLI - Command-line driver for the recommendation engine.
//!
//! # Usage
//!
//! ```bash
//! # Recommendations for user 7 from a dataset
//! affinity store.json --user 7
//! affinity store.json --user 7 -n 5 --anchor 12
//! affinity store.json --user 7 --min-price 10 --max-price 50 --json
//!
//! # Rebuild clusters from scratch
//! affinity store.json --user 7 --reset
//!
//! # Show help
//! affinity --help
//! ```

mod config;
mod dataset;
mod output;
mod recommend;

use affinity_core::ratings::{ItemId, UserId};
use affinity_core::recommend::PriceRange;
use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Affinity recommendation CLI.
///
/// Clusters the users of a rating dataset and prints hybrid recommendations
/// for one user. Clusters persist in the data directory between runs.
#[derive(Parser)]
#[command(name = "affinity", version, about)]
struct Cli {
    /// Dataset JSON file (catalog items and ratings)
    dataset: PathBuf,

    /// User to recommend for
    #[arg(short, long)]
    user: u64,

    /// Maximum number of recommendations to return
    #[arg(short = 'n', long, default_value = "10")]
    limit: usize,

    /// Anchor item for item-based suggestions
    #[arg(long)]
    anchor: Option<u64>,

    /// Lower bound of the price window
    #[arg(long)]
    min_price: Option<f64>,

    /// Upper bound of the price window
    #[arg(long)]
    max_price: Option<f64>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Custom data directory (default: $AFFINITY_DATA_DIR or platform standard location)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Engine configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Discard persisted clusters before assigning users
    #[arg(long)]
    reset: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Price window from the bound flags; a missing bound is open.
    fn price_range(&self) -> Result<Option<PriceRange>> {
        match (self.min_price, self.max_price) {
            (None, None) => Ok(None),
            (min, max) => {
                let min = min.unwrap_or(0.0);
                let max = max.unwrap_or(f64::INFINITY);
                if min.is_nan() || max.is_nan() {
                    return Err(anyhow!("Price bounds must be numbers"));
                }
                Ok(Some(PriceRange::new(min, max)))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let engine_config = config::load_engine_config(cli.config.as_deref())?;
    let dataset = dataset::Dataset::load(&cli.dataset)?;

    let options = recommend::RecommendOptions {
        user_id: UserId::from_u64(cli.user),
        count: cli.limit,
        anchor_item: cli.anchor.map(ItemId::from_u64),
        price_range: cli.price_range()?,
        reset: cli.reset,
    };

    let outcome =
        recommend::execute_recommend(&dataset, &engine_config, &options, cli.data_dir.as_ref())
            .await?;

    let output = if cli.json {
        output::format_json(options.user_id, &outcome.summary, &outcome.candidates)
    } else {
        output::format_human(options.user_id, &outcome.candidates)
    };
    println!("{}", output);

    Ok(())
}

//! Sentfolio CLI binary.
//!
//! Provides a command-line interface for sentiment-ranked portfolios.

mod cmd;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use sentfolio::ServiceConfig;
use sentfolio::cache::CacheKind;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sentfolio")]
#[command(about = "Sentiment-ranked monthly stock portfolios", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Sentiment CSV file (overrides SENTIMENT_DATA_PATH)
    #[arg(long, global = true)]
    sentiment: Option<PathBuf>,

    /// Directory of per-ticker price files (overrides PRICE_DATA_DIR)
    #[arg(long, global = true)]
    prices: Option<PathBuf>,

    /// Directory of market index price files (overrides BENCHMARK_DATA_DIR)
    #[arg(long, global = true)]
    indexes: Option<PathBuf>,

    /// SQLite cache file (overrides CACHE_DB_PATH)
    #[arg(long, global = true)]
    cache_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for commands that produce a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables
    Text,
    /// The response object as JSON
    Json,
}

/// Which cache a cleanup applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CacheTarget {
    /// News lookups
    News,
    /// Monthly indicator rankings
    Indicators,
    /// Portfolio results
    Portfolio,
    /// Every cache
    All,
}

impl CacheTarget {
    pub(crate) fn kinds(self) -> Vec<CacheKind> {
        match self {
            Self::News => vec![CacheKind::News],
            Self::Indicators => vec![CacheKind::MonthlyIndicator],
            Self::Portfolio => vec![CacheKind::PortfolioResult],
            Self::All => CacheKind::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute portfolio returns against a benchmark
    Portfolio {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Benchmark index symbol
        #[arg(short, long)]
        market_index: Option<String>,

        /// Ranking indicator
        #[arg(short, long)]
        indicator: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the monthly top tickers for an indicator
    Rank {
        /// Ranking indicator
        #[arg(short, long)]
        indicator: Option<String>,

        /// First month to rank (YYYY-MM-DD, defaults to first sentiment date)
        #[arg(long)]
        start: Option<String>,

        /// Last month to rank (YYYY-MM-DD, defaults to last sentiment date)
        #[arg(long)]
        end: Option<String>,
    },

    /// Show daily price history for a ticker
    Prices {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Read from the market index directory instead of stock prices
        #[arg(long)]
        index: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List available indicators
    Indicators {
        /// Show descriptions
        #[arg(short, long)]
        verbose: bool,
    },

    /// Fetch the latest news for tickers
    News {
        /// Ticker symbols
        #[arg(required = true, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove old cache entries
    Cleanup {
        /// Delete entries created more than this many days ago
        #[arg(long, default_value = "7")]
        days: u32,

        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Cache to clean up
        #[arg(long, value_enum, default_value = "all")]
        cache_type: CacheTarget,
    },
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(path) = &cli.sentiment {
        config.sentiment_path = path.clone();
    }
    if let Some(dir) = &cli.prices {
        config.price_dir = dir.clone();
    }
    if let Some(dir) = &cli.indexes {
        config.benchmark_dir = dir.clone();
    }
    if let Some(path) = &cli.cache_db {
        config.cache_db_path = Some(path.clone());
    }
    debug!(
        sentiment = %config.sentiment_path.display(),
        prices = %config.price_dir.display(),
        indexes = %config.benchmark_dir.display(),
        sqlite_cache = config.cache_db_path.is_some(),
        "loaded configuration"
    );
    Ok(config)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match &cli.command {
        Commands::Indicators { verbose } => {
            cmd::indicators::list_indicators(*verbose);
        }
        Commands::Portfolio {
            start,
            end,
            market_index,
            indicator,
            format,
        } => {
            let config = load_config(&cli)?;
            cmd::portfolio::show_portfolio(
                config,
                start.clone(),
                end.clone(),
                market_index.clone(),
                indicator.clone(),
                *format,
            )?;
        }
        Commands::Rank {
            indicator,
            start,
            end,
        } => {
            let config = load_config(&cli)?;
            cmd::rank::show_rankings(
                config,
                indicator.as_deref(),
                start.as_deref(),
                end.as_deref(),
            )?;
        }
        Commands::Prices {
            ticker,
            start,
            end,
            index,
            format,
        } => {
            let config = load_config(&cli)?;
            cmd::prices::show_prices(&config, ticker, start, end, *index, *format)?;
        }
        Commands::News { tickers, format } => {
            let config = load_config(&cli)?;
            cmd::news::show_news(config, tickers, *format).await?;
        }
        Commands::Cleanup {
            days,
            dry_run,
            cache_type,
        } => {
            let config = load_config(&cli)?;
            cmd::cleanup::cleanup_cache(&config, *days, *dry_run, *cache_type)?;
        }
    }

    Ok(())
}

#![doc(issue_tracker_base_url = "https://github.com/sentfolio/sentfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # sentfolio
//!
//! Sentiment-ranked monthly stock portfolios evaluated against a benchmark.
//!
//! sentfolio is an umbrella crate that re-exports all sentfolio sub-crates and
//! adds the request-level services that tie them together.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sentfolio::{PortfolioRequest, PortfolioService, ServiceConfig};
//!
//! # fn main() -> sentfolio::Result<()> {
//! let service = PortfolioService::from_config(ServiceConfig::from_env()?)?;
//! let query = service.resolve(&PortfolioRequest::default())?;
//! let response = service.compute(&query)?;
//! for row in &response.portfolio_returns {
//!     println!("{} {:?} {:?}", row.date, row.portfolio_return, row.benchmark_return);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Shared types, errors and the [`PriceSource`] seam
//! - [`signals`] - Sentiment ingest and monthly ranking
//! - [`eval`] - Rebalance schedules, portfolio returns and benchmark merging
//! - [`cache`] - Keyed TTL caches
//! - [`newsapi`] - News provider client
//!
//! ## Pipeline
//!
//! 1. **SentimentStore** loads posts into an immutable, hashed table
//! 2. **MonthlyRanker** keeps the top tickers of each month by an indicator
//! 3. **RebalanceScheduler** holds each month's selection during the next month
//! 4. **PriceReturnEngine** averages daily log returns of the held tickers
//! 5. **BenchmarkMerger** joins with the index and compounds both series

/// Version information for the sentfolio crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod news;
pub mod portfolio;

pub use config::ServiceConfig;
pub use news::{NewsReport, NewsService, normalize_tickers};
pub use portfolio::{
    CacheInfo, ErrorResponse, MonthlyCacheStats, PortfolioQuery, PortfolioReport,
    PortfolioRequest, PortfolioResponse, PortfolioService, ReturnRow,
};

// ============================================================================
// Core Types
// ============================================================================

/// Shared types, error taxonomy and return arithmetic.
pub mod traits {
    pub use sentfolio_traits::*;
}

pub use sentfolio_traits::{Date, Indicator, PriceSeries, PriceSource, Result, SentfolioError, Symbol};

// ============================================================================
// Pipeline Stages
// ============================================================================

/// Sentiment ingest, monthly ranking and the indicator registry.
pub mod signals {
    pub use sentfolio_signals::*;
}

/// Rebalance schedules, price loading, portfolio returns and benchmarks.
pub mod eval {
    pub use sentfolio_eval::*;
}

/// Keyed TTL caches with memory and SQLite backends.
///
/// ## Cache kinds
///
/// | Kind | Name | TTL |
/// |------|------|-----|
/// | Monthly indicator rankings | `indicators` | 7 days |
/// | Portfolio results | `portfolio` | 24 hours |
/// | News lookups | `news` | 1 hour |
pub mod cache {
    pub use sentfolio_cache::*;
}

// ============================================================================
// Data Providers
// ============================================================================

/// NewsAPI client.
///
/// ## Setup
///
/// 1. Get an API key at <https://newsapi.org/>
/// 2. Set the `NEWS_API_KEY` environment variable or add to `.env` file
pub mod newsapi {
    pub use sentfolio_news::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use sentfolio::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Date, Indicator, PortfolioRequest, PortfolioService, PriceSource, Result,
        SentfolioError, ServiceConfig, Symbol,
    };
}

// ============================================================================
// Tests
// ============================================================================

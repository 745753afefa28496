//! Portfolio evaluation for sentfolio.
//!
//! This crate turns monthly rankings into realized performance:
//! - [`RebalanceScheduler`] lags each ranking by one month into a
//!   [`RebalanceSchedule`] of non-overlapping holding intervals
//! - [`CsvPriceDirectory`] reads per-symbol close prices and daily bars from disk
//! - [`PriceReturnEngine`] computes equal-weighted daily log returns
//! - [`BenchmarkMerger`] aligns them with a market index and compounds both
//!
//! # Example
//!
//! ```rust,ignore
//! use sentfolio_eval::{BenchmarkMerger, CsvPriceDirectory, PriceReturnEngine, RebalanceScheduler};
//!
//! let schedule = RebalanceScheduler.schedule(&rankings)?;
//! let prices = CsvPriceDirectory::new("data/stock_historical_prices");
//! let indexes = CsvPriceDirectory::new("data/market_indexes");
//! let returns = PriceReturnEngine.compute(&prices, &schedule, start, end)?;
//! let rows = BenchmarkMerger.merge(&returns.periods, &indexes, "QQQ", start, end)?;
//! ```

pub mod benchmark;
pub mod prices;
pub mod returns;
pub mod schedule;

// Re-export main types
pub use benchmark::{BenchmarkMerger, PortfolioReturnPoint};
pub use prices::{CsvPriceDirectory, PriceBar, parse_price_bars, parse_price_csv};
pub use returns::{PeriodReturn, PortfolioReturns, PriceReturnEngine};
pub use schedule::{HoldingInterval, RebalanceEntry, RebalanceSchedule, RebalanceScheduler};

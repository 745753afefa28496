//! Sentiment ingest and monthly ranking for the sentfolio engine.
//!
//! This crate turns raw social-media post rows into ranked monthly selections:
//! - [`SentimentStore`] parses and normalizes a sentiment CSV into an
//!   immutable [`SentimentTable`]
//! - [`MonthlyRanker`] aggregates the table per calendar month and keeps the
//!   top-N tickers for an indicator
//! - [`registry`] describes the supported indicators
//!
//! # Example
//!
//! ```ignore
//! use sentfolio_signals::{MonthlyRanker, SentimentStore};
//! use sentfolio_traits::Indicator;
//!
//! let table = SentimentStore::load("data/reddit_sentiment_data.csv")?;
//! let ranker = MonthlyRanker::default();
//! for month in table.months() {
//!     let ranking = ranker.rank(&table, Indicator::TotalSentiment, month);
//!     println!("{month}: {:?}", ranking.tickers());
//! }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod ranker;
pub mod registry;
pub mod store;

// Re-export key types
pub use ranker::{MonthlyRanker, MonthlyRanking, MonthlyScore, RankerConfig};
pub use registry::{IndicatorInfo, available_indicators, get_indicator_info};
pub use store::{SentimentRecord, SentimentStore, SentimentTable};

//! Keyed TTL caches for sentfolio.
//!
//! Three caches share one protocol: monthly indicator rankings, complete
//! portfolio results and news lookups. Each is a [`KeyedCache`] over a
//! [`CacheStore`]:
//! - [`MemoryStore`] keeps entries in a concurrent map for one process
//! - [`SqliteStore`] persists entries across runs
//!
//! Keys come from [`key`] and hash every parameter that determines a payload.

pub mod error;
pub mod key;
pub mod keyed;
pub mod sqlite;
pub mod store;

// Re-export main types
pub use error::{CacheError, Result};
pub use key::{hash_key, monthly_key, news_key, portfolio_key};
pub use keyed::{KeyedCache, SweepReport, sweep_at};
pub use sqlite::SqliteStore;
pub use store::{CacheEntry, CacheKind, CacheStore, MemoryStore};

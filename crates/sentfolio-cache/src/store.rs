//! Cache kinds, entries and the storage seam.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// The independent caches kept by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// Monthly indicator rankings, keyed by month and indicator.
    MonthlyIndicator,
    /// Complete portfolio results, keyed by query parameters.
    PortfolioResult,
    /// News lookups, keyed by ticker set.
    News,
}

impl CacheKind {
    /// Every cache kind.
    pub const ALL: [Self; 3] = [Self::MonthlyIndicator, Self::PortfolioResult, Self::News];

    /// Stable name used in storage and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MonthlyIndicator => "indicators",
            Self::PortfolioResult => "portfolio",
            Self::News => "news",
        }
    }

    /// Default time-to-live of entries of this kind.
    pub fn ttl(self) -> Duration {
        match self {
            Self::MonthlyIndicator => Duration::days(7),
            Self::PortfolioResult => Duration::hours(24),
            Self::News => Duration::hours(1),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CacheError::UnknownKind(s.to_string()))
    }
}

/// A stored payload with its timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Deterministic key of the cached query.
    pub key: String,
    /// JSON-encoded payload.
    pub payload: String,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// When the entry stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is no longer served at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persistent key-value storage for cache entries.
///
/// Entries are partitioned by [`CacheKind`]; a `(kind, key)` pair holds at
/// most one entry and [`CacheStore::put`] replaces it atomically.
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Fetch the entry for `key`, expired or not.
    fn get(&self, kind: CacheKind, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert `entry`, replacing any entry with the same key.
    fn put(&self, kind: CacheKind, entry: CacheEntry) -> Result<()>;

    /// Remove the entry for `key`, returning whether one existed.
    fn delete(&self, kind: CacheKind, key: &str) -> Result<bool>;

    /// Entries created strictly before `cutoff`, oldest first.
    fn created_before(&self, kind: CacheKind, cutoff: DateTime<Utc>) -> Result<Vec<CacheEntry>>;

    /// Remove entries created strictly before `cutoff`, returning the count.
    fn delete_created_before(&self, kind: CacheKind, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Number of entries of `kind`, expired ones included.
    fn len(&self, kind: CacheKind) -> Result<usize>;
}

/// Process-local store backed by a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<(CacheKind, String), CacheEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, kind: CacheKind, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self
            .entries
            .get(&(kind, key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    fn put(&self, kind: CacheKind, entry: CacheEntry) -> Result<()> {
        self.entries.insert((kind, entry.key.clone()), entry);
        Ok(())
    }

    fn delete(&self, kind: CacheKind, key: &str) -> Result<bool> {
        Ok(self.entries.remove(&(kind, key.to_string())).is_some())
    }

    fn created_before(&self, kind: CacheKind, cutoff: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
        let mut matched: Vec<CacheEntry> = self
            .entries
            .iter()
            .filter(|item| item.key().0 == kind && item.value().created_at < cutoff)
            .map(|item| item.value().clone())
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)));
        Ok(matched)
    }

    fn delete_created_before(&self, kind: CacheKind, cutoff: DateTime<Utc>) -> Result<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|(entry_kind, _), entry| *entry_kind != kind || entry.created_at >= cutoff);
        Ok(before - self.entries.len())
    }

    fn len(&self, kind: CacheKind) -> Result<usize> {
        Ok(self.entries.iter().filter(|item| item.key().0 == kind).count())
    }
}

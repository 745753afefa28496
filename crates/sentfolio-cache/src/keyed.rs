//! Typed TTL cache over a [`CacheStore`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::{CacheEntry, CacheKind, CacheStore};

/// Outcome of a sweep over one cache kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Swept cache kind.
    pub kind: CacheKind,
    /// Entries created before this instant matched.
    pub cutoff: DateTime<Utc>,
    /// Whether matching entries were only listed.
    pub dry_run: bool,
    /// Matching entries; listed only in dry-run mode.
    pub entries: Vec<CacheEntry>,
    /// Number of entries matched.
    pub matched: usize,
    /// Number of entries removed.
    pub deleted: usize,
}

/// Delete (or, with `dry_run`, list) entries of `kind` older than `max_age`.
///
/// Age is measured from `created_at`, independent of each entry's TTL.
///
/// # Errors
///
/// Returns the store's error if it cannot be queried.
pub fn sweep_at(
    store: &dyn CacheStore,
    kind: CacheKind,
    max_age: Duration,
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let cutoff = now - max_age;
    let report = if dry_run {
        let entries = store.created_before(kind, cutoff)?;
        SweepReport {
            kind,
            cutoff,
            dry_run,
            matched: entries.len(),
            deleted: 0,
            entries,
        }
    } else {
        let deleted = store.delete_created_before(kind, cutoff)?;
        SweepReport {
            kind,
            cutoff,
            dry_run,
            entries: Vec::new(),
            matched: deleted,
            deleted,
        }
    };
    info!(%kind, %cutoff, dry_run, matched = report.matched, "swept cache");
    Ok(report)
}

/// A cache of `T` payloads of one [`CacheKind`].
///
/// Payloads are stored as JSON. Lookups treat entries at or past their
/// expiry as misses without removing them; the next store overwrites them
/// and [`KeyedCache::sweep`] purges them by age.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sentfolio_cache::{CacheKind, KeyedCache, MemoryStore};
///
/// let cache: KeyedCache<Vec<String>> = KeyedCache::new(Arc::new(MemoryStore::new()), CacheKind::News);
/// cache.store("gme", &vec!["headline".to_string()])?;
/// assert!(cache.lookup("gme")?.is_some());
/// ```
pub struct KeyedCache<T> {
    store: Arc<dyn CacheStore>,
    kind: CacheKind,
    ttl: Duration,
    _payload: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for KeyedCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("kind", &self.kind)
            .field("ttl", &self.ttl)
            .field("store", &self.store)
            .finish()
    }
}

impl<T> Clone for KeyedCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            kind: self.kind,
            ttl: self.ttl,
            _payload: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> KeyedCache<T> {
    /// Create a cache using the default TTL of `kind`.
    pub fn new(store: Arc<dyn CacheStore>, kind: CacheKind) -> Self {
        Self::with_ttl(store, kind, kind.ttl())
    }

    /// Create a cache with an explicit TTL.
    pub fn with_ttl(store: Arc<dyn CacheStore>, kind: CacheKind, ttl: Duration) -> Self {
        Self {
            store,
            kind,
            ttl,
            _payload: PhantomData,
        }
    }

    /// The kind of entries this cache holds.
    pub const fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Time-to-live applied to stored entries.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a fresh payload for `key`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be read.
    pub fn lookup(&self, key: &str) -> Result<Option<T>> {
        self.lookup_at(key, Utc::now())
    }

    /// Fetch a payload for `key` that is fresh at `now`.
    ///
    /// An undecodable payload is reported as a miss.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be read.
    pub fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<T>> {
        let Some(entry) = self.store.get(self.kind, key)? else {
            debug!(kind = %self.kind, key, "cache miss");
            return Ok(None);
        };
        if entry.is_expired(now) {
            debug!(kind = %self.kind, key, expires_at = %entry.expires_at, "cache entry expired");
            return Ok(None);
        }
        match serde_json::from_str(&entry.payload) {
            Ok(value) => {
                debug!(kind = %self.kind, key, "cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(kind = %self.kind, key, error = %e, "undecodable cache payload");
                Ok(None)
            }
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    pub fn store(&self, key: &str, value: &T) -> Result<()> {
        self.store_at(key, value, Utc::now())
    }

    /// Store `value` under `key` as if written at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    pub fn store_at(&self, key: &str, value: &T, now: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry {
            key: key.to_string(),
            payload: serde_json::to_string(value)?,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.store.put(self.kind, entry)
    }

    /// Remove the entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be written.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        self.store.delete(self.kind, key)
    }

    /// Sweep entries older than `max_age`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be queried.
    pub fn sweep(&self, max_age: Duration, dry_run: bool) -> Result<SweepReport> {
        self.sweep_at(max_age, dry_run, Utc::now())
    }

    /// Sweep entries older than `max_age` relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be queried.
    pub fn sweep_at(&self, max_age: Duration, dry_run: bool, now: DateTime<Utc>) -> Result<SweepReport> {
        sweep_at(self.store.as_ref(), self.kind, max_age, dry_run, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteStore;
    use crate::store::MemoryStore;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_625_000_000, 0).unwrap()
    }

    fn news_cache() -> KeyedCache<Vec<String>> {
        KeyedCache::new(Arc::new(MemoryStore::new()), CacheKind::News)
    }

    #[test]
    fn test_store_then_lookup() {
        let cache = news_cache();
        let payload = vec!["GME to the moon".to_string()];
        cache.store_at("k", &payload, t0()).unwrap();

        assert_eq!(cache.lookup_at("k", t0()).unwrap(), Some(payload));
        assert_eq!(cache.lookup_at("other", t0()).unwrap(), None);
    }

    #[test]
    fn test_lookup_after_expiry_is_miss() {
        let cache = news_cache();
        cache.store_at("k", &vec![], t0()).unwrap();

        assert!(cache.lookup_at("k", t0() + Duration::minutes(59)).unwrap().is_some());
        assert!(cache.lookup_at("k", t0() + Duration::hours(1)).unwrap().is_none());
    }

    #[test]
    fn test_store_overwrites_expired_entry() {
        let cache = news_cache();
        cache.store_at("k", &vec!["old".to_string()], t0()).unwrap();
        let later = t0() + Duration::hours(2);
        assert!(cache.lookup_at("k", later).unwrap().is_none());

        cache.store_at("k", &vec!["new".to_string()], later).unwrap();
        assert_eq!(cache.lookup_at("k", later).unwrap(), Some(vec!["new".to_string()]));
    }

    #[test]
    fn test_sweep_uses_age_not_ttl() {
        let cache: KeyedCache<u32> = KeyedCache::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            CacheKind::News,
        );
        let now = t0();
        // Expired by its 1h TTL but only two days old.
        cache.store_at("expired-fresh", &1, now - Duration::days(2)).unwrap();
        cache.store_at("ancient", &2, now - Duration::days(8)).unwrap();
        cache.store_at("live", &3, now).unwrap();

        let dry = cache.sweep_at(Duration::days(7), true, now).unwrap();
        assert!(dry.dry_run);
        assert_eq!(dry.matched, 1);
        assert_eq!(dry.deleted, 0);
        assert_eq!(dry.entries[0].key, "ancient");

        let report = cache.sweep_at(Duration::days(7), false, now).unwrap();
        assert_eq!(report.deleted, 1);

        assert!(cache.lookup_at("expired-fresh", now).unwrap().is_none());
        assert!(cache.invalidate("expired-fresh").unwrap());
        assert_eq!(cache.lookup_at("live", now).unwrap(), Some(3));
    }

    #[test]
    fn test_undecodable_payload_is_miss() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let text: KeyedCache<String> = KeyedCache::new(Arc::clone(&store), CacheKind::PortfolioResult);
        let numbers: KeyedCache<u64> = KeyedCache::new(store, CacheKind::PortfolioResult);

        text.store_at("k", &"not a number".to_string(), t0()).unwrap();
        assert!(numbers.lookup_at("k", t0()).unwrap().is_none());
    }
}

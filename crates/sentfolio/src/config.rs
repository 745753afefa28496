//! Service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use sentfolio_cache::{CacheStore, MemoryStore, SqliteStore};
use sentfolio_traits::types::parse_date;
use sentfolio_traits::{Date, Indicator, Result, SentfolioError};

/// Settings shared by the portfolio and news services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Sentiment CSV file.
    pub sentiment_path: PathBuf,
    /// Directory of per-ticker price files.
    pub price_dir: PathBuf,
    /// Directory of per-index price files.
    pub benchmark_dir: PathBuf,
    /// SQLite cache file; `None` keeps the cache in memory.
    pub cache_db_path: Option<PathBuf>,
    /// NewsAPI key.
    #[serde(skip_serializing)]
    pub news_api_key: Option<String>,
    /// First day with data; request dates are clamped to it.
    pub data_start: Date,
    /// Last day with data; request dates are clamped to it.
    pub data_end: Date,
    /// Start date used when a request omits one.
    pub default_start: Date,
    /// End date used when a request omits one.
    pub default_end: Date,
    /// Benchmark used when a request omits one.
    pub default_market_index: String,
    /// Indicator used when a request omits one.
    pub default_indicator: Indicator,
    /// Tickers held per month.
    pub top_n: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let day = |y, m, d| Date::from_ymd_opt(y, m, d).unwrap_or_default();
        Self {
            sentiment_path: PathBuf::from("data/reddit_sentiment_data.csv"),
            price_dir: PathBuf::from("data/stock_historical_prices"),
            benchmark_dir: PathBuf::from("data/market_indexes"),
            cache_db_path: None,
            news_api_key: None,
            data_start: day(2021, 1, 28),
            data_end: day(2021, 8, 31),
            default_start: day(2021, 1, 28),
            default_end: day(2021, 8, 2),
            default_market_index: "QQQ".to_string(),
            default_indicator: Indicator::EngagementRatio,
            top_n: 5,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment.
    ///
    /// This will also load from a `.env` file if present. Unset variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::Config`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::Config`] if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SENTIMENT_DATA_PATH") {
            config.sentiment_path = PathBuf::from(v);
        }
        if let Some(v) = get("PRICE_DATA_DIR") {
            config.price_dir = PathBuf::from(v);
        }
        if let Some(v) = get("BENCHMARK_DATA_DIR") {
            config.benchmark_dir = PathBuf::from(v);
        }
        config.cache_db_path = get("CACHE_DB_PATH").map(PathBuf::from);
        config.news_api_key = get("NEWS_API_KEY");

        let date = |key: &str, current: Date| -> Result<Date> {
            get(key).map_or(Ok(current), |v| {
                parse_date(&v).map_err(|e| SentfolioError::Config(format!("{key}: {e}")))
            })
        };
        config.data_start = date("DATA_START", config.data_start)?;
        config.data_end = date("DATA_END", config.data_end)?;
        config.default_start = date("DEFAULT_START", config.default_start)?;
        config.default_end = date("DEFAULT_END", config.default_end)?;

        if let Some(v) = get("DEFAULT_MARKET_INDEX") {
            config.default_market_index = v.trim().to_uppercase();
        }
        if let Some(v) = get("DEFAULT_INDICATOR") {
            config.default_indicator = v
                .trim()
                .parse()
                .map_err(|e| SentfolioError::Config(format!("DEFAULT_INDICATOR: {e}")))?;
        }
        if let Some(v) = get("TOP_N") {
            config.top_n = v
                .trim()
                .parse()
                .map_err(|e| SentfolioError::Config(format!("TOP_N: '{v}': {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::Config`] if the data range is empty or the
    /// portfolio size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.data_start > self.data_end {
            return Err(SentfolioError::Config(format!(
                "DATA_START {} is after DATA_END {}",
                self.data_start, self.data_end
            )));
        }
        if self.top_n == 0 {
            return Err(SentfolioError::Config("TOP_N must be at least 1".to_string()));
        }
        if self.default_market_index.is_empty() {
            return Err(SentfolioError::Config(
                "DEFAULT_MARKET_INDEX must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Open the configured cache store.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::Config`] if the SQLite file cannot be opened.
    pub fn open_cache_store(&self) -> Result<Arc<dyn CacheStore>> {
        match &self.cache_db_path {
            Some(path) => {
                info!(path = %path.display(), "using SQLite cache");
                let store = SqliteStore::open(path).map_err(|e| {
                    SentfolioError::Config(format!("CACHE_DB_PATH {}: {e}", path.display()))
                })?;
                Ok(Arc::new(store))
            }
            None => {
                info!("using in-memory cache");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.default_market_index, "QQQ");
        assert_eq!(config.default_indicator, Indicator::EngagementRatio);
        assert_eq!(config.default_end, d(2021, 8, 2));
        assert_eq!(config.top_n, 5);
        assert!(config.cache_db_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("PRICE_DATA_DIR", "/srv/prices"),
            ("DEFAULT_MARKET_INDEX", " spy "),
            ("DEFAULT_INDICATOR", "score"),
            ("TOP_N", "3"),
            ("DATA_END", "2021-12-31"),
            ("CACHE_DB_PATH", "/tmp/cache.db"),
        ]))
        .unwrap();
        assert_eq!(config.price_dir, PathBuf::from("/srv/prices"));
        assert_eq!(config.default_market_index, "SPY");
        assert_eq!(config.default_indicator, Indicator::Score);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.data_end, d(2021, 12, 31));
        assert_eq!(config.cache_db_path, Some(PathBuf::from("/tmp/cache.db")));
    }

    #[test]
    fn test_invalid_values() {
        for pairs in [
            [("TOP_N", "five")],
            [("TOP_N", "0")],
            [("DEFAULT_INDICATOR", "momentum")],
            [("DATA_START", "2021-02-30")],
            [("DATA_START", "2022-01-01")],
        ] {
            let err = ServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, SentfolioError::Config(_)), "{pairs:?}: {err}");
        }
    }

    #[test]
    fn test_memory_cache_store_by_default() {
        let store = ServiceConfig::default().open_cache_store().unwrap();
        assert_eq!(store.len(sentfolio_cache::CacheKind::News).unwrap(), 0);
    }
}

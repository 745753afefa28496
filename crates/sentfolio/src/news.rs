//! Cached ticker news lookups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sentfolio_cache::{CacheKind, CacheStore, KeyedCache, news_key};
use sentfolio_news::{Article, NewsClient, NewsProvider, NewsQuery};
use sentfolio_traits::{Result, SentfolioError, Symbol};

use crate::ServiceConfig;

/// Latest articles for a ticker set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsReport {
    /// Provider status, `ok` on success.
    pub status: String,
    /// Newest articles first.
    pub articles: Vec<Article>,
    /// Total matches reported by the provider.
    pub total_results: u64,
    /// Normalized tickers the search covered.
    pub tickers: Vec<Symbol>,
    /// Whether the report came from the news cache.
    pub cached: bool,
}

/// Trim, uppercase, deduplicate and sort tickers, dropping blanks.
pub fn normalize_tickers<S: AsRef<str>>(tickers: &[S]) -> Vec<Symbol> {
    let mut normalized: Vec<Symbol> = tickers
        .iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// News lookups with a one-hour cache per ticker set.
#[derive(Debug)]
pub struct NewsService<P> {
    provider: P,
    cache: KeyedCache<NewsReport>,
}

impl NewsService<NewsClient> {
    /// Create a NewsAPI-backed service from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::Config`] if no API key is configured or the
    /// cache store cannot be opened.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let api_key = config.news_api_key.clone().ok_or_else(|| {
            SentfolioError::Config(
                "NEWS_API_KEY is not set (add it to the environment or .env)".to_string(),
            )
        })?;
        Ok(Self::new(NewsClient::new(api_key), config.open_cache_store()?))
    }
}

impl<P: NewsProvider> NewsService<P> {
    /// Create a service querying `provider` and caching in `store`.
    pub fn new(provider: P, store: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            cache: KeyedCache::new(store, CacheKind::News),
        }
    }

    /// The newest articles mentioning any of `tickers`.
    ///
    /// Ticker order, case and duplicates do not affect the result or its
    /// cache key.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::InvalidData`] if no ticker is given and
    /// [`SentfolioError::Other`] if the provider fails.
    pub async fn latest<S: AsRef<str>>(&self, tickers: &[S]) -> Result<NewsReport> {
        let tickers = normalize_tickers(tickers);
        if tickers.is_empty() {
            return Err(SentfolioError::InvalidData(
                "at least one ticker is required".to_string(),
            ));
        }

        let key = news_key(&tickers);
        match self.cache.lookup(&key) {
            Ok(Some(mut report)) => {
                info!(tickers = %tickers.join(","), "news served from cache");
                report.cached = true;
                return Ok(report);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "news cache lookup failed"),
        }

        let page = self
            .provider
            .everything(&NewsQuery::latest(tickers.clone()))
            .await
            .map_err(|e| SentfolioError::Other(format!("news provider: {e}")))?;

        let report = NewsReport {
            status: page.status,
            articles: page.articles,
            total_results: page.total_results,
            tickers,
            cached: false,
        };

        if let Err(e) = self.cache.store(&key, &report) {
            warn!(error = %e, "news cache store failed");
        }
        info!(
            tickers = %report.tickers.join(","),
            articles = report.articles.len(),
            "news fetched"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentfolio_cache::MemoryStore;
    use sentfolio_news::{NewsError, NewsPage};
    use std::sync::Mutex;

    /// Provider returning one article per call and recording queries.
    #[derive(Default)]
    struct StubProvider {
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    impl NewsProvider for StubProvider {
        async fn everything(&self, query: &NewsQuery) -> sentfolio_news::Result<NewsPage> {
            self.queries.lock().unwrap().push(query.search_expression());
            if self.fail {
                return Err(NewsError::RateLimitExceeded);
            }
            Ok(NewsPage {
                status: "ok".to_string(),
                total_results: 1,
                articles: vec![Article {
                    title: format!("News on {}", query.search_expression()),
                    source: "Stub".to_string(),
                    published_at: None,
                    url: "https://example.com".to_string(),
                    description: None,
                    image_url: None,
                }],
            })
        }
    }

    fn service(provider: StubProvider) -> NewsService<StubProvider> {
        NewsService::new(provider, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_normalize_tickers() {
        assert_eq!(
            normalize_tickers(&[" gme", "AMC", "gme", "", "bb "]),
            vec!["AMC", "BB", "GME"]
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let err = NewsService::from_config(&ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, SentfolioError::Config(_)));

        let config = ServiceConfig {
            news_api_key: Some("key".to_string()),
            ..ServiceConfig::default()
        };
        assert!(NewsService::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let news = service(StubProvider::default());

        let first = news.latest(&["gme", "amc"]).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.tickers, vec!["AMC", "GME"]);
        assert_eq!(first.articles[0].title, "News on AMC OR GME");

        let second = news.latest(&["AMC", "GME", "GME"]).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.articles, first.articles);
        assert_eq!(news.provider.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_tickers_is_client_error() {
        let news = service(StubProvider::default());
        let err = news.latest::<&str>(&[" ", ""]).await.unwrap_err();
        assert!(matches!(err, SentfolioError::InvalidData(_)));
        assert!(err.is_client_error());
        assert!(news.provider.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_cached() {
        let news = service(StubProvider {
            fail: true,
            ..StubProvider::default()
        });
        assert!(news.latest(&["GME"]).await.is_err());
        assert!(news.latest(&["GME"]).await.is_err());
        assert_eq!(news.provider.queries.lock().unwrap().len(), 2);
    }
}

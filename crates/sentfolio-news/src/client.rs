//! NewsAPI client implementation.

use std::future::Future;

use reqwest::{Client, Url};
use tracing::debug;

use crate::{
    Result,
    error::NewsError,
    types::{EverythingResponse, NewsPage, NewsQuery},
};

/// Endpoint searching all indexed articles.
const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";

/// Anything that can answer a [`NewsQuery`].
pub trait NewsProvider: Send + Sync {
    /// Fetch one page of articles matching `query`.
    fn everything(&self, query: &NewsQuery) -> impl Future<Output = Result<NewsPage>> + Send;
}

/// NewsAPI client.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsClient {
    /// Create a new client with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: EVERYTHING_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the request URL for `query`; the key travels in a header.
    fn url(&self, query: &NewsQuery) -> Result<Url> {
        Url::parse_with_params(&self.base_url, query.params())
            .map_err(|e| NewsError::Api(format!("invalid URL {}: {e}", self.base_url)))
    }
}

impl NewsProvider for NewsClient {
    async fn everything(&self, query: &NewsQuery) -> Result<NewsPage> {
        let url = self.url(query)?;
        debug!(q = %query.search_expression(), "requesting news");

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NewsError::RateLimitExceeded);
        }

        let status = response.status();
        let text = response.text().await?;

        // Error bodies carry a message even on non-2xx statuses
        let body: EverythingResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(NewsError::Api(format!("HTTP {status}: {text}")));
            }
            Err(e) => return Err(NewsError::Json(e)),
        };

        if !status.is_success() || !body.is_ok() {
            let code = body.code.unwrap_or_else(|| status.to_string());
            let message = body.message.unwrap_or_default();
            return Err(NewsError::Api(format!("{code}: {message}")));
        }

        Ok(body.into_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = NewsClient::new("test_key");
        let query = NewsQuery::latest(vec!["GME".to_string(), "AMC".to_string()]);
        assert_eq!(
            client.url(&query).unwrap().as_str(),
            "https://newsapi.org/v2/everything?q=GME+OR+AMC&language=en&sortBy=publishedAt&pageSize=5&page=1"
        );
        assert!(!client.url(&query).unwrap().as_str().contains("test_key"));
    }

    #[test]
    fn test_custom_base_url() {
        let client = NewsClient::new("k").with_base_url("http://localhost:9000/everything");
        let query = NewsQuery::latest(vec!["BB".to_string()]);
        assert_eq!(
            client.url(&query).unwrap().as_str(),
            "http://localhost:9000/everything?q=BB&language=en&sortBy=publishedAt&pageSize=5&page=1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let client = NewsClient::new("k").with_base_url("not a url");
        let query = NewsQuery::latest(vec!["BB".to_string()]);
        assert!(matches!(client.url(&query), Err(NewsError::Api(_))));
    }
}

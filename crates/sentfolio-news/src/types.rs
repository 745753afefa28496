//! Data types for news queries and API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sort order for the `everything` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    /// Newest articles first.
    #[default]
    PublishedAt,
    /// Articles most related to the query first.
    Relevancy,
    /// Articles from popular sources first.
    Popularity,
}

impl SortBy {
    /// Get the API parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PublishedAt => "publishedAt",
            Self::Relevancy => "relevancy",
            Self::Popularity => "popularity",
        }
    }
}

/// A search for recent articles mentioning a set of tickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsQuery {
    /// Tickers joined with `OR` into the search expression.
    pub tickers: Vec<String>,
    /// ISO 639-1 language code.
    pub language: String,
    /// Result ordering.
    pub sort_by: SortBy,
    /// Articles per page.
    pub page_size: u32,
    /// 1-based page number.
    pub page: u32,
}

impl NewsQuery {
    /// The five newest English articles mentioning any of `tickers`.
    #[must_use]
    pub fn latest(tickers: Vec<String>) -> Self {
        Self {
            tickers,
            language: "en".to_string(),
            sort_by: SortBy::PublishedAt,
            page_size: 5,
            page: 1,
        }
    }

    /// The search expression, e.g. `GME OR AMC`.
    #[must_use]
    pub fn search_expression(&self) -> String {
        self.tickers.join(" OR ")
    }

    /// Query-string parameters, without the API key.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.search_expression()),
            ("language", self.language.clone()),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("pageSize", self.page_size.to_string()),
            ("page", self.page.to_string()),
        ]
    }
}

/// A news article as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Headline.
    pub title: String,
    /// Publishing outlet name.
    pub source: String,
    /// Publication time.
    pub published_at: Option<DateTime<Utc>>,
    /// Link to the full article.
    pub url: String,
    /// Short summary.
    pub description: Option<String>,
    /// Lead image.
    pub image_url: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPage {
    /// Status reported by the API (`ok` on success).
    pub status: String,
    /// Total matches across all pages.
    pub total_results: u64,
    /// Articles on this page.
    pub articles: Vec<Article>,
}

/// Source object inside a raw article.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSource {
    /// Source identifier, when the outlet is a known source.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Article exactly as the API returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    /// Publishing outlet.
    pub source: RawSource,
    /// Author byline.
    #[serde(default)]
    pub author: Option<String>,
    /// Headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Short summary.
    #[serde(default)]
    pub description: Option<String>,
    /// Link to the full article.
    #[serde(default)]
    pub url: Option<String>,
    /// Lead image.
    #[serde(default)]
    pub url_to_image: Option<String>,
    /// Publication time in RFC 3339.
    #[serde(default)]
    pub published_at: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw.title.unwrap_or_default(),
            source: raw.source.name.or(raw.source.id).unwrap_or_default(),
            published_at: raw
                .published_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            url: raw.url.unwrap_or_default(),
            description: raw.description,
            image_url: raw.url_to_image,
        }
    }
}

/// Body of an `everything` response, successful or not.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EverythingResponse {
    /// `ok` or `error`.
    pub status: String,
    /// Total matches.
    #[serde(default)]
    pub total_results: u64,
    /// Articles on this page.
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    /// Error code when `status` is `error`.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message when `status` is `error`.
    #[serde(default)]
    pub message: Option<String>,
}

impl EverythingResponse {
    /// Whether the API reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Convert into a page of articles.
    #[must_use]
    pub fn into_page(self) -> NewsPage {
        NewsPage {
            status: self.status,
            total_results: self.total_results,
            articles: self.articles.into_iter().map(Article::from).collect(),
        }
    }
}

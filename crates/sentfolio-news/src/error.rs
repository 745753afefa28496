//! Error types for the news client.

use thiserror::Error;

/// Errors that can occur when querying the news API.
#[derive(Debug, Error)]
pub enum NewsError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error.
    #[error("News API error: {0}")]
    Api(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. The developer plan allows 100 requests/day.")]
    RateLimitExceeded,
}

//! NewsAPI client for sentfolio.
//!
//! Fetches the latest English articles mentioning a set of tickers from the
//! [NewsAPI](https://newsapi.org/) `everything` endpoint.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sentfolio_news::{NewsClient, NewsProvider, NewsQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NewsClient::new(std::env::var("NEWS_API_KEY")?);
//!     let page = client
//!         .everything(&NewsQuery::latest(vec!["GME".into(), "AMC".into()]))
//!         .await?;
//!     for article in page.articles {
//!         println!("{} ({})", article.title, article.source);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The API key is passed in explicitly; `sentfolio::ServiceConfig` reads it
//! from `NEWS_API_KEY` or a `.env` file.

mod client;
mod error;
mod types;

pub use client::{NewsClient, NewsProvider};
pub use error::NewsError;
pub use types::*;

/// Result type for news operations.
pub type Result<T> = std::result::Result<T, NewsError>;

#![doc(issue_tracker_base_url = "https://github.com/sentfolio/sentfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and trait definitions for the Sentfolio portfolio engine.
//!
//! This crate provides the foundational pieces shared by every other Sentfolio
//! crate: calendar helpers, the indicator vocabulary, the error taxonomy, the
//! price-source abstraction and the return arithmetic.

/// The version of the sentfolio-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod source;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{Result, SentfolioError};
pub use source::{PriceSeries, PriceSource};
pub use types::{Date, Indicator, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}

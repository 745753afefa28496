//! Error types for the Sentfolio engine.
//!
//! Fatal conditions abort a request and are surfaced to the caller. Partial
//! data (a single missing price file, a month without rankings) is never an
//! error: it degrades to NaN or an empty result further down the pipeline.

use thiserror::Error;

/// The main error type for Sentfolio operations.
#[derive(Debug, Error)]
pub enum SentfolioError {
    /// The sentiment source is unreadable or malformed.
    #[error("Malformed data source: {0}")]
    DataFormat(String),

    /// The caller asked for an indicator that does not exist.
    #[error("Unknown indicator: '{0}' (expected one of engagement_ratio, total_sentiment, comms_num, score)")]
    UnknownIndicator(String),

    /// None of the requested tickers has usable prices in the range.
    #[error("No price data available: {0}")]
    PriceData(String),

    /// The benchmark series is missing or unparsable.
    #[error("Benchmark data unavailable: {0}")]
    BenchmarkData(String),

    /// A date is malformed or the requested range is empty.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error due to invalid caller input that is not a date.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl SentfolioError {
    /// Stable snake_case tag used in structured error responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DataFormat(_) => "data_format",
            Self::UnknownIndicator(_) => "unknown_indicator",
            Self::PriceData(_) => "price_data",
            Self::BenchmarkData(_) => "benchmark_data",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidData(_) => "invalid_data",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Polars(_) => "polars",
            Self::Other(_) => "other",
        }
    }

    /// Whether the error was caused by the caller's input rather than by the
    /// data or the environment.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownIndicator(_) | Self::InvalidDate(_) | Self::InvalidData(_)
        )
    }
}

impl From<String> for SentfolioError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for SentfolioError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Sentfolio operations.
pub type Result<T> = std::result::Result<T, SentfolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SentfolioError::PriceData("AAPL, MSFT".to_string());
        assert_eq!(err.to_string(), "No price data available: AAPL, MSFT");

        let err = SentfolioError::UnknownIndicator("momentum".to_string());
        assert!(err.to_string().starts_with("Unknown indicator: 'momentum'"));
    }

    #[test]
    fn test_error_kind_and_client_flag() {
        let err = SentfolioError::UnknownIndicator("x".to_string());
        assert_eq!(err.kind(), "unknown_indicator");
        assert!(err.is_client_error());

        let err = SentfolioError::BenchmarkData("QQQ".to_string());
        assert_eq!(err.kind(), "benchmark_data");
        assert!(!err.is_client_error());

        let err = SentfolioError::InvalidDate("2021-13-01".to_string());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_from_string() {
        let err: SentfolioError = "boom".into();
        assert!(matches!(err, SentfolioError::Other(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SentfolioError = io.into();
        assert_eq!(err.kind(), "io");
    }
}

//! Common types used throughout the Sentfolio engine.
//!
//! This module defines the date and symbol aliases, the indicator vocabulary
//! used to rank tickers, and the calendar arithmetic that anchors rebalancing
//! to month boundaries.

use chrono::{Datelike, Duration, Months, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SentfolioError;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A market symbol identifier, e.g. "GME" or "QQQ".
pub type Symbol = String;

/// Sentiment or engagement metric used to rank tickers each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Comments per upvote, averaged over the month's posts.
    EngagementRatio,
    /// Title plus body sentiment, averaged over the month's posts.
    TotalSentiment,
    /// Number of comments, averaged over the month's posts.
    CommsNum,
    /// Post score (upvotes), averaged over the month's posts.
    Score,
}

impl Indicator {
    /// All supported indicators, in display order.
    pub const ALL: [Self; 4] = [
        Self::EngagementRatio,
        Self::TotalSentiment,
        Self::CommsNum,
        Self::Score,
    ];

    /// Canonical column name of the indicator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EngagementRatio => "engagement_ratio",
            Self::TotalSentiment => "total_sentiment",
            Self::CommsNum => "comms_num",
            Self::Score => "score",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = SentfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|indicator| indicator.as_str() == s.trim())
            .ok_or_else(|| SentfolioError::UnknownIndicator(s.to_string()))
    }
}

/// First calendar day of the month containing `date`.
#[must_use]
pub fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day0()))
}

/// First calendar day of the month after the one containing `date`.
#[must_use]
pub fn next_month_start(date: Date) -> Date {
    month_start(date) + Months::new(1)
}

/// First calendar day of the month before the one containing `date`.
#[must_use]
pub fn previous_month_start(date: Date) -> Date {
    month_start(date) - Months::new(1)
}

/// Last calendar day of the month containing `date`.
#[must_use]
pub fn month_end(date: Date) -> Date {
    next_month_start(date) - Duration::days(1)
}

/// Month starts from the month of `from` through the month of `to`, inclusive.
///
/// Returns an empty vector when `from` lies in a later month than `to`.
#[must_use]
pub fn month_starts_between(from: Date, to: Date) -> Vec<Date> {
    let last = month_start(to);
    let mut current = month_start(from);
    let mut months = Vec::new();
    while current <= last {
        months.push(current);
        current = next_month_start(current);
    }
    months
}

/// Roll a Saturday or Sunday forward to the following Monday.
#[must_use]
pub fn roll_weekend_forward(date: Date) -> Date {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`SentfolioError::InvalidDate`] if the string is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, SentfolioError> {
    Date::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| SentfolioError::InvalidDate(format!("'{value}': {e}")))
}

//! Indicator registry for discovering the supported ranking metrics.

use serde::Serialize;
use sentfolio_traits::Indicator;

/// Metadata about an indicator.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorInfo {
    /// The indicator itself
    pub indicator: Indicator,

    /// Short human-readable label
    pub label: &'static str,

    /// Human-readable description
    pub description: &'static str,
}

impl IndicatorInfo {
    /// Canonical name of the indicator.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.indicator.as_str()
    }
}

/// Get information about all available indicators.
#[must_use]
pub fn available_indicators() -> Vec<IndicatorInfo> {
    vec![
        IndicatorInfo {
            indicator: Indicator::EngagementRatio,
            label: "Engagement Ratio",
            description: "Discussion relative to popularity: comments per upvote, averaged per post",
        },
        IndicatorInfo {
            indicator: Indicator::TotalSentiment,
            label: "Sentiment",
            description: "Average title plus body sentiment of posts mentioning the stock",
        },
        IndicatorInfo {
            indicator: Indicator::Score,
            label: "Total Score of Posts",
            description: "Average upvote score of posts mentioning the stock",
        },
        IndicatorInfo {
            indicator: Indicator::CommsNum,
            label: "Total Number of Comments",
            description: "Average number of comments on posts mentioning the stock",
        },
    ]
}

/// Get information about a specific indicator by name.
#[must_use]
pub fn get_indicator_info(name: &str) -> Option<IndicatorInfo> {
    available_indicators()
        .into_iter()
        .find(|info| info.name() == name)
}

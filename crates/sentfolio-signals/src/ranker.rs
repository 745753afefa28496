//! Monthly cross-sectional ranking of tickers by a sentiment indicator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sentfolio_traits::types::month_start;
use sentfolio_traits::{Date, Indicator, Result, Symbol};

use crate::store::SentimentTable;

/// Configuration for the monthly ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Number of top-ranked tickers kept per month (default: 5)
    pub top_n: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

/// Aggregated indicator value and rank of one ticker in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyScore {
    /// First day of the scoring month.
    pub month: Date,
    /// Ranked ticker.
    pub ticker: Symbol,
    /// Indicator the value was aggregated from.
    pub indicator: Indicator,
    /// Mean of the indicator over the ticker's posts in the month.
    pub value: f64,
    /// 1 is best.
    pub rank: usize,
}

/// Top-ranked tickers of one month for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRanking {
    /// First day of the scoring month.
    pub month: Date,
    /// Indicator used for ranking.
    pub indicator: Indicator,
    /// Scores ordered by rank, at most `top_n` entries.
    pub scores: Vec<MonthlyScore>,
}

impl MonthlyRanking {
    /// Whether no ticker had valid data in the month.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Selected tickers in rank order.
    pub fn tickers(&self) -> Vec<Symbol> {
        self.scores.iter().map(|s| s.ticker.clone()).collect()
    }
}

/// Ranks tickers per calendar month by the mean of an indicator.
///
/// Ties keep the order in which tickers first appear in the month's records,
/// so results are reproducible across runs.
///
/// # Example
///
/// ```ignore
/// use sentfolio_signals::{MonthlyRanker, SentimentStore};
/// use sentfolio_traits::Indicator;
///
/// let table = SentimentStore::load("data/reddit_sentiment_data.csv")?;
/// let ranking = MonthlyRanker::default().rank(&table, Indicator::EngagementRatio, month);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MonthlyRanker {
    config: RankerConfig,
}

impl MonthlyRanker {
    /// Create a new ranker with the given configuration.
    #[must_use]
    pub const fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    /// Number of tickers kept per month.
    #[must_use]
    pub const fn top_n(&self) -> usize {
        self.config.top_n
    }

    /// Rank the tickers of the month containing `month` by `indicator`.
    ///
    /// Returns an empty ranking when no ticker has valid data that month.
    pub fn rank(&self, table: &SentimentTable, indicator: Indicator, month: Date) -> MonthlyRanking {
        let month = month_start(month);

        // (ticker, sum, count) in first-seen order
        let mut groups: Vec<(&str, f64, usize)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for record in table.records_in_month(month) {
            let value = record.value(indicator);
            let pos = *positions.entry(record.ticker.as_str()).or_insert_with(|| {
                groups.push((record.ticker.as_str(), 0.0, 0));
                groups.len() - 1
            });
            if value.is_finite() {
                groups[pos].1 += value;
                groups[pos].2 += 1;
            }
        }

        let mut means: Vec<(&str, f64)> = groups
            .into_iter()
            .filter(|(_, _, count)| *count > 0)
            .map(|(ticker, sum, count)| (ticker, sum / count as f64))
            .filter(|(_, mean)| mean.is_finite())
            .collect();

        // sort_by is stable: equal values keep first-seen order
        means.sort_by(|a, b| b.1.total_cmp(&a.1));

        debug!(
            %month,
            %indicator,
            available = means.len(),
            selected = means.len().min(self.config.top_n),
            "ranked month"
        );

        let scores = means
            .into_iter()
            .take(self.config.top_n)
            .enumerate()
            .map(|(i, (ticker, value))| MonthlyScore {
                month,
                ticker: ticker.to_string(),
                indicator,
                value,
                rank: i + 1,
            })
            .collect();

        MonthlyRanking {
            month,
            indicator,
            scores,
        }
    }

    /// Rank by an indicator given by name.
    ///
    /// # Errors
    ///
    /// Returns [`sentfolio_traits::SentfolioError::UnknownIndicator`] if the
    /// name is not a supported indicator.
    pub fn rank_by_name(
        &self,
        table: &SentimentTable,
        indicator: &str,
        month: Date,
    ) -> Result<MonthlyRanking> {
        let indicator: Indicator = indicator.parse()?;
        Ok(self.rank(table, indicator, month))
    }

    /// Rank every month in `months`, in the order given.
    pub fn rank_months(
        &self,
        table: &SentimentTable,
        indicator: Indicator,
        months: &[Date],
    ) -> Vec<MonthlyRanking> {
        months
            .iter()
            .map(|month| self.rank(table, indicator, *month))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SentimentRecord;
    use approx::assert_abs_diff_eq;
    use sentfolio_traits::SentfolioError;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn post(date: Date, ticker: &str, ratio: f64) -> SentimentRecord {
        SentimentRecord {
            date,
            ticker: ticker.to_string(),
            score: 10.0,
            comment_count: ratio * 10.0,
            title_sentiment: None,
            body_sentiment: None,
            total_sentiment: ratio - 0.5,
            engagement_ratio: ratio,
        }
    }

    #[test]
    fn test_default_config() {
        let config = RankerConfig::default();
        assert_eq!(config.top_n, 5);
        assert_eq!(MonthlyRanker::default().top_n(), 5);
    }

    #[test]
    fn test_rank_uses_monthly_mean() {
        let table = SentimentTable::from_records(
            vec![
                post(d(2021, 3, 1), "GME", 1.0),
                post(d(2021, 3, 5), "AMC", 0.7),
                post(d(2021, 3, 9), "GME", 0.2),
                post(d(2021, 4, 1), "AMC", 9.0),
            ],
            "h",
        );
        let ranking = MonthlyRanker::default().rank(&table, Indicator::EngagementRatio, d(2021, 3, 17));

        assert_eq!(ranking.month, d(2021, 3, 1));
        assert_eq!(ranking.tickers(), vec!["AMC", "GME"]);
        assert_abs_diff_eq!(ranking.scores[1].value, 0.6, epsilon = 1e-12);
        assert_eq!(ranking.scores[0].rank, 1);
        assert_eq!(ranking.scores[1].rank, 2);
    }

    #[test]
    fn test_rank_keeps_at_most_top_n_descending() {
        let records = (0..8)
            .map(|i| post(d(2021, 5, 3), &format!("T{i}"), f64::from(i)))
            .collect();
        let table = SentimentTable::from_records(records, "h");
        let ranking = MonthlyRanker::default().rank(&table, Indicator::EngagementRatio, d(2021, 5, 1));

        assert_eq!(ranking.scores.len(), 5);
        let ranks: Vec<usize> = ranking.scores.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        for pair in ranking.scores.windows(2) {
            assert!(pair[0].value > pair[1].value);
        }
        assert_eq!(ranking.scores[0].ticker, "T7");
    }

    #[test]
    fn test_fewer_than_top_n_tickers() {
        let table = SentimentTable::from_records(
            vec![post(d(2021, 6, 1), "BB", 0.3), post(d(2021, 6, 2), "NOK", 0.4)],
            "h",
        );
        let ranking = MonthlyRanker::default().rank(&table, Indicator::EngagementRatio, d(2021, 6, 1));
        assert_eq!(ranking.tickers(), vec!["NOK", "BB"]);
    }

    #[test]
    fn test_ties_resolve_by_first_seen_order() {
        let records = vec![
            post(d(2021, 7, 2), "ZZZ", 0.5),
            post(d(2021, 7, 1), "AAA", 0.5),
            post(d(2021, 7, 3), "MMM", 0.5),
        ];
        let table = SentimentTable::from_records(records, "h");
        let ranker = MonthlyRanker::new(RankerConfig { top_n: 2 });

        for _ in 0..3 {
            let ranking = ranker.rank(&table, Indicator::EngagementRatio, d(2021, 7, 1));
            assert_eq!(ranking.tickers(), vec!["ZZZ", "AAA"]);
        }
    }

    #[test]
    fn test_other_indicators() {
        let table = SentimentTable::from_records(
            vec![post(d(2021, 3, 1), "GME", 1.0), post(d(2021, 3, 2), "AMC", 0.7)],
            "h",
        );
        let ranker = MonthlyRanker::default();

        let by_sentiment = ranker.rank(&table, Indicator::TotalSentiment, d(2021, 3, 1));
        assert_eq!(by_sentiment.tickers(), vec!["GME", "AMC"]);

        let by_score = ranker.rank(&table, Indicator::Score, d(2021, 3, 1));
        // Equal scores: first seen wins.
        assert_eq!(by_score.tickers(), vec!["GME", "AMC"]);

        let by_comments = ranker.rank(&table, Indicator::CommsNum, d(2021, 3, 1));
        assert_abs_diff_eq!(by_comments.scores[0].value, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_month_is_not_an_error() {
        let table = SentimentTable::from_records(vec![post(d(2021, 3, 1), "GME", 1.0)], "h");
        let ranking = MonthlyRanker::default().rank(&table, Indicator::EngagementRatio, d(2021, 9, 1));
        assert!(ranking.is_empty());
    }

    #[test]
    fn test_unknown_indicator_name() {
        let table = SentimentTable::from_records(vec![], "h");
        let err = MonthlyRanker::default()
            .rank_by_name(&table, "upvotes", d(2021, 3, 1))
            .unwrap_err();
        assert!(matches!(err, SentfolioError::UnknownIndicator(_)));
    }

    #[test]
    fn test_rank_months() {
        let table = SentimentTable::from_records(
            vec![post(d(2021, 3, 1), "GME", 1.0), post(d(2021, 4, 1), "AMC", 0.7)],
            "h",
        );
        let rankings = MonthlyRanker::default().rank_months(
            &table,
            Indicator::EngagementRatio,
            &[d(2021, 3, 1), d(2021, 4, 1)],
        );
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[1].tickers(), vec!["AMC"]);
    }
}

//! Rebalance schedule construction.
//!
//! Sentiment observed during month M selects the portfolio held during
//! month M+1, so every ranking becomes effective on the first calendar day
//! of the following month. Each entry is held until the end of its own
//! month, which makes the holding intervals tile the calendar without
//! overlap.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentfolio_signals::MonthlyRanking;
use sentfolio_traits::types::{month_end, next_month_start};
use sentfolio_traits::{Date, Result, SentfolioError, Symbol};

/// Ticker set that becomes the active portfolio on `effective_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceEntry {
    /// First calendar day of the holding month.
    pub effective_date: Date,
    /// Selected tickers in rank order.
    pub tickers: Vec<Symbol>,
}

/// One holding period `[start, end]` with its constituents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingInterval {
    /// Rebalance date.
    pub start: Date,
    /// Last calendar day of the rebalance month.
    pub end: Date,
    /// Equal-weighted constituents.
    pub tickers: Vec<Symbol>,
}

/// Mapping from rebalance date to the selected ticker set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceSchedule {
    entries: BTreeMap<Date, Vec<Symbol>>,
}

impl RebalanceSchedule {
    /// Build a schedule from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::InvalidData`] if an effective date is not the
    /// first day of a month or appears twice; either would make holding
    /// intervals overlap.
    pub fn from_entries(entries: impl IntoIterator<Item = RebalanceEntry>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if entry.effective_date.day() != 1 {
                return Err(SentfolioError::InvalidData(format!(
                    "rebalance date {} is not the first day of a month",
                    entry.effective_date
                )));
            }
            if map.insert(entry.effective_date, entry.tickers).is_some() {
                return Err(SentfolioError::InvalidData(format!(
                    "duplicate rebalance date {}",
                    entry.effective_date
                )));
            }
        }
        Ok(Self { entries: map })
    }

    /// Number of rebalance dates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schedule has no rebalance dates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tickers effective on `date`, if it is a rebalance date.
    pub fn get(&self, date: Date) -> Option<&[Symbol]> {
        self.entries.get(&date).map(Vec::as_slice)
    }

    /// Entries in date order.
    pub fn entries(&self) -> Vec<RebalanceEntry> {
        self.entries
            .iter()
            .map(|(date, tickers)| RebalanceEntry {
                effective_date: *date,
                tickers: tickers.clone(),
            })
            .collect()
    }

    /// Holding intervals in date order.
    pub fn intervals(&self) -> Vec<HoldingInterval> {
        self.entries
            .iter()
            .map(|(start, tickers)| HoldingInterval {
                start: *start,
                end: month_end(*start),
                tickers: tickers.clone(),
            })
            .collect()
    }

    /// Every scheduled ticker once, in order of first appearance.
    pub fn tickers(&self) -> Vec<Symbol> {
        let mut seen = Vec::new();
        for ticker in self.entries.values().flatten() {
            if !seen.contains(ticker) {
                seen.push(ticker.clone());
            }
        }
        seen
    }

    /// The schedule keyed by `YYYY-MM-DD` strings.
    pub fn tickers_by_date(&self) -> BTreeMap<String, Vec<Symbol>> {
        self.entries
            .iter()
            .map(|(date, tickers)| (date.format("%Y-%m-%d").to_string(), tickers.clone()))
            .collect()
    }
}

/// Turns monthly rankings into a lagged rebalance schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RebalanceScheduler;

impl RebalanceScheduler {
    /// Schedule each non-empty ranking on the first day of the next month.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::InvalidData`] if two rankings cover the same
    /// scoring month.
    pub fn schedule(&self, rankings: &[MonthlyRanking]) -> Result<RebalanceSchedule> {
        let entries: Vec<RebalanceEntry> = rankings
            .iter()
            .filter(|ranking| !ranking.is_empty())
            .map(|ranking| RebalanceEntry {
                effective_date: next_month_start(ranking.month),
                tickers: ranking.tickers(),
            })
            .collect();

        debug!(
            months = rankings.len(),
            rebalances = entries.len(),
            "built rebalance schedule"
        );
        RebalanceSchedule::from_entries(entries)
    }
}

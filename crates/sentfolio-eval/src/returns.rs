//! Equal-weighted portfolio log returns over a rebalance schedule.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sentfolio_traits::stats::{add_fill_zero, nan_mean};
use sentfolio_traits::types::roll_weekend_forward;
use sentfolio_traits::{Date, PriceSeries, PriceSource, Result, SentfolioError, Symbol};

use crate::schedule::RebalanceSchedule;

/// Portfolio log return of one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    /// Trading day.
    pub date: Date,
    /// Mean log return of the held tickers; NaN if none had data.
    pub portfolio_return: f64,
}

/// Output of [`PriceReturnEngine::compute`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturns {
    /// Daily returns in date order.
    pub periods: Vec<PeriodReturn>,
    /// Tickers whose prices were used.
    pub loaded: Vec<Symbol>,
    /// Tickers that were unreadable or had no prices in range.
    pub missing: Vec<Symbol>,
}

impl PortfolioReturns {
    /// Whether no period was produced.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Computes daily equal-weighted returns of a scheduled portfolio.
///
/// Log returns are taken over the shared calendar of all loaded tickers, so a
/// ticker with a gap has no return on either side of it. For each holding
/// interval the return of a trading day is the mean log return of that
/// interval's tickers, skipping tickers with no data on the day. A ticker
/// whose prices cannot be read has no data at all. An interval whose tickers
/// all lack data still yields its trading days, with a NaN return.
///
/// # Example
///
/// ```rust,ignore
/// use sentfolio_eval::{CsvPriceDirectory, PriceReturnEngine};
///
/// let prices = CsvPriceDirectory::new("data/stock_historical_prices");
/// let returns = PriceReturnEngine::default().compute(&prices, &schedule, start, end)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceReturnEngine;

impl PriceReturnEngine {
    /// Compute portfolio returns between `start` and `end`.
    ///
    /// Weekend bounds roll forward to the following Monday before prices
    /// are read. An empty schedule yields an empty result.
    ///
    /// # Arguments
    ///
    /// * `prices` - Source of per-ticker close prices
    /// * `schedule` - Rebalance dates and their ticker sets
    /// * `start` - First day of the query range
    /// * `end` - Last day of the query range
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::PriceData`] if no scheduled ticker has
    /// usable prices in range.
    pub fn compute(
        &self,
        prices: &dyn PriceSource,
        schedule: &RebalanceSchedule,
        start: Date,
        end: Date,
    ) -> Result<PortfolioReturns> {
        if schedule.is_empty() {
            debug!("empty schedule, no returns to compute");
            return Ok(PortfolioReturns::default());
        }

        let start = roll_weekend_forward(start);
        let end = roll_weekend_forward(end);

        let mut loaded = Vec::new();
        let mut missing = Vec::new();
        let mut series_by_ticker: HashMap<Symbol, PriceSeries> = HashMap::new();

        for ticker in schedule.tickers() {
            match prices.load(&ticker) {
                Ok(series) => {
                    let series = series.restrict(start, end);
                    if series.has_prices() {
                        series_by_ticker.insert(ticker.clone(), series);
                        loaded.push(ticker);
                    } else {
                        warn!(%ticker, %start, %end, "no prices in range");
                        missing.push(ticker);
                    }
                }
                Err(e) => {
                    warn!(%ticker, source = prices.name(), error = %e, "price data unavailable");
                    missing.push(ticker);
                }
            }
        }

        if loaded.is_empty() {
            return Err(SentfolioError::PriceData(format!(
                "no usable prices for any of {} tickers between {start} and {end}",
                missing.len()
            )));
        }

        // Every loaded ticker is aligned on the union of their price dates.
        let calendar: Vec<Date> = series_by_ticker
            .values()
            .flat_map(|series| series.points().iter().map(|(date, _)| *date))
            .collect::<BTreeSet<Date>>()
            .into_iter()
            .collect();
        let return_days = calendar.get(1..).unwrap_or_default();

        let returns: HashMap<&str, Vec<f64>> = series_by_ticker
            .iter()
            .map(|(ticker, series)| (ticker.as_str(), series.aligned_log_returns(&calendar)))
            .collect();

        // Days on which every ticker lacks a return carry no information.
        let trading_days: Vec<(usize, Date)> = return_days
            .iter()
            .enumerate()
            .filter(|(i, _)| returns.values().any(|r| r[*i].is_finite()))
            .map(|(i, date)| (i, *date))
            .collect();

        let mut combined: BTreeMap<Date, f64> = BTreeMap::new();
        for interval in schedule.intervals() {
            let held: Vec<&Vec<f64>> = interval
                .tickers
                .iter()
                .filter_map(|ticker| returns.get(ticker.as_str()))
                .collect();
            if held.len() < interval.tickers.len() {
                debug!(
                    start = %interval.start,
                    held = held.len(),
                    scheduled = interval.tickers.len(),
                    "interval holds tickers without prices"
                );
            }

            for (i, date) in &trading_days {
                if *date < interval.start || *date > interval.end {
                    continue;
                }
                let values: Vec<f64> = held.iter().map(|r| r[*i]).collect();
                let slot = combined.entry(*date).or_insert(f64::NAN);
                *slot = add_fill_zero(*slot, nan_mean(&values));
            }
        }

        let periods: Vec<PeriodReturn> = combined
            .into_iter()
            .map(|(date, portfolio_return)| PeriodReturn {
                date,
                portfolio_return,
            })
            .collect();

        info!(
            periods = periods.len(),
            loaded = loaded.len(),
            missing = missing.len(),
            "computed portfolio returns"
        );

        Ok(PortfolioReturns {
            periods,
            loaded,
            missing,
        })
    }
}

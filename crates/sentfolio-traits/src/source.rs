//! Price-source abstraction.
//!
//! Historical prices for portfolio constituents and for benchmark indexes
//! come from the same kind of collaborator: something addressable by symbol
//! that yields a dated close-price series. The engine only depends on the
//! [`PriceSource`] trait, so CSV directories, databases and in-memory fixtures
//! are interchangeable.

use serde::{Deserialize, Serialize};

use crate::{Date, Result, Symbol, stats};

/// A dated close-price series for one symbol, ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: Symbol,
    points: Vec<(Date, f64)>,
}

impl PriceSeries {
    /// Create a series from `(date, close)` points.
    ///
    /// Points are sorted by date; for duplicate dates the last point wins.
    pub fn new(symbol: impl Into<Symbol>, mut points: Vec<(Date, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        points.reverse();
        points.dedup_by_key(|(date, _)| *date);
        points.reverse();
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    /// The symbol this series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The `(date, close)` points in date order.
    pub fn points(&self) -> &[(Date, f64)] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether at least one close is a finite number.
    pub fn has_prices(&self) -> bool {
        self.points.iter().any(|(_, close)| close.is_finite())
    }

    /// Restrict the series to `[start, end]`, both inclusive.
    #[must_use]
    pub fn restrict(&self, start: Date, end: Date) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|(date, _)| *date >= start && *date <= end)
                .copied()
                .collect(),
        }
    }

    /// Daily log returns `ln(p_t) - ln(p_{t-1})` keyed by the later date.
    ///
    /// The first point has no prior price and produces no return. A missing
    /// close on either side yields NaN for that date.
    pub fn log_returns(&self) -> Vec<(Date, f64)> {
        let closes: Vec<f64> = self.points.iter().map(|(_, close)| *close).collect();
        self.points
            .iter()
            .skip(1)
            .map(|(date, _)| *date)
            .zip(stats::log_returns(&closes))
            .collect()
    }

    /// Daily log returns over a shared trading `calendar`.
    ///
    /// Closes are placed on the calendar with NaN for dates the series lacks,
    /// so a gap yields NaN on both sides of it instead of one multi-day move.
    /// The result has one value per calendar date after the first.
    pub fn aligned_log_returns(&self, calendar: &[Date]) -> Vec<f64> {
        let closes: Vec<f64> = calendar
            .iter()
            .map(|date| {
                self.points
                    .binary_search_by_key(date, |(d, _)| *d)
                    .map_or(f64::NAN, |i| self.points[i].1)
            })
            .collect();
        stats::log_returns(&closes)
    }
}

/// Source of historical close prices addressable by symbol.
///
/// # Example
///
/// ```no_run
/// use sentfolio_traits::{Date, PriceSeries, PriceSource, Result};
///
/// struct Flat;
///
/// impl PriceSource for Flat {
///     fn name(&self) -> &str {
///         "flat"
///     }
///
///     fn load(&self, symbol: &str) -> Result<PriceSeries> {
///         let day = Date::from_ymd_opt(2021, 2, 1).unwrap();
///         Ok(PriceSeries::new(symbol, vec![(day, 100.0)]))
///     }
/// }
/// ```
pub trait PriceSource: Send + Sync {
    /// Short description of the source used in log messages.
    fn name(&self) -> &str;

    /// Load the full close-price history of `symbol`.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol's data is missing or cannot be parsed.
    /// Callers decide whether that is fatal.
    fn load(&self, symbol: &str) -> Result<PriceSeries>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let series = PriceSeries::new(
            "GME",
            vec![
                (d(2021, 2, 3), 3.0),
                (d(2021, 2, 1), 1.0),
                (d(2021, 2, 3), 4.0),
            ],
        );
        assert_eq!(series.points(), &[(d(2021, 2, 1), 1.0), (d(2021, 2, 3), 4.0)]);
    }

    #[test]
    fn test_restrict() {
        let series = PriceSeries::new(
            "AMC",
            vec![(d(2021, 1, 29), 1.0), (d(2021, 2, 1), 2.0), (d(2021, 2, 2), 3.0)],
        );
        let restricted = series.restrict(d(2021, 2, 1), d(2021, 2, 1));
        assert_eq!(restricted.points(), &[(d(2021, 2, 1), 2.0)]);
    }

    #[test]
    fn test_log_returns_drop_first_row() {
        let series = PriceSeries::new(
            "AMC",
            vec![(d(2021, 2, 1), 100.0), (d(2021, 2, 2), 110.0), (d(2021, 2, 3), 99.0)],
        );
        let returns = series.log_returns();
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].0, d(2021, 2, 2));
        assert_abs_diff_eq!(returns[0].1, (110.0_f64 / 100.0).ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(returns[1].1, (99.0_f64 / 110.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_aligned_log_returns_mark_gaps() {
        let series = PriceSeries::new("B", vec![(d(2021, 2, 1), 100.0), (d(2021, 2, 3), 200.0)]);
        let calendar = [d(2021, 2, 1), d(2021, 2, 2), d(2021, 2, 3), d(2021, 2, 4)];
        let returns = series.aligned_log_returns(&calendar);
        assert_eq!(returns.len(), 3);
        assert!(returns.iter().all(|r| r.is_nan()));

        let full = PriceSeries::new("A", vec![(d(2021, 2, 1), 100.0), (d(2021, 2, 2), 110.0)]);
        let returns = full.aligned_log_returns(&calendar[..2]);
        assert_abs_diff_eq!(returns[0], 1.1_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_price_source_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn PriceSource>();
    }
}

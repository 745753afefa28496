//! Alignment of portfolio returns with a market benchmark.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sentfolio_traits::stats::cumulative_returns;
use sentfolio_traits::{Date, PriceSource, Result, SentfolioError};

use crate::returns::PeriodReturn;

/// One row of the merged portfolio/benchmark series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturnPoint {
    /// Trading day present in both series.
    pub date: Date,
    /// Portfolio log return of the day.
    pub period_return: f64,
    /// Compounded portfolio return since the first row.
    pub cumulative_return: f64,
    /// Benchmark log return of the day.
    pub benchmark_return: f64,
    /// Compounded benchmark return since the first row.
    pub benchmark_cumulative_return: f64,
}

/// Joins portfolio returns with benchmark log returns on date.
#[derive(Debug, Clone, Copy, Default)]
pub struct BenchmarkMerger;

impl BenchmarkMerger {
    /// Merge `portfolio` with the benchmark `symbol` read from `source`.
    ///
    /// Benchmark prices are restricted to `[start, end]` before computing log
    /// returns. Only dates present on both sides are kept, and cumulative
    /// returns are compounded over the joined rows.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::BenchmarkData`] if the benchmark cannot be
    /// read or has no prices in range.
    pub fn merge(
        &self,
        portfolio: &[PeriodReturn],
        source: &dyn PriceSource,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<PortfolioReturnPoint>> {
        let series = source
            .load(symbol)
            .map_err(|e| SentfolioError::BenchmarkData(format!("{symbol}: {e}")))?
            .restrict(start, end);

        if !series.has_prices() {
            return Err(SentfolioError::BenchmarkData(format!(
                "{symbol}: no prices between {start} and {end}"
            )));
        }

        let benchmark: BTreeMap<Date, f64> = series.log_returns().into_iter().collect();

        let joined: Vec<(Date, f64, f64)> = portfolio
            .iter()
            .filter_map(|p| benchmark.get(&p.date).map(|b| (p.date, p.portfolio_return, *b)))
            .collect();

        if joined.len() < portfolio.len() {
            warn!(
                symbol,
                dropped = portfolio.len() - joined.len(),
                "portfolio dates without benchmark data"
            );
        }

        let portfolio_values: Vec<f64> = joined.iter().map(|(_, p, _)| *p).collect();
        let benchmark_values: Vec<f64> = joined.iter().map(|(_, _, b)| *b).collect();
        let portfolio_cumulative = cumulative_returns(&portfolio_values);
        let benchmark_cumulative = cumulative_returns(&benchmark_values);

        debug!(symbol, rows = joined.len(), "merged benchmark");

        Ok(joined
            .iter()
            .enumerate()
            .map(|(i, (date, period_return, benchmark_return))| PortfolioReturnPoint {
                date: *date,
                period_return: *period_return,
                cumulative_return: portfolio_cumulative[i],
                benchmark_return: *benchmark_return,
                benchmark_cumulative_return: benchmark_cumulative[i],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sentfolio_traits::PriceSeries;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    struct Index(Vec<(Date, f64)>);

    impl PriceSource for Index {
        fn name(&self) -> &str {
            "index"
        }

        fn load(&self, symbol: &str) -> Result<PriceSeries> {
            if symbol == "QQQ" {
                Ok(PriceSeries::new(symbol, self.0.clone()))
            } else {
                Err(SentfolioError::PriceData(format!("{symbol} missing")))
            }
        }
    }

    fn period(date: Date, r: f64) -> PeriodReturn {
        PeriodReturn {
            date,
            portfolio_return: r,
        }
    }

    #[test]
    fn test_inner_join_and_cumulative() {
        let index = Index(vec![
            (d(2021, 2, 1), 100.0),
            (d(2021, 2, 2), 102.0),
            (d(2021, 2, 3), 101.0),
        ]);
        let portfolio = [
            period(d(2021, 2, 2), 0.01),
            period(d(2021, 2, 3), 0.02),
            period(d(2021, 2, 4), 0.03),
        ];

        let rows = BenchmarkMerger
            .merge(&portfolio, &index, "QQQ", d(2021, 2, 1), d(2021, 2, 28))
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2021, 2, 2));
        assert_abs_diff_eq!(rows[0].benchmark_return, 1.02_f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(rows[0].cumulative_return, 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(rows[1].cumulative_return, 1.01 * 1.02 - 1.0, epsilon = 1e-12);

        let bench_1 = 1.02_f64.ln();
        let bench_2 = (101.0_f64 / 102.0).ln();
        assert_abs_diff_eq!(
            rows[1].benchmark_cumulative_return,
            (1.0 + bench_1) * (1.0 + bench_2) - 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_nan_portfolio_day_keeps_row() {
        let index = Index(vec![(d(2021, 2, 1), 100.0), (d(2021, 2, 2), 101.0), (d(2021, 2, 3), 102.0)]);
        let portfolio = [period(d(2021, 2, 2), f64::NAN), period(d(2021, 2, 3), 0.05)];

        let rows = BenchmarkMerger
            .merge(&portfolio, &index, "QQQ", d(2021, 2, 1), d(2021, 2, 28))
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].cumulative_return.is_nan());
        assert_abs_diff_eq!(rows[1].cumulative_return, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_benchmark_is_benchmark_error() {
        let index = Index(vec![]);
        let err = BenchmarkMerger
            .merge(&[], &index, "SPY", d(2021, 2, 1), d(2021, 2, 28))
            .unwrap_err();
        assert!(matches!(err, SentfolioError::BenchmarkData(_)));
    }

    #[test]
    fn test_benchmark_outside_range_is_benchmark_error() {
        let index = Index(vec![(d(2019, 1, 2), 100.0), (d(2019, 1, 3), 101.0)]);
        let err = BenchmarkMerger
            .merge(&[], &index, "QQQ", d(2021, 2, 1), d(2021, 2, 28))
            .unwrap_err();
        assert!(matches!(err, SentfolioError::BenchmarkData(_)));
    }
}

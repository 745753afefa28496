//! CSV-backed price source.
//!
//! Each symbol lives in its own `{dir}/{SYMBOL}.csv`. Files carry three
//! preamble rows (field names, ticker labels and an index label) followed by
//! `Date,Close,High,Low,Open,Volume` rows. Columns are read by position;
//! return computations only need the first two.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentfolio_traits::types::parse_date;
use sentfolio_traits::{Date, PriceSeries, PriceSource, Result, SentfolioError};

const PREAMBLE_ROWS: usize = 3;

/// One daily row of a price file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading day.
    pub date: Date,
    /// Opening price.
    pub open: Option<f64>,
    /// Daily high.
    pub high: Option<f64>,
    /// Daily low.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Shares traded.
    pub volume: Option<i64>,
}

/// A directory of per-symbol price CSV files.
#[derive(Debug, Clone)]
pub struct CsvPriceDirectory {
    dir: PathBuf,
    label: String,
}

impl CsvPriceDirectory {
    /// Create a source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let label = format!("csv:{}", dir.display());
        Self { dir, label }
    }

    /// The directory prices are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Daily bars of `symbol` between `start` and `end`, both inclusive, in
    /// date order.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::InvalidDate`] if `start` is after `end`,
    /// [`SentfolioError::PriceData`] if the file cannot be read and
    /// [`SentfolioError::DataFormat`] if it cannot be parsed.
    pub fn history(&self, symbol: &str, start: Date, end: Date) -> Result<Vec<PriceBar>> {
        if start > end {
            return Err(SentfolioError::InvalidDate(format!(
                "start {start} is after end {end}"
            )));
        }
        let bytes = self.read(symbol)?;
        let mut bars = parse_price_bars(symbol, &bytes)?;
        bars.retain(|bar| bar.date >= start && bar.date <= end);
        bars.sort_by_key(|bar| bar.date);
        debug!(symbol, %start, %end, rows = bars.len(), "price history");
        Ok(bars)
    }

    fn read(&self, symbol: &str) -> Result<Vec<u8>> {
        let path = self.path_for(symbol);
        debug!(symbol, path = %path.display(), "loading price file");
        std::fs::read(&path).map_err(|e| {
            SentfolioError::PriceData(format!("cannot read {}: {e}", path.display()))
        })
    }
}

impl PriceSource for CsvPriceDirectory {
    fn name(&self) -> &str {
        &self.label
    }

    fn load(&self, symbol: &str) -> Result<PriceSeries> {
        let bytes = self.read(symbol)?;
        parse_price_csv(symbol, &bytes)
    }
}

/// Parse price file content into a close-price series.
///
/// Rows with an empty date are skipped; an empty close becomes NaN.
///
/// # Errors
///
/// Returns [`SentfolioError::DataFormat`] if the content is not CSV, has
/// fewer than two columns, or contains an unparsable date.
pub fn parse_price_csv(symbol: &str, bytes: &[u8]) -> Result<PriceSeries> {
    let df = read_rows(symbol, bytes)?;
    let (Some(dates), Some(closes)) = (df.select_at_idx(0), df.select_at_idx(1)) else {
        return Err(SentfolioError::DataFormat(format!(
            "{symbol}: price file needs date and close columns"
        )));
    };

    let dates = dates.as_materialized_series().cast(&DataType::String)?;
    let closes = closes.as_materialized_series().cast(&DataType::Float64)?;

    let mut points = Vec::with_capacity(df.height());
    for (date, close) in dates.str()?.into_iter().zip(closes.f64()?.into_iter()) {
        let Some(date) = date.filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        points.push((parse_price_date(symbol, date)?, close.unwrap_or(f64::NAN)));
    }

    Ok(PriceSeries::new(symbol, points))
}

/// Parse price file content into full daily bars.
///
/// Rows with an empty date are skipped; empty fields become `None`.
///
/// # Errors
///
/// Returns [`SentfolioError::DataFormat`] if the content is not CSV, has
/// fewer than six columns, or contains an unparsable date.
pub fn parse_price_bars(symbol: &str, bytes: &[u8]) -> Result<Vec<PriceBar>> {
    let df = read_rows(symbol, bytes)?;
    if df.width() < 6 {
        return Err(SentfolioError::DataFormat(format!(
            "{symbol}: price file needs Date,Close,High,Low,Open,Volume columns"
        )));
    }

    let column = |idx: usize, dtype: &DataType| -> Result<Series> {
        let col = df.select_at_idx(idx).ok_or_else(|| {
            SentfolioError::DataFormat(format!("{symbol}: missing column {idx}"))
        })?;
        Ok(col.as_materialized_series().cast(dtype)?)
    };
    let dates = column(0, &DataType::String)?;
    let close = column(1, &DataType::Float64)?;
    let high = column(2, &DataType::Float64)?;
    let low = column(3, &DataType::Float64)?;
    let open = column(4, &DataType::Float64)?;
    let volume = column(5, &DataType::Int64)?;

    let (close, high, low, open, volume) =
        (close.f64()?, high.f64()?, low.f64()?, open.f64()?, volume.i64()?);

    let mut bars = Vec::with_capacity(df.height());
    for (i, date) in dates.str()?.into_iter().enumerate() {
        let Some(date) = date.filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        bars.push(PriceBar {
            date: parse_price_date(symbol, date)?,
            open: open.get(i),
            high: high.get(i),
            low: low.get(i),
            close: close.get(i),
            volume: volume.get(i),
        });
    }
    Ok(bars)
}

fn read_rows(symbol: &str, bytes: &[u8]) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(false)
        .with_skip_rows(PREAMBLE_ROWS)
        .with_infer_schema_length(Some(10_000))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| SentfolioError::DataFormat(format!("{symbol}: invalid price CSV: {e}")))
}

/// Accepts `YYYY-MM-DD` optionally followed by a time component.
fn parse_price_date(symbol: &str, value: &str) -> Result<Date> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    parse_date(day).map_err(|e| SentfolioError::DataFormat(format!("{symbol}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    const GME: &str = "\
Price,Close,High,Low,Open,Volume
Ticker,GME,GME,GME,GME,GME
Date,,,,,
2021-02-01,225.0,322.0,212.0,316.5,37382200
2021-02-02,90.0,158.0,74.2,140.8,78183100
2021-02-03,92.41,113.4,85.25,112.01,42698500
";

    #[test]
    fn test_parse_skips_preamble() {
        let series = parse_price_csv("GME", GME.as_bytes()).unwrap();
        assert_eq!(series.symbol(), "GME");
        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[0].0, d(2021, 2, 1));
        assert_abs_diff_eq!(series.points()[2].1, 92.41, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_timestamped_dates_and_blank_close() {
        let content = "\
Price,Close,High,Low,Open,Volume
Ticker,AMC,AMC,AMC,AMC,AMC
Date,,,,,
2021-02-01 00:00:00-05:00,13.26,16.65,12.0,15.2,300000
2021-02-02 00:00:00-05:00,,9.9,7.0,9.5,200000
";
        let series = parse_price_csv("AMC", content.as_bytes()).unwrap();
        assert_eq!(series.points()[1].0, d(2021, 2, 2));
        assert!(series.points()[1].1.is_nan());
        assert!(series.has_prices());
    }

    #[test]
    fn test_bad_date_is_a_format_error() {
        let content = "\
a,b
c,d
e,f
yesterday,10.0
";
        let err = parse_price_csv("BAD", content.as_bytes()).unwrap_err();
        assert!(matches!(err, SentfolioError::DataFormat(_)));
    }

    #[test]
    fn test_parse_bars_reads_columns_by_position() {
        let bars = parse_price_bars("GME", GME.as_bytes()).unwrap();
        assert_eq!(bars.len(), 3);
        let bar = bars[1];
        assert_eq!(bar.date, d(2021, 2, 2));
        assert_eq!(bar.close, Some(90.0));
        assert_eq!(bar.high, Some(158.0));
        assert_eq!(bar.low, Some(74.2));
        assert_eq!(bar.open, Some(140.8));
        assert_eq!(bar.volume, Some(78_183_100));
    }

    #[test]
    fn test_parse_bars_needs_six_columns() {
        let content = "a,b\nc,d\ne,f\n2021-02-01,10.0\n";
        let err = parse_price_bars("THIN", content.as_bytes()).unwrap_err();
        assert!(matches!(err, SentfolioError::DataFormat(_)));
    }

    #[test]
    fn test_history_restricts_to_range() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("GME.csv"), GME).unwrap();
        let source = CsvPriceDirectory::new(dir.path());

        let bars = source.history("GME", d(2021, 2, 2), d(2021, 2, 10)).unwrap();
        let dates: Vec<Date> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![d(2021, 2, 2), d(2021, 2, 3)]);

        assert!(source.history("GME", d(2021, 3, 1), d(2021, 3, 31)).unwrap().is_empty());

        let err = source.history("GME", d(2021, 2, 3), d(2021, 2, 1)).unwrap_err();
        assert!(matches!(err, SentfolioError::InvalidDate(_)));
        assert!(err.is_client_error());

        let err = source.history("NOPE", d(2021, 2, 1), d(2021, 2, 3)).unwrap_err();
        assert!(matches!(err, SentfolioError::PriceData(_)));
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("GME.csv"), GME).unwrap();
        let source = CsvPriceDirectory::new(dir.path());

        let series = source.load("GME").unwrap();
        assert_eq!(series.len(), 3);
        assert!(source.name().starts_with("csv:"));

        let err = source.load("NOPE").unwrap_err();
        assert!(matches!(err, SentfolioError::PriceData(_)));
    }
}

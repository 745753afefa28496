//! Sentiment table loading and normalization.
//!
//! Raw per-post rows (title, score, comment count, body, date, ticker and
//! sentiment scores) are parsed once into an immutable [`SentimentTable`]
//! indexed by date. The table carries a content hash of the source bytes so
//! cache keys change whenever the underlying data changes.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use sentfolio_traits::types::{month_end, month_start, parse_date};
use sentfolio_traits::{Date, Indicator, Result, SentfolioError, Symbol};

/// Column holding the post date.
const DATE_COLUMN: &str = "date";
/// Column names accepted for the ticker, in order of preference.
const TICKER_COLUMNS: [&str; 2] = ["stock", "ticker"];
/// Column names accepted for the comment count, in order of preference.
const COMMENT_COLUMNS: [&str; 2] = ["comms_num", "comment_count"];

/// One normalized post mentioning a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// Calendar date of the post.
    pub date: Date,
    /// Ticker mentioned by the post.
    pub ticker: Symbol,
    /// Post score, floored at 1.
    pub score: f64,
    /// Number of comments on the post.
    pub comment_count: f64,
    /// Sentiment of the title, when the source provides it.
    pub title_sentiment: Option<f64>,
    /// Sentiment of the body, when the source provides it.
    pub body_sentiment: Option<f64>,
    /// Title plus body sentiment, or the source's own total.
    pub total_sentiment: f64,
    /// Comments per unit of score.
    pub engagement_ratio: f64,
}

impl SentimentRecord {
    /// Value of `indicator` for this post.
    #[must_use]
    pub const fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::EngagementRatio => self.engagement_ratio,
            Indicator::TotalSentiment => self.total_sentiment,
            Indicator::CommsNum => self.comment_count,
            Indicator::Score => self.score,
        }
    }
}

/// Immutable, queryable sentiment table.
///
/// Records keep their input order; the date index only narrows lookups.
#[derive(Debug, Clone)]
pub struct SentimentTable {
    records: Vec<SentimentRecord>,
    by_date: BTreeMap<Date, Vec<usize>>,
    content_hash: String,
    sentiment_defaulted: bool,
}

impl SentimentTable {
    /// Build a table from already-normalized records.
    pub fn from_records(records: Vec<SentimentRecord>, content_hash: impl Into<String>) -> Self {
        let mut by_date: BTreeMap<Date, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_date.entry(record.date).or_default().push(idx);
        }
        Self {
            records,
            by_date,
            content_hash: content_hash.into(),
            sentiment_defaulted: false,
        }
    }

    /// All records in input order.
    pub fn records(&self) -> &[SentimentRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hex SHA-256 of the source the table was parsed from.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Whether `total_sentiment` had to be defaulted to zero because the
    /// source carried no recognizable sentiment columns.
    pub const fn sentiment_defaulted(&self) -> bool {
        self.sentiment_defaulted
    }

    /// Earliest and latest record dates.
    pub fn date_range(&self) -> Option<(Date, Date)> {
        let first = self.by_date.keys().next()?;
        let last = self.by_date.keys().next_back()?;
        Some((*first, *last))
    }

    /// Distinct months (as first-of-month dates) that have records.
    pub fn months(&self) -> Vec<Date> {
        let mut months: Vec<Date> = self.by_date.keys().map(|d| month_start(*d)).collect();
        months.dedup();
        months
    }

    /// Records dated within `[start, end]`, in input order.
    pub fn records_between(&self, start: Date, end: Date) -> Vec<&SentimentRecord> {
        if start > end {
            return Vec::new();
        }
        let mut indices: Vec<usize> = self
            .by_date
            .range(start..=end)
            .flat_map(|(_, idx)| idx.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.records[i]).collect()
    }

    /// Records of the calendar month containing `month`, in input order.
    pub fn records_in_month(&self, month: Date) -> Vec<&SentimentRecord> {
        self.records_between(month_start(month), month_end(month))
    }

    /// Records for one `(date, ticker)` pair.
    pub fn records_for(&self, date: Date, ticker: &str) -> Vec<&SentimentRecord> {
        self.by_date
            .get(&date)
            .map(|idx| {
                idx.iter()
                    .map(|i| &self.records[*i])
                    .filter(|r| r.ticker == ticker)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Loader for raw sentiment CSV sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentStore;

impl SentimentStore {
    /// Load and normalize a sentiment CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::DataFormat`] if the file cannot be read, is
    /// not valid CSV, lacks a required column, or has an unparsable date.
    pub fn load(path: impl AsRef<Path>) -> Result<SentimentTable> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            SentfolioError::DataFormat(format!("cannot read {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "loading sentiment data");
        Self::load_bytes(&bytes)
    }

    /// Load and normalize sentiment CSV content held in memory.
    ///
    /// # Errors
    ///
    /// See [`SentimentStore::load`].
    pub fn load_bytes(bytes: &[u8]) -> Result<SentimentTable> {
        let content_hash = hex::encode(Sha256::digest(bytes));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| SentfolioError::DataFormat(format!("invalid sentiment CSV: {e}")))?;

        let mut table = Self::normalize(&df)?;
        table.content_hash = content_hash;
        Ok(table)
    }

    /// Normalize a raw sentiment frame into a table.
    ///
    /// Derives `total_sentiment` and `engagement_ratio` when absent, floors
    /// `score` at 1 and drops rows missing any indicator value.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::DataFormat`] on missing columns or an
    /// unparsable date.
    pub fn normalize(df: &DataFrame) -> Result<SentimentTable> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let ticker_column = first_present(&columns, &TICKER_COLUMNS)
            .ok_or_else(|| SentfolioError::DataFormat("missing ticker column 'stock'".into()))?;
        let comment_column = first_present(&columns, &COMMENT_COLUMNS)
            .ok_or_else(|| SentfolioError::DataFormat("missing column 'comms_num'".into()))?;

        let dates = date_column(df)?;
        let tickers = string_column(df, ticker_column)?;
        let scores = float_column(df, "score")?;
        let comments = float_column(df, comment_column)?;

        let title_col = find_sentiment_column(&columns, "title");
        let body_col = find_sentiment_column(&columns, "body");
        let title_sentiment = title_col.map(|c| float_column(df, c)).transpose()?;
        let body_sentiment = body_col.map(|c| float_column(df, c)).transpose()?;

        let mut sentiment_defaulted = false;
        let total_sentiment: Vec<Option<f64>> = if columns.iter().any(|c| c == "total_sentiment") {
            float_column(df, "total_sentiment")?
        } else if let (Some(title), Some(body)) = (&title_sentiment, &body_sentiment) {
            title
                .iter()
                .zip(body.iter())
                .map(|(t, b)| Some((*t)? + (*b)?))
                .collect()
        } else {
            warn!(
                ?columns,
                "could not find title/body sentiment columns, defaulting total_sentiment to 0"
            );
            sentiment_defaulted = true;
            vec![Some(0.0); df.height()]
        };

        let supplied_ratio = if columns.iter().any(|c| c == "engagement_ratio") {
            Some(float_column(df, "engagement_ratio")?)
        } else {
            None
        };

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;
        for row in 0..df.height() {
            let (Some(date), Some(ticker)) = (dates[row], tickers[row].as_ref()) else {
                dropped += 1;
                continue;
            };
            let score = scores[row].map(|s| if s < 1.0 { 1.0 } else { s });
            let comment_count = comments[row];
            let engagement_ratio = match &supplied_ratio {
                Some(ratio) => ratio[row],
                None => comment_count.zip(score).map(|(c, s)| c / s),
            };
            let values = (score, comment_count, total_sentiment[row], engagement_ratio);
            let (Some(score), Some(comment_count), Some(total), Some(ratio)) = values else {
                dropped += 1;
                continue;
            };
            if ![score, comment_count, total, ratio].iter().all(|v| v.is_finite()) {
                dropped += 1;
                continue;
            }
            records.push(SentimentRecord {
                date,
                ticker: ticker.trim().to_string(),
                score,
                comment_count,
                title_sentiment: title_sentiment.as_ref().and_then(|col| col[row]),
                body_sentiment: body_sentiment.as_ref().and_then(|col| col[row]),
                total_sentiment: total,
                engagement_ratio: ratio,
            });
        }

        debug!(kept = records.len(), dropped, "normalized sentiment rows");

        let mut table = SentimentTable::from_records(records, String::new());
        table.sentiment_defaulted = sentiment_defaulted;
        Ok(table)
    }
}

fn first_present<'a>(columns: &[String], candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| columns.iter().any(|c| c == candidate))
}

/// First column whose lowercase name contains both `part` and "sentiment".
fn find_sentiment_column<'a>(columns: &'a [String], part: &str) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| {
            let lower = c.to_lowercase();
            lower.contains(part) && lower.contains("sentiment")
        })
        .map(String::as_str)
}

fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| SentfolioError::DataFormat(format!("missing column '{name}'")))
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = require(df, name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = require(df, name)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Parse the date column; nulls become `None`, malformed values are fatal.
fn date_column(df: &DataFrame) -> Result<Vec<Option<Date>>> {
    string_column(df, DATE_COLUMN)?
        .into_iter()
        .map(|value| match value {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_date(&s)
                .map(Some)
                .map_err(|e| SentfolioError::DataFormat(format!("date column: {e}"))),
        })
        .collect()
}

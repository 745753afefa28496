//! Request-level portfolio service.
//!
//! Resolves a [`PortfolioRequest`] against configured defaults, computes the
//! sentiment-ranked portfolio's returns versus a benchmark, and caches both
//! the per-month rankings and the complete result. A query spanning N months
//! only ranks the months missing from the monthly cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sentfolio_cache::{CacheKind, CacheStore, KeyedCache, monthly_key, portfolio_key};
use sentfolio_eval::{
    BenchmarkMerger, CsvPriceDirectory, PortfolioReturnPoint, PriceReturnEngine, RebalanceScheduler,
};
use sentfolio_signals::{MonthlyRanker, MonthlyRanking, RankerConfig, SentimentStore, SentimentTable};
use sentfolio_traits::types::{month_starts_between, parse_date, previous_month_start};
use sentfolio_traits::{Date, Indicator, PriceSource, Result, SentfolioError, Symbol};

use crate::config::ServiceConfig;

/// Raw request parameters; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRequest {
    /// `YYYY-MM-DD` start of the evaluation range.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD` end of the evaluation range.
    pub end_date: Option<String>,
    /// Benchmark symbol, e.g. `QQQ`.
    pub market_index: Option<String>,
    /// Indicator name used for ranking.
    pub indicator: Option<String>,
}

/// A fully resolved portfolio query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioQuery {
    /// First day of the evaluation range.
    pub start: Date,
    /// Last day of the evaluation range.
    pub end: Date,
    /// Benchmark symbol.
    pub market_index: Symbol,
    /// Ranking indicator.
    pub indicator: Indicator,
}

impl PortfolioQuery {
    /// Fill defaults from `config`, parse and clamp to the data range.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::InvalidDate`] for a malformed date or an
    /// empty range after clamping, and
    /// [`SentfolioError::UnknownIndicator`] for an unsupported indicator.
    pub fn resolve(request: &PortfolioRequest, config: &ServiceConfig) -> Result<Self> {
        let date = |value: &Option<String>, default: Date| match value.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => parse_date(s),
            _ => Ok(default),
        };
        let start = date(&request.start_date, config.default_start)?.max(config.data_start);
        let end = date(&request.end_date, config.default_end)?.min(config.data_end);

        if start > end {
            return Err(SentfolioError::InvalidDate(format!(
                "start {start} is after end {end} (data covers {} to {})",
                config.data_start, config.data_end
            )));
        }

        let market_index = request
            .market_index
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| config.default_market_index.clone());

        let indicator = match request.indicator.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse()?,
            _ => config.default_indicator,
        };

        Ok(Self {
            start,
            end,
            market_index,
            indicator,
        })
    }

    /// Months whose sentiment selects the portfolios held in the range.
    pub fn scoring_months(&self) -> Vec<Date> {
        month_starts_between(previous_month_start(self.start), previous_month_start(self.end))
    }
}

/// One dated row of the response series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRow {
    /// Trading day.
    pub date: Date,
    /// Cumulative portfolio return; `None` where undefined.
    pub portfolio_return: Option<f64>,
    /// Cumulative benchmark return; `None` where undefined.
    pub benchmark_return: Option<f64>,
    /// Portfolio log return of the day.
    pub portfolio_period_return: Option<f64>,
    /// Benchmark log return of the day.
    pub benchmark_period_return: Option<f64>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl From<&PortfolioReturnPoint> for ReturnRow {
    fn from(point: &PortfolioReturnPoint) -> Self {
        Self {
            date: point.date,
            portfolio_return: finite(point.cumulative_return),
            benchmark_return: finite(point.benchmark_cumulative_return),
            portfolio_period_return: finite(point.period_return),
            benchmark_period_return: finite(point.benchmark_return),
        }
    }
}

/// The cached payload of a computed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// Query the report answers.
    pub query: PortfolioQuery,
    /// Cumulative return series.
    pub portfolio_returns: Vec<ReturnRow>,
    /// Rebalance schedule keyed by `YYYY-MM-DD`.
    pub tickers_by_date: BTreeMap<String, Vec<Symbol>>,
    /// Scheduled tickers without usable prices.
    pub missing_tickers: Vec<Symbol>,
}

/// How the monthly rankings of a request were obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCacheStats {
    /// Months served from the monthly cache.
    pub hits: usize,
    /// Months ranked from the sentiment table.
    pub computed: usize,
}

/// Cache provenance attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Key of the portfolio result.
    pub key: String,
    /// Monthly ranking provenance; zero when the whole result was cached.
    pub monthly: MonthlyCacheStats,
    /// Content hash of the sentiment table the result is based on.
    pub table_hash: String,
}

/// Successful response of [`PortfolioService::handle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResponse {
    /// Resolved query.
    pub query: PortfolioQuery,
    /// Cumulative return series.
    pub portfolio_returns: Vec<ReturnRow>,
    /// Rebalance schedule keyed by `YYYY-MM-DD`.
    pub tickers_by_date: BTreeMap<String, Vec<Symbol>>,
    /// Scheduled tickers without usable prices.
    pub missing_tickers: Vec<Symbol>,
    /// Whether the whole result came from the portfolio cache.
    pub cached: bool,
    /// Cache provenance.
    pub cache_info: CacheInfo,
}

/// Structured error returned at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Stable error tag.
    pub kind: String,
    /// Whether the caller's input caused the error.
    pub client_error: bool,
}

impl From<&SentfolioError> for ErrorResponse {
    fn from(err: &SentfolioError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            client_error: err.is_client_error(),
        }
    }
}

/// Computes and caches sentiment-ranked portfolio performance.
///
/// # Example
///
/// ```rust,ignore
/// use sentfolio::{PortfolioRequest, PortfolioService, ServiceConfig};
///
/// let service = PortfolioService::from_config(ServiceConfig::from_env()?)?;
/// let response = service.handle(&PortfolioRequest::default());
/// ```
pub struct PortfolioService {
    config: ServiceConfig,
    table: Arc<SentimentTable>,
    prices: Arc<dyn PriceSource>,
    benchmarks: Arc<dyn PriceSource>,
    ranker: MonthlyRanker,
    monthly_cache: KeyedCache<MonthlyRanking>,
    portfolio_cache: KeyedCache<PortfolioReport>,
}

impl std::fmt::Debug for PortfolioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioService")
            .field("records", &self.table.len())
            .field("table_hash", &self.table.content_hash())
            .field("prices", &self.prices.name())
            .field("benchmarks", &self.benchmarks.name())
            .field("top_n", &self.ranker.top_n())
            .finish()
    }
}

impl PortfolioService {
    /// Assemble a service from its collaborators.
    pub fn new(
        config: ServiceConfig,
        table: Arc<SentimentTable>,
        prices: Arc<dyn PriceSource>,
        benchmarks: Arc<dyn PriceSource>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let ranker = MonthlyRanker::new(RankerConfig {
            top_n: config.top_n,
        });
        Self {
            config,
            table,
            prices,
            benchmarks,
            ranker,
            monthly_cache: KeyedCache::new(Arc::clone(&store), CacheKind::MonthlyIndicator),
            portfolio_cache: KeyedCache::new(store, CacheKind::PortfolioResult),
        }
    }

    /// Load the sentiment table and open the price directories and cache
    /// named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sentiment source cannot be loaded or the cache
    /// store cannot be opened.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let table = Arc::new(SentimentStore::load(&config.sentiment_path)?);
        let prices: Arc<dyn PriceSource> = Arc::new(CsvPriceDirectory::new(&config.price_dir));
        let benchmarks: Arc<dyn PriceSource> =
            Arc::new(CsvPriceDirectory::new(&config.benchmark_dir));
        let store = config.open_cache_store()?;
        Ok(Self::new(config, table, prices, benchmarks, store))
    }

    /// The active configuration.
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The shared sentiment table.
    pub fn table(&self) -> &SentimentTable {
        &self.table
    }

    /// Resolve raw request parameters.
    ///
    /// # Errors
    ///
    /// See [`PortfolioQuery::resolve`].
    pub fn resolve(&self, request: &PortfolioRequest) -> Result<PortfolioQuery> {
        PortfolioQuery::resolve(request, &self.config)
    }

    /// Rankings for `months`, reusing cached months and caching new ones.
    ///
    /// Cache failures are logged and the ranking is computed instead.
    pub fn monthly_rankings(
        &self,
        indicator: Indicator,
        months: &[Date],
    ) -> (Vec<MonthlyRanking>, MonthlyCacheStats) {
        let mut stats = MonthlyCacheStats::default();
        let cache_indicator = format!("{indicator}:top{}", self.ranker.top_n());

        let rankings = months
            .iter()
            .map(|month| {
                let key = monthly_key(*month, &cache_indicator, self.table.content_hash());
                match self.monthly_cache.lookup(&key) {
                    Ok(Some(ranking)) => {
                        stats.hits += 1;
                        return ranking;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(%month, error = %e, "monthly cache lookup failed"),
                }

                let ranking = self.ranker.rank(&self.table, indicator, *month);
                stats.computed += 1;
                if let Err(e) = self.monthly_cache.store(&key, &ranking) {
                    warn!(%month, error = %e, "monthly cache store failed");
                }
                ranking
            })
            .collect();

        debug!(%indicator, hits = stats.hits, computed = stats.computed, "monthly rankings");
        (rankings, stats)
    }

    /// Compute, or fetch from cache, the response for a resolved query.
    ///
    /// # Errors
    ///
    /// Returns [`SentfolioError::PriceData`] if no scheduled ticker has
    /// prices and [`SentfolioError::BenchmarkData`] if the benchmark is
    /// unavailable.
    pub fn compute(&self, query: &PortfolioQuery) -> Result<PortfolioResponse> {
        let table_hash = self.table.content_hash().to_string();
        let cache_indicator = format!("{}:top{}", query.indicator, self.ranker.top_n());
        let key = portfolio_key(
            query.start,
            query.end,
            &query.market_index,
            &cache_indicator,
            &table_hash,
        );

        match self.portfolio_cache.lookup(&key) {
            Ok(Some(report)) => {
                info!(start = %query.start, end = %query.end, indicator = %query.indicator, "portfolio served from cache");
                return Ok(Self::respond(report, true, key, MonthlyCacheStats::default(), table_hash));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "portfolio cache lookup failed"),
        }

        let (rankings, monthly) = self.monthly_rankings(query.indicator, &query.scoring_months());
        let schedule = RebalanceScheduler.schedule(&rankings)?;
        let returns =
            PriceReturnEngine.compute(self.prices.as_ref(), &schedule, query.start, query.end)?;
        let points = BenchmarkMerger.merge(
            &returns.periods,
            self.benchmarks.as_ref(),
            &query.market_index,
            query.start,
            query.end,
        )?;

        let report = PortfolioReport {
            query: query.clone(),
            portfolio_returns: points.iter().map(ReturnRow::from).collect(),
            tickers_by_date: schedule.tickers_by_date(),
            missing_tickers: returns.missing,
        };

        if let Err(e) = self.portfolio_cache.store(&key, &report) {
            warn!(error = %e, "portfolio cache store failed");
        }

        info!(
            start = %query.start,
            end = %query.end,
            indicator = %query.indicator,
            rebalances = schedule.len(),
            rows = report.portfolio_returns.len(),
            monthly_hits = monthly.hits,
            monthly_computed = monthly.computed,
            "portfolio computed"
        );
        Ok(Self::respond(report, false, key, monthly, table_hash))
    }

    /// Resolve and compute a request, converting failures to a structured
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorResponse`] for any fatal condition; no partial
    /// result is returned.
    pub fn handle(
        &self,
        request: &PortfolioRequest,
    ) -> std::result::Result<PortfolioResponse, ErrorResponse> {
        self.resolve(request)
            .and_then(|query| self.compute(&query))
            .map_err(|e| {
                warn!(kind = e.kind(), error = %e, "portfolio request failed");
                ErrorResponse::from(&e)
            })
    }

    fn respond(
        report: PortfolioReport,
        cached: bool,
        key: String,
        monthly: MonthlyCacheStats,
        table_hash: String,
    ) -> PortfolioResponse {
        PortfolioResponse {
            query: report.query,
            portfolio_returns: report.portfolio_returns,
            tickers_by_date: report.tickers_by_date,
            missing_tickers: report.missing_tickers,
            cached,
            cache_info: CacheInfo {
                key,
                monthly,
                table_hash,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn request(start: &str, end: &str) -> PortfolioRequest {
        PortfolioRequest {
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            ..PortfolioRequest::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let config = ServiceConfig::default();
        let query = PortfolioQuery::resolve(&PortfolioRequest::default(), &config).unwrap();
        assert_eq!(query.start, d(2021, 1, 28));
        assert_eq!(query.end, d(2021, 8, 2));
        assert_eq!(query.market_index, "QQQ");
        assert_eq!(query.indicator, Indicator::EngagementRatio);
    }

    #[test]
    fn test_resolve_clamps_to_data_range() {
        let config = ServiceConfig::default();
        let query = PortfolioQuery::resolve(&request("2020-01-01", "2022-01-01"), &config).unwrap();
        assert_eq!(query.start, config.data_start);
        assert_eq!(query.end, config.data_end);
    }

    #[test]
    fn test_resolve_errors() {
        let config = ServiceConfig::default();

        let err = PortfolioQuery::resolve(&request("2021-05-01", "2021-04-01"), &config).unwrap_err();
        assert!(matches!(err, SentfolioError::InvalidDate(_)));

        let err = PortfolioQuery::resolve(&request("01/05/2021", "2021-06-01"), &config).unwrap_err();
        assert!(matches!(err, SentfolioError::InvalidDate(_)));

        let bad_indicator = PortfolioRequest {
            indicator: Some("hype".to_string()),
            ..PortfolioRequest::default()
        };
        let err = PortfolioQuery::resolve(&bad_indicator, &config).unwrap_err();
        assert!(matches!(err, SentfolioError::UnknownIndicator(_)));
        assert!(ErrorResponse::from(&err).client_error);
    }

    #[test]
    fn test_resolve_normalizes_market_index() {
        let config = ServiceConfig::default();
        let req = PortfolioRequest {
            market_index: Some(" spy ".to_string()),
            indicator: Some("total_sentiment".to_string()),
            ..PortfolioRequest::default()
        };
        let query = PortfolioQuery::resolve(&req, &config).unwrap();
        assert_eq!(query.market_index, "SPY");
        assert_eq!(query.indicator, Indicator::TotalSentiment);
    }

    #[test]
    fn test_scoring_months_lag_by_one() {
        let config = ServiceConfig::default();
        let query = PortfolioQuery::resolve(&request("2021-02-10", "2021-04-20"), &config).unwrap();
        assert_eq!(
            query.scoring_months(),
            vec![d(2021, 1, 1), d(2021, 2, 1), d(2021, 3, 1)]
        );
    }

    #[test]
    fn test_return_row_maps_nan_to_none() {
        let point = PortfolioReturnPoint {
            date: d(2021, 2, 2),
            period_return: f64::NAN,
            cumulative_return: f64::NAN,
            benchmark_return: 0.01,
            benchmark_cumulative_return: 0.01,
        };
        let row = ReturnRow::from(&point);
        assert_eq!(row.portfolio_return, None);
        assert_eq!(row.benchmark_return, Some(0.01));

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"portfolio_return\":null"));
    }
}

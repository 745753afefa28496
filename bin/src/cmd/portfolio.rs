//! Portfolio command implementation.

use anyhow::{Result, bail};
use sentfolio::{PortfolioRequest, PortfolioResponse, PortfolioService, ServiceConfig};

use crate::OutputFormat;

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

/// Compute portfolio returns and print them.
pub(crate) fn show_portfolio(
    config: ServiceConfig,
    start: Option<String>,
    end: Option<String>,
    market_index: Option<String>,
    indicator: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let service = PortfolioService::from_config(config)?;
    let request = PortfolioRequest {
        start_date: start,
        end_date: end,
        market_index,
        indicator,
    };

    let result = service.handle(&request);

    if format == OutputFormat::Json {
        let json = match &result {
            Ok(response) => serde_json::to_string_pretty(response)?,
            Err(err) => serde_json::to_string_pretty(err)?,
        };
        println!("{}", json);
        if let Err(err) = result {
            bail!("{} ({})", err.error, err.kind);
        }
        return Ok(());
    }

    match result {
        Ok(response) => {
            print_report(&response);
            Ok(())
        }
        Err(err) => bail!("{} ({})", err.error, err.kind),
    }
}

fn print_report(response: &PortfolioResponse) {
    let query = &response.query;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Portfolio Performance                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Indicator: {}", query.indicator);
    println!("Benchmark: {}", query.market_index);
    println!("Period:    {} to {}", query.start, query.end);
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("REBALANCE SCHEDULE");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    for (date, tickers) in &response.tickers_by_date {
        println!("{:<12} {}", date, tickers.join(", "));
    }
    if !response.missing_tickers.is_empty() {
        println!();
        println!("No price data: {}", response.missing_tickers.join(", "));
    }
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("CUMULATIVE RETURNS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!(
        "{:<12} {:>12} {:>12} {:>12}",
        "Date", "Portfolio", query.market_index, "Excess"
    );
    println!("{}", "─".repeat(51));
    for row in &response.portfolio_returns {
        let excess = row
            .portfolio_return
            .zip(row.benchmark_return)
            .map(|(p, b)| p - b);
        println!(
            "{:<12} {:>12} {:>12} {:>12}",
            row.date.to_string(),
            pct(row.portfolio_return),
            pct(row.benchmark_return),
            pct(excess)
        );
    }
    println!();

    if let Some(last) = response.portfolio_returns.last() {
        println!("Final portfolio return: {}", pct(last.portfolio_return));
        println!("Final {} return:       {}", query.market_index, pct(last.benchmark_return));
        println!();
    }

    let info = &response.cache_info;
    if response.cached {
        println!("Served from portfolio cache (key {})", info.key);
    } else {
        println!(
            "Computed (key {}); monthly rankings: {} cached, {} computed",
            info.key, info.monthly.hits, info.monthly.computed
        );
    }
    println!();
}

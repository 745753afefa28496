//! Rank command implementation.

use anyhow::{Result, anyhow};
use sentfolio::traits::types::{month_starts_between, parse_date};
use sentfolio::{Indicator, PortfolioService, ServiceConfig};

/// Print the top tickers of each month between `start` and `end`.
pub(crate) fn show_rankings(
    config: ServiceConfig,
    indicator: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let indicator: Indicator = match indicator {
        Some(name) => name.parse()?,
        None => config.default_indicator,
    };
    let top_n = config.top_n;
    let service = PortfolioService::from_config(config)?;

    let (first, last) = service
        .table()
        .date_range()
        .ok_or_else(|| anyhow!("sentiment table is empty"))?;
    let start = start.map(parse_date).transpose()?.unwrap_or(first);
    let end = end.map(parse_date).transpose()?.unwrap_or(last);

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Monthly Rankings                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Indicator: {}", indicator);
    println!("Top N:     {}", top_n);
    println!("Months:    {} to {}", start, end);
    println!();

    let months = month_starts_between(start, end);
    let (rankings, stats) = service.monthly_rankings(indicator, &months);

    for ranking in &rankings {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("{}", ranking.month.format("%B %Y"));
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        if ranking.is_empty() {
            println!("No sentiment data.\n");
            continue;
        }

        println!("{:<6} {:<10} {:>14}", "Rank", "Ticker", indicator.as_str());
        println!("{}", "─".repeat(32));
        for score in &ranking.scores {
            println!("{:<6} {:<10} {:>14.4}", score.rank, score.ticker, score.value);
        }
        println!();
    }

    println!(
        "Monthly cache: {} hit(s), {} computed",
        stats.hits, stats.computed
    );
    Ok(())
}

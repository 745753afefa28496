//! Prices command implementation.

use anyhow::Result;
use sentfolio::ServiceConfig;
use sentfolio::eval::CsvPriceDirectory;
use sentfolio::traits::types::parse_date;

use crate::OutputFormat;

fn price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Print the daily bars of `ticker` between `start` and `end`.
pub(crate) fn show_prices(
    config: &ServiceConfig,
    ticker: &str,
    start: &str,
    end: &str,
    index: bool,
    format: OutputFormat,
) -> Result<()> {
    let ticker = ticker.trim().to_uppercase();
    let start = parse_date(start)?;
    let end = parse_date(end)?;

    let dir = if index {
        &config.benchmark_dir
    } else {
        &config.price_dir
    };
    let bars = CsvPriceDirectory::new(dir).history(&ticker, start, end)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&bars)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                        Price History                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Ticker: {}", ticker);
    println!("Period: {} to {}", start, end);
    println!();

    if bars.is_empty() {
        println!("No prices in range.");
        return Ok(());
    }

    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>14}",
        "Date", "Open", "High", "Low", "Close", "Volume"
    );
    println!("{}", "─".repeat(71));
    for bar in &bars {
        println!(
            "{:<12} {:>10} {:>10} {:>10} {:>10} {:>14}",
            bar.date.to_string(),
            price(bar.open),
            price(bar.high),
            price(bar.low),
            price(bar.close),
            bar.volume.map_or_else(|| "-".to_string(), |v| v.to_string())
        );
    }
    println!();
    println!("{} row(s)", bars.len());

    Ok(())
}

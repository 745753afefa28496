//! News command implementation.

use anyhow::Result;
use sentfolio::{NewsService, ServiceConfig};

use crate::OutputFormat;

/// Fetch and print the latest articles for `tickers`.
pub(crate) async fn show_news(
    config: ServiceConfig,
    tickers: &[String],
    format: OutputFormat,
) -> Result<()> {
    let service = NewsService::from_config(&config)?;
    let report = service.latest(tickers).await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                         Latest News                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Tickers: {}", report.tickers.join(", "));
    println!(
        "Results: {} total{}",
        report.total_results,
        if report.cached { " (cached)" } else { "" }
    );
    println!();

    if report.articles.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    for article in &report.articles {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("{}", article.title);
        match article.published_at {
            Some(at) => println!("{} | {}", article.source, at.format("%Y-%m-%d %H:%M UTC")),
            None => println!("{}", article.source),
        }
        if let Some(description) = &article.description {
            println!();
            println!("{}", description);
        }
        println!();
        println!("{}", article.url);
        println!();
    }

    Ok(())
}

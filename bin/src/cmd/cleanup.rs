//! Cleanup command implementation.

use anyhow::Result;
use chrono::{Duration, Utc};
use sentfolio::ServiceConfig;
use sentfolio::cache::sweep_at;

use crate::CacheTarget;

/// Delete cache entries created more than `days` days ago.
pub(crate) fn cleanup_cache(
    config: &ServiceConfig,
    days: u32,
    dry_run: bool,
    target: CacheTarget,
) -> Result<()> {
    let store = config.open_cache_store()?;
    let max_age = Duration::days(i64::from(days));
    let now = Utc::now();

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                        Cache Cleanup                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    if dry_run {
        println!("DRY RUN: nothing will be deleted\n");
    }

    let mut total = 0;
    for kind in target.kinds() {
        let report = sweep_at(store.as_ref(), kind, max_age, dry_run, now)?;
        total += report.matched;

        if report.matched == 0 {
            println!("No entries older than {} days in {} cache", days, kind);
            continue;
        }

        if dry_run {
            println!("Would delete {} entries from {} cache:", report.matched, kind);
            for entry in &report.entries {
                println!(
                    "  {}  created {}  expires {}",
                    entry.key,
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.expires_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        } else {
            println!("Deleted {} entries from {} cache", report.deleted, kind);
        }
    }

    println!();
    println!(
        "{} {} entries in total",
        if dry_run { "Matched" } else { "Deleted" },
        total
    );
    Ok(())
}

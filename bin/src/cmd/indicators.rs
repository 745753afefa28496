//! Indicators command implementation.

use sentfolio::signals::available_indicators;

/// List all available ranking indicators.
pub(crate) fn list_indicators(verbose: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Available Indicators                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let indicators = available_indicators();

    if verbose {
        for info in &indicators {
            println!("{} ({})", info.label, info.name());
            println!("  {}", info.description);
            println!();
        }
    } else {
        println!("{:<20} {}", "Name", "Label");
        println!("{}", "─".repeat(48));
        for info in &indicators {
            println!("{:<20} {}", info.name(), info.label);
        }
        println!();
        println!("Use --verbose for descriptions.");
    }

    println!("Pass a name to `sentfolio portfolio --indicator <name>`.");
}

//! Config validation command
//!
//! Loads a settings file and reports the flags it defines.

use crate::error::CliResult;
use colored::Colorize;
use flagvault_config::Settings;
use flagvault_rollout::FeatureFlag;
use std::path::Path;

/// Validate a settings file
pub fn validate(file: &Path) -> CliResult<()> {
    println!();
    println!("  {} {}", "⚙️  Validating".bright_cyan().bold(), file.display());
    println!();

    let settings = Settings::from_file(file)?;

    if settings.flags.is_empty() {
        println!("  {} No flags defined", "⚠️ ".yellow());
    } else {
        println!("  Found {} flag(s)", settings.flags.len());
        println!();
        for flag in &settings.flags {
            println!("    {}", describe(flag));
        }
    }

    println!();
    println!(
        "  {:<12} {} subjects ({}…), {} workers",
        "simulation".dimmed(),
        settings.simulation.population,
        settings.simulation.prefix,
        settings.simulation.workers
    );
    println!(
        "  {:<12} {} requests, batches of {}, {}ms pause",
        "load test".dimmed(),
        settings.load_test.requests,
        settings.load_test.batch_size,
        settings.load_test.pause_ms
    );
    println!();
    println!("  {} Configuration is valid", "✅".green());
    println!();

    Ok(())
}

fn describe(flag: &FeatureFlag) -> String {
    let state = match (&flag.rollout, flag.enabled) {
        (_, false) => "off".red().to_string(),
        (None, true) => "on".green().to_string(),
        (Some(rollout), true) => format!(
            "{}% (seed {:?})",
            rollout.percentage.to_string().green(),
            rollout.seed
        ),
    };

    match flag.description {
        Some(ref description) => format!("{:<24} {}  {}", flag.key, state, description.dimmed()),
        None => format!("{:<24} {}", flag.key, state),
    }
}

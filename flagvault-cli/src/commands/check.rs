//! Single rollout decision
//!
//! Explains where a subject lands in a rollout: digest, bucket, threshold,
//! and the smallest percentage that would enroll it.

use crate::error::CliResult;
use colored::Colorize;
use flagvault_rollout::{RESOLUTION, RolloutBucketer, RolloutDecision};

pub fn run(subject: &str, flag: &str, seed: &str, percentage: f64, json: bool) -> CliResult<()> {
    let decision = RolloutBucketer::new().explain(subject, flag, seed, percentage)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&decision);
    }

    Ok(())
}

fn print_decision(decision: &RolloutDecision) {
    println!();
    println!("  {}", "Rollout check".bright_cyan().bold());
    println!();
    println!("  {:<11} {}", "subject".dimmed(), decision.subject_id);
    println!("  {:<11} {}", "flag".dimmed(), decision.flag_key);
    println!("  {:<11} {:?}", "seed".dimmed(), decision.seed);
    println!("  {:<11} {}", "digest".dimmed(), decision.digest);
    println!(
        "  {:<11} {} / {}",
        "bucket".dimmed(),
        decision.bucket.to_string().bold(),
        RESOLUTION
    );
    println!(
        "  {:<11} {} ({:.2}%)",
        "threshold".dimmed(),
        decision.threshold.value(),
        decision.threshold.as_percentage()
    );
    println!();

    if decision.included {
        println!("  {} {}", "✓".green().bold(), "included".green().bold());
    } else {
        println!(
            "  {} {} (enrolled from {:.2}%)",
            "✗".red().bold(),
            "excluded".red().bold(),
            decision.bucket.min_percentage()
        );
    }
    println!();
}

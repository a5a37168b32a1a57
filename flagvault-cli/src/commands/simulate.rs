//! Population simulation
//!
//! Evaluates a rollout over a synthetic population and reports the enabled
//! share, optionally as a membership grid and against a second flag.

use crate::error::{CliError, CliResult};
use colored::Colorize;
use flagvault_config::Settings;
use flagvault_rollout::{Population, Rollout, SimulationReport, correlation, simulate_parallel};
use serde::Serialize;
use std::path::Path;

/// Options for `flagvault simulate`.
///
/// Unset population knobs fall back to the `[simulation]` settings.
pub struct SimulateOptions<'a> {
    pub flag: &'a str,
    pub seed: &'a str,
    pub percentage: f64,
    pub config: Option<&'a Path>,
    pub population: Option<usize>,
    pub prefix: Option<&'a str>,
    pub workers: Option<usize>,
    pub grid: bool,
    pub grid_width: Option<usize>,
    pub compare_flag: Option<&'a str>,
    pub json: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    flag_key: &'a str,
    seed: &'a str,
    percentage: f64,
    population: usize,
    enabled: usize,
    enabled_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison<'a>>,
}

#[derive(Serialize)]
struct Comparison<'a> {
    flag_key: &'a str,
    enabled: usize,
    both_enabled: usize,
    correlation: Option<f64>,
}

pub async fn run(options: SimulateOptions<'_>) -> CliResult<()> {
    let defaults = Settings::load(options.config)?.simulation;

    let size = options.population.unwrap_or(defaults.population);
    if size == 0 {
        return Err(CliError::InvalidArgument(
            "population must be greater than zero".to_string(),
        ));
    }
    let prefix = options.prefix.unwrap_or(&defaults.prefix);
    let workers = options.workers.unwrap_or(defaults.workers);
    let grid_width = options.grid_width.unwrap_or(defaults.grid_width);

    let population = Population::sequential(prefix, size);
    let rollout = Rollout::new(options.percentage, options.seed);
    let report = simulate_parallel(&population, options.flag, &rollout, workers).await?;

    let other = match options.compare_flag {
        Some(other_flag) => {
            Some(simulate_parallel(&population, other_flag, &rollout, workers).await?)
        }
        None => None,
    };

    let summary = Summary {
        flag_key: &report.flag_key,
        seed: &report.seed,
        percentage: report.percentage,
        population: report.total(),
        enabled: report.enabled(),
        enabled_percentage: report.enabled_percentage(),
        comparison: other.as_ref().map(|other| compare(&report, other)),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary, &population);
    if options.grid {
        print_grid(&report, grid_width);
    }

    Ok(())
}

fn compare<'a>(report: &SimulationReport, other: &'a SimulationReport) -> Comparison<'a> {
    let both_enabled = report
        .membership
        .iter()
        .zip(&other.membership)
        .filter(|(a, b)| **a && **b)
        .count();

    Comparison {
        flag_key: &other.flag_key,
        enabled: other.enabled(),
        both_enabled,
        correlation: correlation(&report.membership, &other.membership),
    }
}

fn print_summary(summary: &Summary<'_>, population: &Population) {
    let first = population.get(0).unwrap_or_default();
    let last = population.get(population.len().saturating_sub(1)).unwrap_or_default();

    println!();
    println!("  {}", "Rollout simulation".bright_cyan().bold());
    println!();
    println!("  {:<12} {}", "flag".dimmed(), summary.flag_key);
    println!("  {:<12} {:?}", "seed".dimmed(), summary.seed);
    println!("  {:<12} {}..{} ({})", "subjects".dimmed(), first, last, summary.population);
    println!("  {:<12} {:.2}%", "target".dimmed(), summary.percentage);
    println!(
        "  {:<12} {} ({:.2}%)",
        "enabled".dimmed(),
        summary.enabled.to_string().green().bold(),
        summary.enabled_percentage
    );

    if let Some(ref comparison) = summary.comparison {
        println!();
        println!("  {} {}", "Compared with".bright_cyan(), comparison.flag_key.bold());
        println!("  {:<12} {}", "enabled".dimmed(), comparison.enabled);
        println!("  {:<12} {}", "both".dimmed(), comparison.both_enabled);
        match comparison.correlation {
            Some(r) => println!("  {:<12} {:+.4}", "correlation".dimmed(), r),
            None => println!("  {:<12} {}", "correlation".dimmed(), "undefined".yellow()),
        }
    }
    println!();
}

fn print_grid(report: &SimulationReport, width: usize) {
    for row in report.rows(width) {
        let line: String = row.iter().map(|enabled| if *enabled { '█' } else { '·' }).collect();
        println!("  {}", line.green());
    }
    println!();
}

//! FlagVault CLI - inspect and simulate deterministic percentage rollouts.
//!
//! # Commands
//!
//! - `flagvault check <subject>` - Explain one rollout decision
//! - `flagvault eval <flag> <subject>` - Evaluate a configured flag
//! - `flagvault simulate` - Evaluate a rollout over a synthetic population
//! - `flagvault load-test <flag>` - Batched concurrent evaluations with latency stats
//! - `flagvault config validate <file>` - Validate a settings file

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use flagvault_log::{Level, LogConfig};
use std::path::PathBuf;

mod commands;
mod error;

use commands::{check, config, eval, load_test, simulate};
use error::CliResult;

/// FlagVault CLI - Deterministic Rollout Tools
#[derive(Parser)]
#[command(name = "flagvault")]
#[command(version)]
#[command(about = "🎯 Check, simulate and load-test deterministic percentage rollouts")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} flagvault check user-42 --flag new-checkout --seed exp-2024 --percentage 25\n  {} flagvault simulate --flag new-checkout --seed exp-2024 --percentage 25 --grid\n  {} flagvault eval new-checkout user-42 --config flags.toml",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain whether a subject is inside a rollout
    #[command(alias = "c")]
    Check(CheckArgs),

    /// Evaluate a flag from a settings file
    #[command(alias = "e")]
    Eval(EvalArgs),

    /// Simulate a rollout over a synthetic population
    #[command(alias = "s", visible_alias = "sim")]
    Simulate(SimulateArgs),

    /// Run batched concurrent evaluations and report latency
    LoadTest(LoadTestArgs),

    /// Validate settings files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

// =============================================================================
// CHECK ARGS
// =============================================================================

#[derive(Args)]
struct CheckArgs {
    /// Subject identifier (user, account, device)
    subject: String,

    /// Flag key
    #[arg(short, long)]
    flag: String,

    /// Rollout seed
    #[arg(short, long, default_value = "")]
    seed: String,

    /// Rollout percentage (0-100, clamped)
    #[arg(short, long, allow_negative_numbers = true)]
    percentage: f64,

    /// Print the decision as JSON
    #[arg(long)]
    json: bool,
}

// =============================================================================
// EVAL ARGS
// =============================================================================

#[derive(Args)]
struct EvalArgs {
    /// Flag key
    flag: String,

    /// Subject identifier
    subject: String,

    /// Settings file (JSON, TOML or .env)
    #[arg(short, long, env = "FLAGVAULT_CONFIG")]
    config: PathBuf,

    /// Value to report when the flag cannot be evaluated
    #[arg(long)]
    default: Option<bool>,
}

// =============================================================================
// SIMULATE ARGS
// =============================================================================

#[derive(Args)]
struct SimulateArgs {
    /// Flag key
    #[arg(short, long)]
    flag: String,

    /// Rollout seed
    #[arg(short, long, default_value = "")]
    seed: String,

    /// Rollout percentage (0-100, clamped)
    #[arg(short, long, allow_negative_numbers = true)]
    percentage: f64,

    /// Settings file supplying population defaults (JSON, TOML or .env)
    #[arg(short, long, env = "FLAGVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Number of subjects (overrides the settings file)
    #[arg(short = 'n', long)]
    population: Option<usize>,

    /// Subject id prefix (overrides the settings file)
    #[arg(long)]
    prefix: Option<String>,

    /// Parallel workers (overrides the settings file)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print the membership grid
    #[arg(long)]
    grid: bool,

    /// Cells per grid row (overrides the settings file)
    #[arg(long)]
    grid_width: Option<usize>,

    /// Second flag evaluated with the same seed and percentage
    #[arg(long)]
    compare_flag: Option<String>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

// =============================================================================
// LOAD TEST ARGS
// =============================================================================

#[derive(Args)]
struct LoadTestArgs {
    /// Flag key
    flag: String,

    /// Settings file (JSON, TOML or .env)
    #[arg(short, long, env = "FLAGVAULT_CONFIG")]
    config: PathBuf,

    /// Total evaluations (overrides the settings file)
    #[arg(short = 'n', long)]
    requests: Option<usize>,

    /// Evaluations per batch (overrides the settings file)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Pause between batches in milliseconds (overrides the settings file)
    #[arg(long)]
    pause_ms: Option<u64>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate a settings file
    Validate {
        /// File to validate
        file: PathBuf,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Handle color preferences
    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.with_level(Level::Debug);
    } else if cli.quiet {
        log_config = log_config.with_level(Level::Error);
    }
    if cli.no_color {
        log_config = log_config.with_color(false);
    }
    // A subscriber may already be installed when embedded; keep going.
    flagvault_log::init(&log_config).ok();

    let result: CliResult<()> = match cli.command {
        Commands::Check(args) => check::run(
            &args.subject,
            &args.flag,
            &args.seed,
            args.percentage,
            args.json,
        ),

        Commands::Eval(args) => {
            eval::run(&args.flag, &args.subject, &args.config, args.default).await
        }

        Commands::Simulate(args) => {
            simulate::run(simulate::SimulateOptions {
                flag: &args.flag,
                seed: &args.seed,
                percentage: args.percentage,
                config: args.config.as_deref(),
                population: args.population,
                prefix: args.prefix.as_deref(),
                workers: args.workers,
                grid: args.grid,
                grid_width: args.grid_width,
                compare_flag: args.compare_flag.as_deref(),
                json: args.json,
            })
            .await
        }

        Commands::LoadTest(args) => {
            load_test::run(load_test::LoadTestOptions {
                flag: &args.flag,
                config: &args.config,
                requests: args.requests,
                batch_size: args.batch_size,
                pause_ms: args.pause_ms,
            })
            .await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Validate { file } => config::validate(&file),
        },
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(1);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_percentage() {
        let cli = Cli::parse_from([
            "flagvault", "check", "user-1", "--flag", "f", "--percentage", "-5",
        ]);
        match cli.command {
            Commands::Check(args) => assert_eq!(args.percentage, -5.0),
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::parse_from(["flagvault", "sim", "--flag", "f", "--percentage", "25"]);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.config, None);
                assert_eq!(args.population, None);
                assert_eq!(args.prefix, None);
                assert_eq!(args.workers, None);
                assert_eq!(args.grid_width, None);
                assert_eq!(args.seed, "");
                assert!(!args.grid);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_parse_simulate_overrides() {
        let cli = Cli::parse_from([
            "flagvault", "simulate", "-f", "f", "-p", "10", "-c", "flags.toml", "-n", "500",
            "--prefix", "acct-", "-w", "2",
        ]);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.config, Some(PathBuf::from("flags.toml")));
                assert_eq!(args.population, Some(500));
                assert_eq!(args.prefix.as_deref(), Some("acct-"));
                assert_eq!(args.workers, Some(2));
            }
            _ => panic!("expected simulate"),
        }
    }
}

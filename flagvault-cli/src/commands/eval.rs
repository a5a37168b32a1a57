//! Evaluate a configured flag for one subject

use crate::error::CliResult;
use colored::Colorize;
use flagvault_config::Settings;
use flagvault_rollout::{FlagEvaluator, LocalEvaluator, Variant};
use std::path::Path;
use std::sync::Arc;

pub async fn run(flag: &str, subject: &str, config: &Path, default: Option<bool>) -> CliResult<()> {
    let settings = Settings::load(Some(config))?;
    let evaluator: Arc<dyn FlagEvaluator> = Arc::new(LocalEvaluator::with_flags(settings.flags));

    let enabled = match default {
        Some(default) => evaluator.is_enabled_or(flag, default, subject).await,
        None => evaluator.is_enabled(flag, subject).await?,
    };

    let (state, variant) = if enabled {
        ("enabled".green().bold(), Variant::Treatment)
    } else {
        ("disabled".yellow().bold(), Variant::Control)
    };

    println!("{} for {}: {} ({})", flag.bold(), subject, state, variant);
    Ok(())
}

// Typed settings for the rollout toolkit

use crate::Result;
use crate::validation::{ConfigValidator, Validate};
use flagvault_rollout::{FeatureFlag, LoadTestConfig, Population};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level settings: flag definitions plus simulation and load-test tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub flags: Vec<FeatureFlag>,
    pub simulation: SimulationSettings,
    pub load_test: LoadTestSettings,
}

impl Settings {
    /// Flag definition by key.
    pub fn flag(&self, key: &str) -> Option<&FeatureFlag> {
        self.flags.iter().find(|f| f.key == key)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        for flag in &self.flags {
            ConfigValidator::not_empty(&flag.key, "flag key")?;
            if let Some(ref rollout) = flag.rollout {
                ConfigValidator::in_range(
                    rollout.percentage,
                    0.0,
                    100.0,
                    &format!("rollout percentage of '{}'", flag.key),
                )?;
            }
        }
        ConfigValidator::unique(self.flags.iter().map(|f| f.key.as_str()), "flag key")?;

        self.simulation.validate()?;
        self.load_test.validate()
    }
}

/// Synthetic population used by `simulate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub population: usize,
    pub prefix: String,
    pub workers: usize,
    pub grid_width: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            population: 10_000,
            prefix: "user-".to_string(),
            workers: 4,
            grid_width: 100,
        }
    }
}

impl SimulationSettings {
    pub fn population(&self) -> Population {
        Population::sequential(&self.prefix, self.population)
    }
}

impl Validate for SimulationSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::positive(self.population, "simulation.population")?;
        ConfigValidator::positive(self.workers, "simulation.workers")?;
        ConfigValidator::positive(self.grid_width, "simulation.grid_width")
    }
}

/// Batching for `load-test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTestSettings {
    pub requests: usize,
    pub batch_size: usize,
    pub pause_ms: u64,
    pub timeout_ms: u64,
}

impl Default for LoadTestSettings {
    fn default() -> Self {
        Self {
            requests: 100,
            batch_size: 25,
            pause_ms: 50,
            timeout_ms: 5_000,
        }
    }
}

impl LoadTestSettings {
    pub fn to_config(&self) -> LoadTestConfig {
        LoadTestConfig::new(self.requests)
            .with_batch_size(self.batch_size)
            .with_pause(Duration::from_millis(self.pause_ms))
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

impl Validate for LoadTestSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::positive(self.batch_size, "load_test.batch_size")?;
        ConfigValidator::positive(self.timeout_ms, "load_test.timeout_ms")
    }
}

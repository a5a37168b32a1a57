//! Feature Flag Core
//!
//! Defines boolean feature flags, their rollout configuration, and
//! control/treatment assignment for experiments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bucket::{RolloutBucketer, clamp_percentage};
use crate::error::Result;

/// Boolean feature flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlag {
    /// Flag key
    pub key: String,

    /// Flag description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether flag is enabled globally
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Rollout configuration; `None` serves the flag to everyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout: Option<Rollout>,
}

fn default_enabled() -> bool {
    true
}

impl FeatureFlag {
    /// Create an enabled flag without a rollout.
    ///
    /// # Examples
    ///
    /// ```
    /// use flagvault_rollout::FeatureFlag;
    ///
    /// let flag = FeatureFlag::boolean("new-ui");
    /// assert!(flag.evaluate("user-1").unwrap());
    /// ```
    pub fn boolean(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: None,
            enabled: true,
            rollout: None,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set rollout configuration
    pub fn with_rollout(mut self, rollout: Rollout) -> Self {
        self.rollout = Some(rollout);
        self
    }

    /// Turn the flag off globally
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Evaluate the flag for a subject.
    ///
    /// A disabled flag is off for everyone and a flag without rollout is on
    /// for everyone; the subject is only validated when bucketing is needed.
    pub fn evaluate(&self, subject_id: &str) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }

        match self.rollout {
            Some(ref rollout) => rollout.includes(subject_id, &self.key),
            None => Ok(true),
        }
    }

    /// Assign a subject to an experiment arm.
    pub fn assign(&self, subject_id: &str) -> Result<Variant> {
        Ok(if self.evaluate(subject_id)? {
            Variant::Treatment
        } else {
            Variant::Control
        })
    }
}

/// Gradual rollout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rollout {
    /// Percentage (0-100, two decimal places)
    pub percentage: f64,

    /// Seed decorrelating this rollout from others over the same subjects
    #[serde(default)]
    pub seed: String,
}

impl Rollout {
    pub fn new(percentage: f64, seed: impl Into<String>) -> Self {
        Self {
            percentage: clamp_percentage(percentage),
            seed: seed.into(),
        }
    }

    /// Whether the subject is inside this rollout for `flag_key`.
    pub fn includes(&self, subject_id: &str, flag_key: &str) -> Result<bool> {
        RolloutBucketer::new().is_in_rollout(subject_id, flag_key, &self.seed, self.percentage)
    }
}

/// Experiment arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Control,
    Treatment,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Treatment => "treatment",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

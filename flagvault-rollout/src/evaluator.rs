//! Flag evaluation seam.
//!
//! [`FlagEvaluator`] is the boundary to whatever answers "is this flag on for
//! this subject": a remote SDK, a cache, or the in-memory [`LocalEvaluator`].
//! Evaluators are constructed explicitly and handed around as
//! `Arc<dyn FlagEvaluator>`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::bucket::clamp_percentage;
use crate::error::EvaluationError;
use crate::flag::{FeatureFlag, Rollout};

/// Source of flag decisions.
#[async_trait]
pub trait FlagEvaluator: Send + Sync {
    /// Evaluate a flag for a subject.
    async fn is_enabled(&self, flag_key: &str, subject_id: &str) -> Result<bool, EvaluationError>;

    /// Evaluate a flag, falling back to `default` on any error.
    async fn is_enabled_or(&self, flag_key: &str, default: bool, subject_id: &str) -> bool {
        match self.is_enabled(flag_key, subject_id).await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(flag_key, error = %e, "flag evaluation failed, using default: {}", default);
                default
            }
        }
    }
}

/// In-memory flag store evaluated with the rollout bucketer.
#[derive(Debug, Clone, Default)]
pub struct LocalEvaluator {
    flags: Arc<RwLock<HashMap<String, FeatureFlag>>>,
}

impl LocalEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator preloaded with flags. Later duplicates win.
    pub fn with_flags(flags: impl IntoIterator<Item = FeatureFlag>) -> Self {
        let map = flags
            .into_iter()
            .map(|flag| (flag.key.clone(), flag))
            .collect();

        Self {
            flags: Arc::new(RwLock::new(map)),
        }
    }

    /// Insert or replace a flag, returning the previous definition.
    pub async fn upsert(&self, flag: FeatureFlag) -> Option<FeatureFlag> {
        debug!(flag_key = %flag.key, "flag stored");
        self.flags.write().await.insert(flag.key.clone(), flag)
    }

    /// Remove a flag.
    pub async fn remove(&self, flag_key: &str) -> Option<FeatureFlag> {
        self.flags.write().await.remove(flag_key)
    }

    /// Current definition of a flag.
    pub async fn get(&self, flag_key: &str) -> Option<FeatureFlag> {
        self.flags.read().await.get(flag_key).cloned()
    }

    /// Change a flag's rollout percentage, keeping its seed.
    ///
    /// A flag without rollout gets one with an empty seed.
    pub async fn set_percentage(
        &self,
        flag_key: &str,
        percentage: f64,
    ) -> Result<(), EvaluationError> {
        let mut flags = self.flags.write().await;
        let flag = flags
            .get_mut(flag_key)
            .ok_or_else(|| EvaluationError::FlagNotFound(flag_key.to_string()))?;

        match flag.rollout {
            Some(ref mut rollout) => rollout.percentage = clamp_percentage(percentage),
            None => flag.rollout = Some(Rollout::new(percentage, "")),
        }

        debug!(flag_key, percentage, "rollout percentage updated");
        Ok(())
    }

    /// Sorted keys of all stored flags.
    pub async fn flag_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.flags.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl FlagEvaluator for LocalEvaluator {
    async fn is_enabled(&self, flag_key: &str, subject_id: &str) -> Result<bool, EvaluationError> {
        let flags = self.flags.read().await;
        let flag = flags
            .get(flag_key)
            .ok_or_else(|| EvaluationError::FlagNotFound(flag_key.to_string()))?;

        Ok(flag.evaluate(subject_id)?)
    }
}

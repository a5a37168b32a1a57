// FlagVault - deterministic percentage rollouts for feature flags
//
// A subject is hashed together with the flag key and rollout seed into one of
// 10,000 buckets; the subject is enrolled when its bucket falls below the
// rollout threshold. The same inputs always give the same answer.

// Re-export core functionality
pub use flagvault_rollout::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use flagvault_config;

#[cfg(feature = "log")]
pub use flagvault_log;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        EvaluationError,
        FeatureFlag,
        FlagEvaluator,
        LocalEvaluator,
        Population,
        Rollout,
        RolloutBucketer,
        RolloutError,
        Variant,
        is_in_rollout,
        simulate,
        simulate_parallel,
    };

    #[cfg(feature = "config")]
    pub use flagvault_config::Settings;
}

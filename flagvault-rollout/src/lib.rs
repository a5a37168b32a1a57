//! Percentage Rollouts for FlagVault
//!
//! Deterministic, uniform rollout bucketing for feature flags, plus the
//! pieces built on it: a boolean flag model, an evaluator seam with graceful
//! defaults, population simulation and load testing.
//!
//! # Features
//!
//! - 🎲 **Consistent Bucketing** - Same subject, flag and seed always land in the same bucket
//! - 📈 **Monotonic Rollouts** - Raising a percentage never drops enrolled subjects
//! - 🧪 **A/B Assignment** - Control/treatment split driven by a rollout flag
//! - 🗺️ **Simulation** - Membership of whole populations, sequential or parallel
//! - ⏱️ **Load Testing** - Batched concurrent evaluation with latency stats
//!
//! # Quick Start
//!
//! ```
//! use flagvault_rollout::is_in_rollout;
//!
//! // 10% rollout of `rollout-demo`
//! let enabled = is_in_rollout("user-00042", "rollout-demo", "seed-1", 10.0).unwrap();
//! assert!(!enabled);
//! ```
//!
//! # Flags
//!
//! ```
//! use flagvault_rollout::*;
//!
//! let flag = FeatureFlag::boolean("new-checkout")
//!     .with_rollout(Rollout::new(50.0, "exp-2024"));
//!
//! let variant = flag.assign("alice").unwrap();
//! assert_eq!(variant, Variant::Treatment);
//! ```
//!
//! # Evaluators
//!
//! ```
//! use flagvault_rollout::*;
//!
//! let evaluator = LocalEvaluator::with_flags([FeatureFlag::boolean("new-ui")]);
//!
//! tokio_test::block_on(async {
//!     assert!(evaluator.is_enabled_or("new-ui", false, "user-1").await);
//!     // Unknown flags fall back to the default
//!     assert!(!evaluator.is_enabled_or("missing", false, "user-1").await);
//! });
//! ```

pub mod bucket;
pub mod error;
pub mod evaluator;
pub mod flag;
pub mod load;
pub mod simulation;

pub use bucket::{
    BucketIndex, HASH_PREFIX_BYTES, RESOLUTION, RolloutBucketer, RolloutDecision, RolloutKey,
    Threshold, is_in_rollout,
};
pub use error::{EvaluationError, Result, RolloutError};
pub use evaluator::{FlagEvaluator, LocalEvaluator};
pub use flag::{FeatureFlag, Rollout, Variant};
pub use load::{LoadTestConfig, LoadTestStats, run_load_test};
pub use simulation::{Population, SimulationReport, correlation, simulate, simulate_parallel};

//! Integration tests for common rollout workflows.
//!
//! These tests drive the public facade the way an application would.

use flagvault::prelude::*;
use flagvault::{LoadTestConfig, RolloutKey, run_load_test};
use flagvault_config::Settings;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Bucketing
// =============================================================================

#[test]
fn test_known_assignments_are_stable() {
    assert!(!is_in_rollout("user-00042", "rollout-demo", "seed-1", 10.0).unwrap());
    assert!(is_in_rollout("user-00042", "rollout-demo", "seed-1", 60.0).unwrap());

    let key = RolloutKey::new("user-1", "rollout-demo", "seed-1").unwrap();
    assert_eq!(
        hex::encode(key.encode()),
        "00000006757365722d310000000c726f6c6c6f75742d64656d6f00000006736565642d31"
    );
    assert_eq!(key.bucket().value(), 8801);
}

#[test]
fn test_raising_percentage_keeps_enrolled_subjects() {
    let population = Population::sequential("user-", 2_000);
    let mut previous = vec![false; population.len()];

    for percentage in [0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 99.99, 100.0] {
        let report = simulate(&population, "gradual", &Rollout::new(percentage, "s")).unwrap();
        for (before, now) in previous.iter().zip(&report.membership) {
            assert!(!before || *now, "subject dropped out at {}%", percentage);
        }
        previous = report.membership;
    }

    assert!(previous.iter().all(|m| *m));
}

#[test]
fn test_invalid_input_is_reported() {
    assert!(matches!(
        is_in_rollout("", "flag", "seed", 50.0),
        Err(RolloutError::InvalidInput { field: "subject_id", .. })
    ));
    assert!(matches!(
        is_in_rollout("user-1", "", "seed", 50.0),
        Err(RolloutError::InvalidInput { field: "flag_key", .. })
    ));
}

// =============================================================================
// Flag evaluation
// =============================================================================

#[tokio::test]
async fn test_config_to_evaluator_workflow() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.toml");
    fs::write(
        &path,
        r#"
        [[flags]]
        key = "new-checkout"
        rollout = { percentage = 50.0, seed = "exp-2024" }
        "#,
    )
    .unwrap();

    let settings = Settings::from_file(&path).unwrap();
    let evaluator: Arc<dyn FlagEvaluator> = Arc::new(LocalEvaluator::with_flags(settings.flags));

    assert!(evaluator.is_enabled("new-checkout", "alice").await.unwrap());
    assert!(!evaluator.is_enabled("new-checkout", "bob").await.unwrap());
    assert!(!evaluator.is_enabled("new-checkout", "carol").await.unwrap());

    assert!(matches!(
        evaluator.is_enabled("unknown", "alice").await,
        Err(EvaluationError::FlagNotFound(_))
    ));
    assert!(evaluator.is_enabled_or("unknown", true, "alice").await);
}

#[tokio::test]
async fn test_rollout_can_be_widened_at_runtime() {
    let evaluator = LocalEvaluator::with_flags([
        FeatureFlag::boolean("new-checkout").with_rollout(Rollout::new(3.6, "exp-2024"))
    ]);

    // alice sits in bucket 360
    assert!(!evaluator.is_enabled("new-checkout", "alice").await.unwrap());
    evaluator.set_percentage("new-checkout", 3.61).await.unwrap();
    assert!(evaluator.is_enabled("new-checkout", "alice").await.unwrap());
}

#[test]
fn test_variants_follow_enrollment() {
    let flag = FeatureFlag::boolean("new-checkout").with_rollout(Rollout::new(50.0, "exp-2024"));

    assert_eq!(flag.assign("alice").unwrap(), Variant::Treatment);
    assert_eq!(flag.assign("bob").unwrap(), Variant::Control);
}

// =============================================================================
// Simulation and load testing
// =============================================================================

#[tokio::test]
async fn test_parallel_simulation_matches_sequential() {
    let population = Population::sequential("user-", 10_000);
    let rollout = Rollout::new(25.0, "seed-1");

    let sequential = simulate(&population, "rollout-demo", &rollout).unwrap();
    let parallel = simulate_parallel(&population, "rollout-demo", &rollout, 8)
        .await
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.enabled(), 2501);
}

#[tokio::test]
async fn test_load_test_over_configured_population() {
    let evaluator: Arc<dyn FlagEvaluator> = Arc::new(LocalEvaluator::with_flags([
        FeatureFlag::boolean("new-checkout").with_rollout(Rollout::new(30.0, "exp-2024")),
    ]));
    let population = Population::sequential("user-", 1_000);
    let config = LoadTestConfig::new(1_000)
        .with_batch_size(100)
        .with_pause(Duration::ZERO);

    let stats = run_load_test(evaluator, "new-checkout", &population, &config).await;

    assert_eq!(stats.total_requests, 1_000);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.enabled, 300);
    assert_eq!(stats.success_rate(), 100.0);
}

//! Rollout simulation over a synthetic population.
//!
//! Evaluates one rollout for every subject of a [`Population`] and reports
//! the resulting membership, e.g. the 10,000-user grid showing how a
//! percentage spreads over users.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::bucket::{RolloutKey, Threshold};
use crate::error::Result;
use crate::flag::Rollout;

/// Minimum width of the zero-padded numeric suffix.
const MIN_ID_WIDTH: usize = 5;

/// Ordered set of subject identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population {
    subjects: Arc<[String]>,
}

impl Population {
    /// `count` subjects named `{prefix}{index}`, with the index zero-padded to
    /// at least five digits (`user-00000`, `user-00001`, ...).
    pub fn sequential(prefix: &str, count: usize) -> Self {
        let width = count
            .saturating_sub(1)
            .to_string()
            .len()
            .max(MIN_ID_WIDTH);

        (0..count)
            .map(|i| format!("{prefix}{i:0width$}"))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.subjects.get(index).map(String::as_str)
    }
}

impl FromIterator<String> for Population {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            subjects: iter.into_iter().collect(),
        }
    }
}

/// Membership of every subject of a population in one rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub flag_key: String,
    pub seed: String,
    pub percentage: f64,
    /// Decision per subject, in population order
    pub membership: Vec<bool>,
}

impl SimulationReport {
    pub fn total(&self) -> usize {
        self.membership.len()
    }

    pub fn enabled(&self) -> usize {
        self.membership.iter().filter(|m| **m).count()
    }

    /// Enabled share in `[0, 1]`; zero for an empty population.
    pub fn enabled_fraction(&self) -> f64 {
        if self.membership.is_empty() {
            return 0.0;
        }
        self.enabled() as f64 / self.total() as f64
    }

    pub fn enabled_percentage(&self) -> f64 {
        self.enabled_fraction() * 100.0
    }

    /// Membership split into grid rows of `width` cells.
    pub fn rows(&self, width: usize) -> std::slice::Chunks<'_, bool> {
        self.membership.chunks(width.max(1))
    }

    /// Subjects of `population` that are enrolled.
    pub fn enabled_subjects<'a>(
        &'a self,
        population: &'a Population,
    ) -> impl Iterator<Item = &'a str> {
        population
            .subjects()
            .iter()
            .zip(&self.membership)
            .filter(|(_, enabled)| **enabled)
            .map(|(subject, _)| subject.as_str())
    }
}

/// Evaluate `rollout` for every subject on the current thread.
pub fn simulate(
    population: &Population,
    flag_key: &str,
    rollout: &Rollout,
) -> Result<SimulationReport> {
    let membership = evaluate_chunk(population.subjects(), flag_key, rollout)?;
    let report = report(flag_key, rollout, membership);

    debug!(
        flag_key,
        total = report.total(),
        enabled = report.enabled(),
        "simulation complete"
    );

    Ok(report)
}

/// Evaluate `rollout` for every subject, split across `workers` blocking
/// tasks. Produces exactly the same report as [`simulate`].
pub async fn simulate_parallel(
    population: &Population,
    flag_key: &str,
    rollout: &Rollout,
    workers: usize,
) -> Result<SimulationReport> {
    let workers = workers.max(1);
    let chunk_size = population.len().div_ceil(workers).max(1);
    let subjects = Arc::clone(&population.subjects);

    let mut tasks = JoinSet::new();
    for (index, start) in (0..population.len()).step_by(chunk_size).enumerate() {
        let end = (start + chunk_size).min(population.len());
        let subjects = Arc::clone(&subjects);
        let flag_key = flag_key.to_string();
        let rollout = rollout.clone();

        tasks.spawn_blocking(move || {
            evaluate_chunk(&subjects[start..end], &flag_key, &rollout).map(|m| (index, m))
        });
    }

    let mut chunks: Vec<(usize, Vec<bool>)> = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(chunk) => chunks.push(chunk?),
            // Tasks are never aborted, so a join error is always a panic.
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
    chunks.sort_by_key(|(index, _)| *index);

    let membership = chunks.into_iter().flat_map(|(_, m)| m).collect();
    let report = report(flag_key, rollout, membership);

    info!(
        flag_key,
        workers,
        total = report.total(),
        enabled = report.enabled(),
        "parallel simulation complete"
    );

    Ok(report)
}

fn evaluate_chunk(subjects: &[String], flag_key: &str, rollout: &Rollout) -> Result<Vec<bool>> {
    let threshold = Threshold::from_percentage(rollout.percentage)?;

    subjects
        .iter()
        .map(|subject| {
            let key = RolloutKey::new(subject, flag_key, &rollout.seed)?;
            Ok(threshold.contains(key.bucket()))
        })
        .collect()
}

fn report(flag_key: &str, rollout: &Rollout, membership: Vec<bool>) -> SimulationReport {
    SimulationReport {
        flag_key: flag_key.to_string(),
        seed: rollout.seed.clone(),
        percentage: rollout.percentage,
        membership,
    }
}

/// Pearson (phi) correlation of two membership vectors.
///
/// `None` when the lengths differ, the input is empty, or either side is
/// constant.
pub fn correlation(a: &[bool], b: &[bool]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().filter(|x| **x).count() as f64 / n;
    let mean_b = b.iter().filter(|x| **x).count() as f64 / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let dx = f64::from(u8::from(*x)) - mean_a;
        let dy = f64::from(u8::from(*y)) - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }

    Some(cov / (var_a * var_b).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_population() {
        let population = Population::sequential("user-", 10_000);
        assert_eq!(population.len(), 10_000);
        assert_eq!(population.get(0), Some("user-00000"));
        assert_eq!(population.get(9_999), Some("user-09999"));

        let wide = Population::sequential("u", 1_000_001);
        assert_eq!(wide.get(7), Some("u0000007"));

        assert!(Population::sequential("user-", 0).is_empty());
    }

    #[test]
    fn test_uniform_distribution() {
        let population = Population::sequential("user-", 100_000);
        let report = simulate(&population, "f", &Rollout::new(25.0, "seed")).unwrap();

        let pct = report.enabled_percentage();
        assert!((24.5..=25.5).contains(&pct), "enabled {}%", pct);
    }

    #[test]
    fn test_demo_grid() {
        let population = Population::sequential("user-", 10_000);
        let report = simulate(&population, "rollout-demo", &Rollout::new(25.0, "seed-1")).unwrap();

        assert_eq!(report.total(), 10_000);
        assert_eq!(report.enabled(), 2_501);
        assert_eq!(report.rows(100).count(), 100);
        assert!(report.rows(100).all(|row| row.len() == 100));
        assert_eq!(report.enabled_subjects(&population).count(), 2_501);
    }

    #[test]
    fn test_boundary_percentages() {
        let population = Population::sequential("user-", 2_000);

        let none = simulate(&population, "f", &Rollout::new(0.0, "s")).unwrap();
        assert_eq!(none.enabled(), 0);

        let all = simulate(&population, "f", &Rollout::new(100.0, "s")).unwrap();
        assert_eq!(all.enabled(), 2_000);
    }

    #[test]
    fn test_cross_flag_independence() {
        let population = Population::sequential("user-", 10_000);
        let a = simulate(&population, "a", &Rollout::new(50.0, "seed")).unwrap();
        let b = simulate(&population, "b", &Rollout::new(50.0, "seed")).unwrap();

        let r = correlation(&a.membership, &b.membership).unwrap();
        assert!(r.abs() < 0.05, "correlation {}", r);
    }

    #[test]
    fn test_cross_seed_independence() {
        let population = Population::sequential("user-", 10_000);
        let a = simulate(&population, "a", &Rollout::new(50.0, "seed")).unwrap();
        let b = simulate(&population, "a", &Rollout::new(50.0, "seed-2")).unwrap();

        let r = correlation(&a.membership, &b.membership).unwrap();
        assert!(r.abs() < 0.05, "correlation {}", r);
    }

    #[test]
    fn test_correlation_edge_cases() {
        assert_eq!(correlation(&[true, false], &[true]), None);
        assert_eq!(correlation(&[], &[]), None);
        assert_eq!(correlation(&[true, true], &[true, false]), None);

        let same = [true, false, true, false];
        assert!((correlation(&same, &same).unwrap() - 1.0).abs() < 1e-12);
        let inverse = [false, true, false, true];
        assert!((correlation(&same, &inverse).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_population_report() {
        let population = Population::sequential("user-", 0);
        let report = simulate(&population, "f", &Rollout::new(50.0, "")).unwrap();
        assert_eq!(report.enabled_fraction(), 0.0);
    }

    #[test]
    fn test_invalid_subject_fails_simulation() {
        let population: Population = vec!["ok".to_string(), String::new()].into_iter().collect();
        assert!(simulate(&population, "f", &Rollout::new(50.0, "")).is_err());
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let population = Population::sequential("user-", 10_007);
        let rollout = Rollout::new(37.5, "seed-1");

        let sequential = simulate(&population, "rollout-demo", &rollout).unwrap();
        for workers in [1, 3, 8, 64] {
            let parallel = simulate_parallel(&population, "rollout-demo", &rollout, workers)
                .await
                .unwrap();
            assert_eq!(parallel, sequential, "workers = {}", workers);
        }
    }

    #[tokio::test]
    async fn test_parallel_empty_population() {
        let population = Population::sequential("user-", 0);
        let report = simulate_parallel(&population, "f", &Rollout::new(10.0, ""), 4)
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn test_parallel_more_workers_than_subjects() {
        let population = Population::sequential("user-", 10);
        let rollout = Rollout::new(50.0, "s");

        let sequential = simulate(&population, "f", &rollout).unwrap();
        let parallel = simulate_parallel(&population, "f", &rollout, usize::MAX)
            .await
            .unwrap();
        assert_eq!(parallel, sequential);
    }
}

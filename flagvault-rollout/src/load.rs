//! Load Testing
//!
//! Drives a [`FlagEvaluator`] with batches of concurrent evaluations and
//! reports throughput and response-time statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::evaluator::FlagEvaluator;
use crate::simulation::Population;

/// Load test statistics
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTestStats {
    /// Total number of evaluations
    pub total_requests: u64,

    /// Evaluations that returned a decision
    pub successful: u64,

    /// Evaluations that failed or timed out
    pub failed: u64,

    /// Successful evaluations that returned `true`
    pub enabled: u64,

    /// Wall-clock duration of the whole run
    pub duration: Duration,

    pub min_response_time: Duration,
    pub max_response_time: Duration,
    pub avg_response_time: Duration,

    /// Median response time (p50)
    pub median_response_time: Duration,
    pub p95_response_time: Duration,
    pub p99_response_time: Duration,

    /// Evaluations per second
    pub rps: f64,
}

impl LoadTestStats {
    /// Calculate statistics from the response times of successful evaluations.
    pub fn from_response_times(
        response_times: &[Duration],
        failed: u64,
        enabled: u64,
        total_duration: Duration,
    ) -> Self {
        let mut sorted = response_times.to_vec();
        sorted.sort();

        let successful = sorted.len() as u64;
        let total = successful + failed;
        let sum: Duration = sorted.iter().sum();

        let min = sorted.first().copied().unwrap_or_default();
        let max = sorted.last().copied().unwrap_or_default();
        let avg = u32::try_from(sorted.len())
            .ok()
            .filter(|n| *n > 0)
            .map(|n| sum / n)
            .unwrap_or_default();

        let rps = if total_duration.as_secs_f64() > 0.0 {
            total as f64 / total_duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_requests: total,
            successful,
            failed,
            enabled,
            duration: total_duration,
            min_response_time: min,
            max_response_time: max,
            avg_response_time: avg,
            median_response_time: percentile(&sorted, 0.50),
            p95_response_time: percentile(&sorted, 0.95),
            p99_response_time: percentile(&sorted, 0.99),
            rps,
        }
    }

    /// Share of successful evaluations in percent; zero when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_requests as f64 * 100.0
    }
}

fn percentile(sorted: &[Duration], q: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::default();
    }
    let idx = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Load test configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTestConfig {
    /// Total number of evaluations
    pub requests: usize,

    /// Evaluations in flight at once
    pub batch_size: usize,

    /// Pause between batches
    pub pause: Duration,

    /// Timeout per evaluation
    pub timeout: Duration,
}

impl LoadTestConfig {
    /// Create new load test config
    ///
    /// # Examples
    ///
    /// ```
    /// use flagvault_rollout::load::LoadTestConfig;
    ///
    /// let config = LoadTestConfig::new(500).with_batch_size(50);
    /// assert_eq!(config.batch_size, 50);
    /// ```
    pub fn new(requests: usize) -> Self {
        Self {
            requests,
            batch_size: 25,
            pause: Duration::from_millis(50),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Upper bound on response-time slots reserved up front.
const MAX_PREALLOCATED: usize = 1 << 16;

/// Evaluate `flag_key` for `config.requests` subjects, cycling through the
/// population. Failures are counted, never propagated.
pub async fn run_load_test(
    evaluator: Arc<dyn FlagEvaluator>,
    flag_key: &str,
    population: &Population,
    config: &LoadTestConfig,
) -> LoadTestStats {
    let start_time = Instant::now();
    let mut response_times = Vec::with_capacity(config.requests.min(MAX_PREALLOCATED));
    let mut failed = 0u64;
    let mut enabled = 0u64;

    if population.is_empty() {
        return LoadTestStats::from_response_times(&[], 0, 0, start_time.elapsed());
    }

    let batch_size = config.batch_size.max(1);
    let mut issued = 0usize;

    while issued < config.requests {
        let batch_end = issued.saturating_add(batch_size).min(config.requests);
        let mut batch = JoinSet::new();

        for i in issued..batch_end {
            let evaluator = Arc::clone(&evaluator);
            let flag_key = flag_key.to_string();
            let subject = population.subjects()[i % population.len()].clone();
            let timeout = config.timeout;

            batch.spawn(async move {
                let req_start = Instant::now();
                let result =
                    tokio::time::timeout(timeout, evaluator.is_enabled(&flag_key, &subject)).await;
                (result, req_start.elapsed())
            });
        }

        while let Some(joined) = batch.join_next().await {
            match joined {
                Ok((Ok(Ok(is_enabled)), elapsed)) => {
                    response_times.push(elapsed);
                    enabled += u64::from(is_enabled);
                }
                _ => failed += 1,
            }
        }

        debug!(flag_key, issued = batch_end, failed, "load test batch finished");
        issued = batch_end;

        if issued < config.requests && !config.pause.is_zero() {
            tokio::time::sleep(config.pause).await;
        }
    }

    let stats =
        LoadTestStats::from_response_times(&response_times, failed, enabled, start_time.elapsed());

    info!(
        flag_key,
        total = stats.total_requests,
        successful = stats.successful,
        failed = stats.failed,
        rps = stats.rps,
        "load test complete"
    );

    stats
}

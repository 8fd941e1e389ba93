// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-concurrency sweep execution.
//!
//! [`ConcurrencyRunner`] drives the external workload at one concurrency
//! level across a dataset, for a number of passes. Inputs are issued in
//! waves of at most `concurrency` simultaneous invocations; results are
//! joined after each wave, so the accumulating sample list needs no
//! shared mutable state.
//!
//! A single failed or timed-out invocation abandons the remainder of its
//! pass: the partial measurements would be taken under different load
//! than the rest of the level, so they are recorded but flagged, and no
//! further inputs of that pass are submitted. Prior passes and other
//! levels are unaffected.

use crate::workload::{Dataset, InputItem, Workload};
use futures::future::join_all;
use llm_sizer_core::{Error, Result, RunSample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Drives the workload at a fixed concurrency level.
pub struct ConcurrencyRunner {
    workload: Arc<dyn Workload>,
    invocation_timeout: Option<Duration>,
}

impl ConcurrencyRunner {
    /// Create a runner around the given workload collaborator.
    pub fn new(workload: Arc<dyn Workload>) -> Self {
        Self {
            workload,
            invocation_timeout: None,
        }
    }

    /// Set a per-invocation timeout. A timed-out invocation is recorded
    /// as a failed sample with the elapsed wait as its runtime.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = Some(timeout);
        self
    }

    /// Execute `num_passes` passes over `dataset` at `concurrency`.
    ///
    /// When `num_passes` is `None` it defaults to
    /// `max(1, dataset.len() / concurrency)`. Datasets smaller than the
    /// concurrency level are cyclically repeated so every concurrent
    /// slot has work.
    ///
    /// Workload failures never surface as an `Err`; only invalid
    /// configuration does.
    pub async fn run_level(
        &self,
        concurrency: u32,
        dataset: &Dataset,
        num_passes: Option<u32>,
    ) -> Result<Vec<RunSample>> {
        if concurrency == 0 {
            return Err(Error::invalid_input("concurrency must be >= 1"));
        }
        let passes = match num_passes {
            Some(0) => return Err(Error::invalid_input("num_passes must be >= 1")),
            Some(n) => n,
            None => (dataset.len() as u32 / concurrency).max(1),
        };

        let items = dataset.cycle_to(concurrency as usize);
        let mut samples = Vec::with_capacity(items.len() * passes as usize);

        for pass_index in 0..passes {
            debug!(concurrency, pass_index, items = items.len(), "starting pass");
            let interrupted = self
                .run_pass(concurrency, pass_index, &items, &mut samples)
                .await;
            if interrupted {
                warn!(
                    concurrency,
                    pass_index, "pass abandoned after invocation failure"
                );
            }
        }

        Ok(samples)
    }

    /// Run one pass, appending samples. Returns true if the pass was
    /// abandoned.
    async fn run_pass(
        &self,
        concurrency: u32,
        pass_index: u32,
        items: &[InputItem],
        samples: &mut Vec<RunSample>,
    ) -> bool {
        for wave in items.chunks(concurrency as usize) {
            let invocations = wave
                .iter()
                .map(|item| self.invoke_one(concurrency, pass_index, item));
            let wave_samples = join_all(invocations).await;

            let failed = wave_samples.iter().any(|s| !s.succeeded);
            samples.extend(wave_samples);
            if failed {
                // Later waves of this pass are not submitted.
                return true;
            }
        }
        false
    }

    async fn invoke_one(
        &self,
        concurrency: u32,
        pass_index: u32,
        item: &InputItem,
    ) -> RunSample {
        let started = Instant::now();
        let outcome = match self.invocation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.workload.invoke(item))
                .await
                .ok(),
            None => Some(self.workload.invoke(item).await),
        };

        match outcome {
            Some(outcome) => RunSample {
                concurrency,
                pass_index,
                input_id: item.id.clone(),
                llm_latency_seconds: outcome.llm_latency_seconds,
                workflow_runtime_seconds: outcome.workflow_runtime_seconds,
                succeeded: outcome.succeeded,
            },
            None => {
                warn!(concurrency, pass_index, input_id = %item.id, "invocation timed out");
                RunSample::failed(
                    concurrency,
                    pass_index,
                    item.id.clone(),
                    started.elapsed().as_secs_f64(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{ScriptedWorkload, SimulatedWorkload};

    fn dataset(n: usize) -> Dataset {
        Dataset::from_payloads((0..n).map(|i| format!("q{i}")).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let runner = ConcurrencyRunner::new(Arc::new(SimulatedWorkload::default()));
        assert!(runner.run_level(0, &dataset(4), None).await.is_err());
    }

    #[tokio::test]
    async fn test_small_dataset_cycled_to_concurrency() {
        let runner = ConcurrencyRunner::new(Arc::new(SimulatedWorkload::default()));
        let samples = runner.run_level(8, &dataset(2), Some(1)).await.unwrap();
        // Two items cycled to fill all eight concurrent slots.
        assert_eq!(samples.len(), 8);
        assert!(samples.iter().all(|s| s.succeeded));
        assert_eq!(
            samples.iter().filter(|s| s.input_id == "item-0").count(),
            4
        );
    }

    #[tokio::test]
    async fn test_default_pass_count_from_dataset_size() {
        let runner = ConcurrencyRunner::new(Arc::new(SimulatedWorkload::default()));
        // 8 items / concurrency 2 => 4 passes of 8 samples each.
        let samples = runner.run_level(2, &dataset(8), None).await.unwrap();
        assert_eq!(samples.len(), 32);
        assert_eq!(samples.iter().map(|s| s.pass_index).max(), Some(3));
    }

    #[tokio::test]
    async fn test_failure_abandons_rest_of_pass_only() {
        // 6 items at concurrency 2 => 3 waves per pass. A failure in the
        // first wave of pass 0 must drop that pass's later waves while
        // pass 1 still runs in full.
        let workload = ScriptedWorkload::failing_at(&[0]);
        let runner = ConcurrencyRunner::new(Arc::new(workload));
        let samples = runner.run_level(2, &dataset(6), Some(2)).await.unwrap();

        let pass0: Vec<_> = samples.iter().filter(|s| s.pass_index == 0).collect();
        let pass1: Vec<_> = samples.iter().filter(|s| s.pass_index == 1).collect();
        assert_eq!(pass0.len(), 2);
        assert!(pass0.iter().any(|s| !s.succeeded));
        assert_eq!(pass1.len(), 6);
        assert!(pass1.iter().all(|s| s.succeeded));
    }

    #[tokio::test]
    async fn test_timeout_recorded_as_failed_sample() {
        let workload = SimulatedWorkload::default()
            .with_base_runtime(0.2)
            .with_time_scale(1.0);
        let runner = ConcurrencyRunner::new(Arc::new(workload))
            .with_timeout(Duration::from_millis(10));
        let samples = runner.run_level(1, &dataset(1), Some(1)).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert!(!samples[0].succeeded);
        assert!(samples[0].workflow_runtime_seconds > 0.0);
    }

    #[tokio::test]
    async fn test_no_samples_lost_or_duplicated() {
        let runner = ConcurrencyRunner::new(Arc::new(SimulatedWorkload::default()));
        let samples = runner.run_level(4, &dataset(4), Some(3)).await.unwrap();
        assert_eq!(samples.len(), 12);
        for pass in 0..3u32 {
            assert_eq!(samples.iter().filter(|s| s.pass_index == pass).count(), 4);
        }
    }
}

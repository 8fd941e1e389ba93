// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stand-in workloads for tests and dry runs.
//!
//! The real workflow engine is an external collaborator; these
//! implementations let the pipeline be exercised without it.
//! [`SimulatedWorkload`] produces load-dependent timings for CLI dry
//! runs, and [`ScriptedWorkload`] replays an exact success/failure
//! sequence for unit tests.

use crate::workload::{InputItem, Workload, WorkloadOutcome};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// A workload whose reported runtime grows with the number of in-flight
/// invocations, mimicking resource contention on a shared deployment.
///
/// Reported times are in simulated seconds; real waiting is scaled down
/// by `time_scale` so sweeps stay fast.
pub struct SimulatedWorkload {
    base_runtime: f64,
    runtime_per_inflight: f64,
    llm_share: f64,
    time_scale: f64,
    in_flight: AtomicU32,
}

impl Default for SimulatedWorkload {
    fn default() -> Self {
        Self {
            base_runtime: 1.0,
            runtime_per_inflight: 0.5,
            llm_share: 0.8,
            time_scale: 0.01,
            in_flight: AtomicU32::new(0),
        }
    }
}

impl SimulatedWorkload {
    /// Set the runtime reported at zero contention, in simulated seconds.
    pub fn with_base_runtime(mut self, seconds: f64) -> Self {
        self.base_runtime = seconds;
        self
    }

    /// Set the additional runtime per concurrent in-flight invocation.
    pub fn with_runtime_per_inflight(mut self, seconds: f64) -> Self {
        self.runtime_per_inflight = seconds;
        self
    }

    /// Set the ratio of real waiting time to simulated runtime.
    /// `1.0` waits in real time; the default `0.01` compresses it.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }
}

#[async_trait]
impl Workload for SimulatedWorkload {
    async fn invoke(&self, _input: &InputItem) -> WorkloadOutcome {
        let inflight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let runtime = self.base_runtime + self.runtime_per_inflight * f64::from(inflight);
        tokio::time::sleep(Duration::from_secs_f64(runtime * self.time_scale)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        WorkloadOutcome {
            workflow_runtime_seconds: runtime,
            llm_latency_seconds: Some(runtime * self.llm_share),
            succeeded: true,
        }
    }
}

/// A deterministic workload that fails at chosen invocation indices.
///
/// Invocations are numbered globally in issue order, starting at 0.
pub struct ScriptedWorkload {
    counter: AtomicUsize,
    fail_indices: HashSet<usize>,
    runtime: f64,
    llm_latency: Option<f64>,
}

impl ScriptedWorkload {
    /// A workload that succeeds everywhere except the given invocation
    /// indices.
    pub fn failing_at(indices: &[usize]) -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail_indices: indices.iter().copied().collect(),
            runtime: 2.0,
            llm_latency: Some(1.5),
        }
    }

    /// A workload that always succeeds with fixed timings.
    pub fn succeeding(runtime: f64, llm_latency: Option<f64>) -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail_indices: HashSet::new(),
            runtime,
            llm_latency,
        }
    }
}

#[async_trait]
impl Workload for ScriptedWorkload {
    async fn invoke(&self, _input: &InputItem) -> WorkloadOutcome {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        let succeeded = !self.fail_indices.contains(&index);
        WorkloadOutcome {
            workflow_runtime_seconds: self.runtime,
            llm_latency_seconds: if succeeded { self.llm_latency } else { None },
            succeeded,
        }
    }
}

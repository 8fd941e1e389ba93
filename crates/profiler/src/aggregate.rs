// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reduction of raw samples into per-level metrics.
//!
//! Percentiles use the nearest-rank method: the p-th percentile of n
//! sorted values is the `ceil(p * n)`-th order statistic. The method is
//! held fixed so persisted metrics stay comparable across runs.

use llm_sizer_core::{ConcurrencyLevelMetrics, RunSample};

/// Reduce all samples collected at one concurrency level into
/// [`ConcurrencyLevelMetrics`].
///
/// P95 values cover successful samples only; `total_runtime` sums every
/// issued sample, including a failed final one, because the later linear
/// fit extrapolates sequential throughput rather than wall-clock time.
/// A level where every sample failed keeps `None` for both percentiles
/// and is excluded from fits downstream.
pub fn aggregate_level(concurrency: u32, samples: &[RunSample]) -> ConcurrencyLevelMetrics {
    let llm_latencies: Vec<f64> = samples
        .iter()
        .filter(|s| s.succeeded)
        .filter_map(|s| s.llm_latency_seconds)
        .collect();
    let runtimes: Vec<f64> = samples
        .iter()
        .filter(|s| s.succeeded)
        .map(|s| s.workflow_runtime_seconds)
        .collect();

    ConcurrencyLevelMetrics {
        concurrency,
        p95_llm_latency: percentile(llm_latencies, 0.95),
        p95_workflow_runtime: percentile(runtimes, 0.95),
        total_runtime: samples.iter().map(|s| s.workflow_runtime_seconds).sum(),
        workflow_interrupted: samples.iter().any(|s| !s.succeeded),
        gpu_estimates: None,
    }
}

/// Nearest-rank percentile. Returns `None` for an empty input.
fn percentile(mut values: Vec<f64>, quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (quantile * values.len() as f64).ceil() as usize;
    Some(values[rank.clamp(1, values.len()) - 1])
}

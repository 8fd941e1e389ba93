// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-concurrency-level aggregate metrics.
//!
//! One [`ConcurrencyLevelMetrics`] is produced per tested concurrency
//! value, after all passes at that level have finished. It is immutable
//! thereafter, persisted verbatim to JSON, and consumed as-is by the
//! linear fit.

use crate::estimate::GpuEstimate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics mapping produced by a sweep, keyed by concurrency level.
///
/// The sweep tests levels in caller order; keying by level gives a
/// deterministic, losslessly round-trippable JSON representation, and
/// consumers may re-sort as needed.
pub type MetricsMap = BTreeMap<u32, ConcurrencyLevelMetrics>;

/// Summary statistics for one tested concurrency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyLevelMetrics {
    /// The concurrency level these metrics describe.
    pub concurrency: u32,
    /// 95th percentile of LLM call latency over successful samples, or
    /// `None` if no successful sample recorded one.
    pub p95_llm_latency: Option<f64>,
    /// 95th percentile of workflow runtime over successful samples, or
    /// `None` if every sample at this level failed.
    pub p95_workflow_runtime: Option<f64>,
    /// Sum of `workflow_runtime_seconds` over all issued samples,
    /// including a failed final one. This is a sequential-throughput
    /// accounting, deliberately not the level's wall-clock time.
    pub total_runtime: f64,
    /// True if any pass at this level failed before completing all of
    /// its inputs.
    pub workflow_interrupted: bool,
    /// Per-level diagnostic GPU estimates, filled in by the calculator
    /// after the global fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_estimates: Option<GpuEstimate>,
}

impl ConcurrencyLevelMetrics {
    /// Whether this level is usable as a fit candidate for any metric.
    pub fn is_fit_candidate(&self) -> bool {
        !self.workflow_interrupted
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fitted-line and GPU-estimate result types.
//!
//! These are derived values: stateless, recomputable at any time from a
//! metrics mapping, with no identity of their own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which time metric a fit or estimate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMetric {
    /// P95 full-workflow runtime per concurrency level.
    WorkflowRuntime,
    /// P95 LLM call latency per concurrency level.
    LlmLatency,
}

impl TimeMetric {
    /// Human-readable label used in reports and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            TimeMetric::WorkflowRuntime => "workflow runtime",
            TimeMetric::LlmLatency => "LLM latency",
        }
    }
}

/// Parameters of a successfully fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedLine {
    /// Seconds of additional time per unit of concurrency.
    pub slope: f64,
    /// Time at zero concurrency.
    pub intercept: f64,
    /// Coefficient of determination for the included points, in [0, 1].
    /// Defined as 1.0 when the included values have zero variance.
    pub r_squared: f64,
}

impl FittedLine {
    /// Predicted metric value at the given concurrency.
    pub fn predict(&self, concurrency: f64) -> f64 {
        self.slope * concurrency + self.intercept
    }
}

/// Outcome of fitting one time metric across all tested levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// The fitted line, or `None` when fewer than two usable points
    /// remained. Callers must surface the missing case, not default it
    /// to zero.
    pub line: Option<FittedLine>,
    /// `(concurrency, metric_value)` pairs that survived outlier
    /// removal, ascending by concurrency.
    pub included_points: Vec<(u32, f64)>,
    /// Levels dropped as outliers, flagged interrupted, or missing the
    /// target metric.
    pub excluded_points: BTreeSet<u32>,
}

impl FitResult {
    /// A fit result signalling insufficient data, excluding the given
    /// levels.
    pub fn insufficient(excluded: impl IntoIterator<Item = u32>) -> Self {
        Self {
            line: None,
            included_points: Vec::new(),
            excluded_points: excluded.into_iter().collect(),
        }
    }

    /// Whether a usable line was fitted.
    pub fn is_fitted(&self) -> bool {
        self.line.is_some()
    }
}

/// GPU-count estimates derived from the fitted lines and the caller's
/// targets.
///
/// One overall estimate is produced from the full fit; optionally one
/// per concurrency level (extrapolated from that single point along the
/// global slope) for diagnostic display. Estimates are independent; the
/// caller decides how to combine them (typically taking the max of the
/// non-null values).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuEstimate {
    /// GPUs needed to meet the workflow-runtime target, if computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_estimate_by_runtime: Option<f64>,
    /// GPUs needed to meet the LLM-latency target, if computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_estimate_by_llm_latency: Option<f64>,
    /// Concurrency at which the runtime target is met, per the fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_concurrency_by_runtime: Option<f64>,
    /// Concurrency at which the latency target is met, per the fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_concurrency_by_llm_latency: Option<f64>,
}

impl GpuEstimate {
    /// Whether at least one estimate was computed.
    pub fn has_any(&self) -> bool {
        self.gpu_estimate_by_runtime.is_some() || self.gpu_estimate_by_llm_latency.is_some()
    }
}

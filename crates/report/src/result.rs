// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! The structured result of a sizing run.
//!
//! [`SizingReport`] is pure data assembly: it packages the per-level
//! metrics, the fit parameters, and the final estimates, with no
//! computation of its own, so the caller can serialize it or render the
//! summary table.

use chrono::{DateTime, Utc};
use llm_sizer_core::{FitResult, GpuEstimate, MetricsMap, SizingConfig};
use llm_sizer_profiler::SizingOutcome;
use serde::{Deserialize, Serialize};

/// Full structured summary of one sizing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingReport {
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// Concurrent users the deployment must serve.
    pub target_users: f64,
    /// Runtime target, in seconds. `0.0` means not requested.
    pub target_runtime_seconds: f64,
    /// LLM latency target, in seconds. `0.0` means not requested.
    pub target_llm_latency_seconds: f64,
    /// GPUs backing the profiled test deployment.
    pub test_gpu_count: f64,
    /// R² threshold used for outlier removal.
    pub r_squared_threshold: f64,
    /// Per-level metrics, with per-level diagnostic estimates filled in.
    pub metrics: MetricsMap,
    /// Fit of P95 workflow runtime vs concurrency, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_fit: Option<FitResult>,
    /// Fit of P95 LLM latency vs concurrency, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_latency_fit: Option<FitResult>,
    /// The overall GPU estimates. Both are reported; combining them
    /// (typically as a max) is the caller's decision.
    pub gpu_estimate: GpuEstimate,
}

impl SizingReport {
    /// Assemble a report from the config, the gathered metrics, and the
    /// estimate outcome.
    pub fn new(config: &SizingConfig, metrics: &MetricsMap, outcome: &SizingOutcome) -> Self {
        Self {
            generated_at: Utc::now(),
            target_users: config.target_users,
            target_runtime_seconds: config.target_runtime_seconds,
            target_llm_latency_seconds: config.target_llm_latency_seconds,
            test_gpu_count: config.test_gpu_count,
            r_squared_threshold: config.r_squared_threshold,
            metrics: outcome.annotated_metrics(metrics),
            runtime_fit: outcome.runtime_fit.clone(),
            llm_latency_fit: outcome.llm_latency_fit.clone(),
            gpu_estimate: outcome.gpu_estimate.clone(),
        }
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Raw measurement samples.
//!
//! A [`RunSample`] is the atomic measurement unit: one invocation of the
//! external workload against one dataset item, at one concurrency level.

use serde::{Deserialize, Serialize};

/// One execution of one input at one concurrency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSample {
    /// Concurrency level this sample belongs to (>= 1).
    pub concurrency: u32,
    /// Which repetition pass produced it (0-based).
    pub pass_index: u32,
    /// Identifier of the dataset item processed.
    pub input_id: String,
    /// Latency of the representative LLM call in this run, if any
    /// occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_latency_seconds: Option<f64>,
    /// Wall-clock time for the full workflow invocation.
    pub workflow_runtime_seconds: f64,
    /// Whether the invocation completed without an error or timeout.
    pub succeeded: bool,
}

impl RunSample {
    /// A sample for a run that failed or timed out.
    ///
    /// Failed samples are still recorded; downstream aggregation keeps
    /// their runtime in the total and marks the owning pass interrupted.
    pub fn failed(
        concurrency: u32,
        pass_index: u32,
        input_id: impl Into<String>,
        workflow_runtime_seconds: f64,
    ) -> Self {
        Self {
            concurrency,
            pass_index,
            input_id: input_id.into(),
            llm_latency_seconds: None,
            workflow_runtime_seconds,
            succeeded: false,
        }
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sizing run configuration.
//!
//! An explicit struct enumerating every knob of the pipeline. There are
//! no hidden defaults: a target of `0.0` disables that estimate, the
//! pass count defaults from the dataset size, and the R² threshold for
//! outlier removal is a visible, tunable field.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default acceptance threshold for the fit's R² before outlier removal
/// stops.
pub const DEFAULT_R_SQUARED_THRESHOLD: f64 = 0.9;

/// Configuration for one sizing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Concurrency levels to sweep, in the order they will be tested.
    pub concurrency_levels: Vec<u32>,
    /// Number of passes per level. `None` derives
    /// `max(1, dataset_len / concurrency)` per level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_passes: Option<u32>,
    /// Number of concurrent users the deployment must serve.
    pub target_users: f64,
    /// Maximum acceptable P95 workflow runtime, in seconds. `0.0`
    /// disables the runtime-based estimate.
    pub target_runtime_seconds: f64,
    /// Maximum acceptable P95 LLM latency, in seconds. `0.0` disables
    /// the latency-based estimate.
    pub target_llm_latency_seconds: f64,
    /// Number of GPUs backing the test deployment being profiled.
    pub test_gpu_count: f64,
    /// Estimate from previously persisted metrics instead of running
    /// the workload.
    #[serde(default)]
    pub offline: bool,
    /// Directory where metrics and reports are written.
    pub output_dir: PathBuf,
    /// Overwrite existing output files instead of refusing to clobber
    /// them.
    #[serde(default)]
    pub overwrite: bool,
    /// Per-invocation timeout, in seconds. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_timeout_seconds: Option<f64>,
    /// R² threshold at which iterative outlier removal stops.
    #[serde(default = "default_r_squared_threshold")]
    pub r_squared_threshold: f64,
}

fn default_r_squared_threshold() -> f64 {
    DEFAULT_R_SQUARED_THRESHOLD
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            concurrency_levels: vec![1, 2, 4, 8],
            num_passes: None,
            target_users: 0.0,
            target_runtime_seconds: 0.0,
            target_llm_latency_seconds: 0.0,
            test_gpu_count: 1.0,
            offline: false,
            output_dir: PathBuf::from("sizing_output"),
            overwrite: false,
            invocation_timeout_seconds: None,
            r_squared_threshold: DEFAULT_R_SQUARED_THRESHOLD,
        }
    }
}

impl SizingConfig {
    /// Validate the sweep-related fields. Called before `gather`.
    pub fn validate_sweep(&self) -> Result<()> {
        if self.concurrency_levels.is_empty() {
            return Err(Error::invalid_input(
                "at least one concurrency level is required",
            ));
        }
        if self.concurrency_levels.contains(&0) {
            return Err(Error::invalid_input("concurrency level must be >= 1"));
        }
        if self.num_passes == Some(0) {
            return Err(Error::invalid_input("num_passes must be >= 1"));
        }
        Ok(())
    }

    /// Validate the estimate-related fields. Called before `estimate`.
    pub fn validate_estimate(&self) -> Result<()> {
        if self.target_users <= 0.0 {
            return Err(Error::invalid_input(
                "target_users must be > 0 when an estimate is requested",
            ));
        }
        if self.target_runtime_seconds <= 0.0 && self.target_llm_latency_seconds <= 0.0 {
            return Err(Error::invalid_input(
                "at least one of target_runtime_seconds or target_llm_latency_seconds \
                 must be specified",
            ));
        }
        if self.test_gpu_count <= 0.0 {
            return Err(Error::invalid_input("test_gpu_count must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.r_squared_threshold) {
            return Err(Error::invalid_input(
                "r_squared_threshold must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate_config() -> SizingConfig {
        SizingConfig {
            target_users: 100.0,
            target_runtime_seconds: 10.0,
            test_gpu_count: 8.0,
            ..SizingConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = estimate_config();
        assert!(config.validate_sweep().is_ok());
        assert!(config.validate_estimate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_level_rejected() {
        let config = SizingConfig {
            concurrency_levels: vec![1, 0, 4],
            ..SizingConfig::default()
        };
        assert!(config.validate_sweep().is_err());
    }

    #[test]
    fn test_empty_levels_rejected() {
        let config = SizingConfig {
            concurrency_levels: Vec::new(),
            ..SizingConfig::default()
        };
        assert!(config.validate_sweep().is_err());
    }

    #[test]
    fn test_missing_targets_rejected() {
        let config = SizingConfig {
            target_users: 100.0,
            test_gpu_count: 8.0,
            ..SizingConfig::default()
        };
        assert!(config.validate_estimate().is_err());
    }

    #[test]
    fn test_non_positive_target_users_rejected() {
        let config = SizingConfig {
            target_users: 0.0,
            target_runtime_seconds: 10.0,
            test_gpu_count: 8.0,
            ..SizingConfig::default()
        };
        assert!(config.validate_estimate().is_err());
    }
}

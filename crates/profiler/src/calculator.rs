// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline orchestration and GPU-count estimation.
//!
//! [`SizingCalculator`] has two entry modes. Online runs use
//! [`SizingCalculator::gather`] to sweep the concurrency levels and then
//! optionally [`SizingCalculator::estimate`]; offline runs feed
//! previously persisted metrics straight into `estimate`. There is no
//! retry state: workload failures are recorded per-sample during the
//! sweep and never abort the remaining levels.

use crate::aggregate::aggregate_level;
use crate::fit::LinearFitEstimator;
use crate::runner::ConcurrencyRunner;
use crate::workload::{Dataset, Workload};
use llm_sizer_core::{
    FitResult, FittedLine, GpuEstimate, MetricsMap, Result, SizingConfig, TimeMetric,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Derived results of one `estimate` call.
///
/// A pure function of the metrics mapping and the config: recomputable
/// at any time, holding no identity of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingOutcome {
    /// Fit of P95 workflow runtime vs concurrency, when a runtime
    /// target was requested.
    pub runtime_fit: Option<FitResult>,
    /// Fit of P95 LLM latency vs concurrency, when a latency target was
    /// requested.
    pub llm_latency_fit: Option<FitResult>,
    /// The overall estimate from the full fits. Both fields may only be
    /// `None` simultaneously when neither target was specified, which
    /// `estimate` rejects up front.
    pub gpu_estimate: GpuEstimate,
    /// Diagnostic per-level estimates, extrapolated from each usable
    /// level's own observation along the global slope.
    pub per_level_estimates: BTreeMap<u32, GpuEstimate>,
}

impl SizingOutcome {
    /// Clone the metrics mapping with the per-level diagnostic
    /// estimates filled in, for persistence and display.
    pub fn annotated_metrics(&self, metrics: &MetricsMap) -> MetricsMap {
        let mut annotated = metrics.clone();
        for (level, estimate) in &self.per_level_estimates {
            if let Some(level_metrics) = annotated.get_mut(level) {
                level_metrics.gpu_estimates = Some(estimate.clone());
            }
        }
        annotated
    }
}

/// Orchestrates the sweep → aggregate → fit → estimate pipeline.
pub struct SizingCalculator {
    workload: Arc<dyn Workload>,
}

impl SizingCalculator {
    /// Create a calculator around the given workload collaborator.
    pub fn new(workload: Arc<dyn Workload>) -> Self {
        Self { workload }
    }

    /// Sweep every configured concurrency level and aggregate each one.
    ///
    /// Levels run strictly one at a time, in the caller's order, so
    /// contention from one level cannot bleed into another's
    /// measurements. The returned mapping is what the offline mode
    /// later consumes verbatim.
    pub async fn gather(&self, config: &SizingConfig, dataset: &Dataset) -> Result<MetricsMap> {
        config.validate_sweep()?;

        let mut runner = ConcurrencyRunner::new(Arc::clone(&self.workload));
        if let Some(seconds) = config.invocation_timeout_seconds {
            runner = runner.with_timeout(Duration::from_secs_f64(seconds));
        }

        let mut metrics = MetricsMap::new();
        for &level in &config.concurrency_levels {
            let samples = runner.run_level(level, dataset, config.num_passes).await?;
            let level_metrics = aggregate_level(level, &samples);
            info!(
                concurrency = level,
                samples = samples.len(),
                p95_workflow_runtime = ?level_metrics.p95_workflow_runtime,
                interrupted = level_metrics.workflow_interrupted,
                "level complete"
            );
            metrics.insert(level, level_metrics);
        }
        Ok(metrics)
    }

    /// Fit the requested metrics and convert them into GPU estimates.
    ///
    /// Pure with respect to its inputs: calling it twice on the same
    /// mapping yields identical results. A target of `0.0` disables
    /// that metric; a missing or degenerate fit surfaces as `None`
    /// fields, never as an error, `inf`, or `NaN`.
    pub fn estimate(&self, metrics: &MetricsMap, config: &SizingConfig) -> Result<SizingOutcome> {
        config.validate_estimate()?;
        let estimator = LinearFitEstimator::new(config.r_squared_threshold);

        let runtime_fit = (config.target_runtime_seconds > 0.0)
            .then(|| estimator.fit(metrics, TimeMetric::WorkflowRuntime));
        let llm_latency_fit = (config.target_llm_latency_seconds > 0.0)
            .then(|| estimator.fit(metrics, TimeMetric::LlmLatency));

        let (runtime_concurrency, runtime_gpus) = target_estimate(
            runtime_fit.as_ref(),
            config.target_runtime_seconds,
            config,
        );
        let (latency_concurrency, latency_gpus) = target_estimate(
            llm_latency_fit.as_ref(),
            config.target_llm_latency_seconds,
            config,
        );

        let gpu_estimate = GpuEstimate {
            gpu_estimate_by_runtime: runtime_gpus,
            gpu_estimate_by_llm_latency: latency_gpus,
            calculated_concurrency_by_runtime: runtime_concurrency,
            calculated_concurrency_by_llm_latency: latency_concurrency,
        };

        let per_level_estimates = per_level_estimates(
            metrics,
            runtime_fit.as_ref(),
            llm_latency_fit.as_ref(),
            config,
        );

        Ok(SizingOutcome {
            runtime_fit,
            llm_latency_fit,
            gpu_estimate,
            per_level_estimates,
        })
    }
}

/// Solve the fitted line for the target and apply the GPU formula.
fn target_estimate(
    fit: Option<&FitResult>,
    target: f64,
    config: &SizingConfig,
) -> (Option<f64>, Option<f64>) {
    let Some(line) = fit.and_then(|f| f.line) else {
        return (None, None);
    };
    let Some(concurrency) = solve_concurrency(&line, target) else {
        return (None, None);
    };
    let gpus = config.target_users / concurrency * config.test_gpu_count;
    (Some(concurrency), Some(gpus))
}

/// Concurrency at which the fitted metric meets `target`.
///
/// Undefined (and reported as `None`, never divided through) when the
/// slope is zero or the solution is non-positive.
fn solve_concurrency(line: &FittedLine, target: f64) -> Option<f64> {
    if line.slope == 0.0 {
        return None;
    }
    let concurrency = (target - line.intercept) / line.slope;
    (concurrency.is_finite() && concurrency > 0.0).then_some(concurrency)
}

/// Per-level diagnostics: from each usable level's own observation,
/// shift along the global slope to the target and apply the same GPU
/// formula.
fn per_level_estimates(
    metrics: &MetricsMap,
    runtime_fit: Option<&FitResult>,
    llm_latency_fit: Option<&FitResult>,
    config: &SizingConfig,
) -> BTreeMap<u32, GpuEstimate> {
    let mut estimates = BTreeMap::new();
    for (&level, level_metrics) in metrics {
        if !level_metrics.is_fit_candidate() {
            continue;
        }
        let (runtime_concurrency, runtime_gpus) = level_estimate(
            runtime_fit.and_then(|f| f.line),
            level,
            level_metrics.p95_workflow_runtime,
            config.target_runtime_seconds,
            config,
        );
        let (latency_concurrency, latency_gpus) = level_estimate(
            llm_latency_fit.and_then(|f| f.line),
            level,
            level_metrics.p95_llm_latency,
            config.target_llm_latency_seconds,
            config,
        );

        let estimate = GpuEstimate {
            gpu_estimate_by_runtime: runtime_gpus,
            gpu_estimate_by_llm_latency: latency_gpus,
            calculated_concurrency_by_runtime: runtime_concurrency,
            calculated_concurrency_by_llm_latency: latency_concurrency,
        };
        if estimate.has_any() {
            estimates.insert(level, estimate);
        }
    }
    estimates
}

fn level_estimate(
    line: Option<FittedLine>,
    level: u32,
    observed: Option<f64>,
    target: f64,
    config: &SizingConfig,
) -> (Option<f64>, Option<f64>) {
    let (Some(line), Some(observed)) = (line, observed) else {
        return (None, None);
    };
    if target <= 0.0 || line.slope == 0.0 {
        return (None, None);
    }
    let concurrency = f64::from(level) + (target - observed) / line.slope;
    if !concurrency.is_finite() || concurrency <= 0.0 {
        return (None, None);
    }
    let gpus = config.target_users / concurrency * config.test_gpu_count;
    (Some(concurrency), Some(gpus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ScriptedWorkload;
    use llm_sizer_core::ConcurrencyLevelMetrics;

    fn level(concurrency: u32, runtime: Option<f64>, interrupted: bool) -> ConcurrencyLevelMetrics {
        ConcurrencyLevelMetrics {
            concurrency,
            p95_llm_latency: runtime.map(|r| r * 0.5),
            p95_workflow_runtime: runtime,
            total_runtime: runtime.unwrap_or(0.0) * 10.0,
            workflow_interrupted: interrupted,
            gpu_estimates: None,
        }
    }

    fn linear_metrics() -> MetricsMap {
        [1u32, 2, 4, 8, 16, 32]
            .iter()
            .map(|&c| (c, level(c, Some(0.6 * f64::from(c) + 3.5), false)))
            .collect()
    }

    fn sizing_config() -> SizingConfig {
        SizingConfig {
            concurrency_levels: vec![1, 2, 4, 8, 16, 32],
            target_users: 100.0,
            target_runtime_seconds: 10.0,
            test_gpu_count: 8.0,
            ..SizingConfig::default()
        }
    }

    fn calculator() -> SizingCalculator {
        SizingCalculator::new(Arc::new(ScriptedWorkload::succeeding(2.0, Some(1.5))))
    }

    #[test]
    fn test_documented_sizing_example() {
        // slope 0.6, intercept 3.5, runtime target 10s for 100 users on
        // an 8-GPU test deployment.
        let outcome = calculator()
            .estimate(&linear_metrics(), &sizing_config())
            .unwrap();
        let concurrency = outcome
            .gpu_estimate
            .calculated_concurrency_by_runtime
            .unwrap();
        let gpus = outcome.gpu_estimate.gpu_estimate_by_runtime.unwrap();
        assert!((concurrency - 10.83).abs() < 0.05);
        assert!((gpus - 73.9).abs() < 0.5);
    }

    #[test]
    fn test_zero_latency_target_disables_latency_estimate() {
        let outcome = calculator()
            .estimate(&linear_metrics(), &sizing_config())
            .unwrap();
        assert!(outcome.llm_latency_fit.is_none());
        assert!(outcome.gpu_estimate.gpu_estimate_by_llm_latency.is_none());
        assert!(outcome.gpu_estimate.gpu_estimate_by_runtime.is_some());
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let calculator = calculator();
        let metrics = linear_metrics();
        let config = sizing_config();
        let first = calculator.estimate(&metrics, &config).unwrap();
        let second = calculator.estimate(&metrics, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insufficient_points_yield_null_estimates() {
        let metrics: MetricsMap = [(4u32, level(4, Some(5.0), false))].into_iter().collect();
        let outcome = calculator().estimate(&metrics, &sizing_config()).unwrap();
        assert!(!outcome.runtime_fit.as_ref().unwrap().is_fitted());
        assert!(!outcome.gpu_estimate.has_any());
    }

    #[test]
    fn test_zero_slope_yields_null_not_division() {
        // Flat runtimes: R² is 1.0 by definition, but the target can
        // never be reached by scaling concurrency.
        let metrics: MetricsMap = [1u32, 2, 4]
            .iter()
            .map(|&c| (c, level(c, Some(5.0), false)))
            .collect();
        let outcome = calculator().estimate(&metrics, &sizing_config()).unwrap();
        assert!(outcome.runtime_fit.as_ref().unwrap().is_fitted());
        assert!(outcome.gpu_estimate.gpu_estimate_by_runtime.is_none());
        assert!(outcome
            .gpu_estimate
            .calculated_concurrency_by_runtime
            .is_none());
    }

    #[test]
    fn test_non_positive_concurrency_yields_null() {
        // Intercept already above the target at zero concurrency.
        let metrics: MetricsMap = [1u32, 2, 4]
            .iter()
            .map(|&c| (c, level(c, Some(20.0 + f64::from(c)), false)))
            .collect();
        let outcome = calculator().estimate(&metrics, &sizing_config()).unwrap();
        assert!(outcome.gpu_estimate.gpu_estimate_by_runtime.is_none());
    }

    #[test]
    fn test_interrupted_level_excluded_from_fit() {
        let mut metrics = linear_metrics();
        metrics.get_mut(&8).unwrap().workflow_interrupted = true;
        let outcome = calculator().estimate(&metrics, &sizing_config()).unwrap();
        let fit = outcome.runtime_fit.as_ref().unwrap();
        assert_eq!(fit.included_points.len(), 5);
        assert!(fit.excluded_points.contains(&8));
        // Interrupted levels also carry no diagnostic estimate.
        assert!(!outcome.per_level_estimates.contains_key(&8));
    }

    #[test]
    fn test_per_level_diagnostics_follow_global_slope() {
        let outcome = calculator()
            .estimate(&linear_metrics(), &sizing_config())
            .unwrap();
        // Points sit exactly on the line, so every level's single-point
        // extrapolation lands on the same calculated concurrency.
        for estimate in outcome.per_level_estimates.values() {
            let concurrency = estimate.calculated_concurrency_by_runtime.unwrap();
            assert!((concurrency - 10.8333).abs() < 1e-3);
        }
    }

    #[test]
    fn test_annotated_metrics_round_trip_diagnostics() {
        let metrics = linear_metrics();
        let outcome = calculator().estimate(&metrics, &sizing_config()).unwrap();
        let annotated = outcome.annotated_metrics(&metrics);
        assert!(annotated.values().all(|m| m.gpu_estimates.is_some()));
        // The source mapping is untouched.
        assert!(metrics.values().all(|m| m.gpu_estimates.is_none()));
    }

    #[tokio::test]
    async fn test_gather_covers_all_levels_despite_failures() {
        let config = SizingConfig {
            concurrency_levels: vec![2, 4],
            num_passes: Some(1),
            ..SizingConfig::default()
        };
        let dataset =
            Dataset::from_payloads((0..4).map(|i| format!("q{i}")).collect()).unwrap();
        // Fail the very first invocation: level 2's first pass aborts,
        // level 4 still runs in full.
        let calculator = SizingCalculator::new(Arc::new(ScriptedWorkload::failing_at(&[0])));
        let metrics = calculator.gather(&config, &dataset).await.unwrap();

        assert_eq!(metrics.len(), 2);
        assert!(metrics[&2].workflow_interrupted);
        assert!(!metrics[&4].workflow_interrupted);
        assert!(metrics[&4].p95_workflow_runtime.is_some());
    }

    #[tokio::test]
    async fn test_gather_rejects_invalid_config() {
        let config = SizingConfig {
            concurrency_levels: vec![],
            ..SizingConfig::default()
        };
        let dataset = Dataset::from_payloads(vec!["q".into()]).unwrap();
        assert!(calculator().gather(&config, &dataset).await.is_err());
    }

    #[test]
    fn test_estimate_rejects_missing_targets() {
        let config = SizingConfig {
            target_users: 100.0,
            test_gpu_count: 8.0,
            ..SizingConfig::default()
        };
        assert!(calculator().estimate(&linear_metrics(), &config).is_err());
    }
}

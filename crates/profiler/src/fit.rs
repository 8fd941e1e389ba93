// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Least-squares fitting with iterative outlier removal.
//!
//! A sweep at more concurrency levels gives a more robust fit, but
//! interrupted or wildly divergent runs (resource exhaustion,
//! cold-start effects) would bias the extrapolation. Rather than
//! including them blindly, the estimator removes the worst-residual
//! point one at a time until the fit is acceptable, and reports every
//! exclusion so the removal is auditable.

use llm_sizer_core::config::DEFAULT_R_SQUARED_THRESHOLD;
use llm_sizer_core::{FitResult, FittedLine, MetricsMap, TimeMetric};
use tracing::debug;

/// Fits `time_metric = slope * concurrency + intercept` across the
/// tested levels.
#[derive(Debug, Clone, Copy)]
pub struct LinearFitEstimator {
    r_squared_threshold: f64,
}

impl Default for LinearFitEstimator {
    fn default() -> Self {
        Self {
            r_squared_threshold: DEFAULT_R_SQUARED_THRESHOLD,
        }
    }
}

impl LinearFitEstimator {
    /// Create an estimator that stops outlier removal once R² reaches
    /// `r_squared_threshold`.
    pub fn new(r_squared_threshold: f64) -> Self {
        Self {
            r_squared_threshold,
        }
    }

    /// Fit the given metric across the metrics mapping.
    ///
    /// Candidate points are the levels that are not flagged
    /// `workflow_interrupted` and carry a value for `metric`. With
    /// fewer than two candidates no line is fitted and every level is
    /// reported excluded. The outlier loop is bounded: it stops when R²
    /// reaches the threshold, only two points remain, or removing the
    /// worst point no longer improves R² (the removal is reverted in
    /// that case).
    pub fn fit(&self, metrics: &MetricsMap, metric: TimeMetric) -> FitResult {
        let mut excluded: Vec<u32> = Vec::new();
        let mut points: Vec<(u32, f64)> = Vec::new();
        for (&level, level_metrics) in metrics {
            let value = match metric {
                TimeMetric::WorkflowRuntime => level_metrics.p95_workflow_runtime,
                TimeMetric::LlmLatency => level_metrics.p95_llm_latency,
            };
            match value {
                Some(value) if level_metrics.is_fit_candidate() => points.push((level, value)),
                _ => excluded.push(level),
            }
        }

        if points.len() < 2 {
            debug!(
                metric = metric.label(),
                candidates = points.len(),
                "insufficient data for fit"
            );
            return FitResult::insufficient(metrics.keys().copied());
        }

        let mut line = fit_line(&points);
        while line.r_squared < self.r_squared_threshold && points.len() > 2 {
            let worst = worst_residual_index(&points, &line);
            let removed = points.remove(worst);
            let refit = fit_line(&points);
            if refit.r_squared <= line.r_squared {
                // No improvement; keep the point and stop thinning.
                points.insert(worst, removed);
                break;
            }
            debug!(
                metric = metric.label(),
                level = removed.0,
                residual = (removed.1 - line.predict(f64::from(removed.0))).abs(),
                r_squared = refit.r_squared,
                "removed outlier"
            );
            excluded.push(removed.0);
            line = refit;
        }

        FitResult {
            line: Some(line),
            included_points: points,
            excluded_points: excluded.into_iter().collect(),
        }
    }
}

/// Least-squares line through the points, with R².
///
/// R² is defined as 1.0 when the values have zero variance (the fit is
/// a perfect horizontal line); floating-point noise is clamped away.
fn fit_line(points: &[(u32, f64)]) -> FittedLine {
    let n = points.len() as f64;
    let x_mean = points.iter().map(|&(x, _)| f64::from(x)).sum::<f64>() / n;
    let y_mean = points.iter().map(|&(_, y)| y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for &(x, y) in points {
        let dx = f64::from(x) - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    // Concurrency levels are distinct map keys, so with >= 2 points the
    // denominator is strictly positive.
    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = points.iter().map(|&(_, y)| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .map(|&(x, y)| (y - (slope * f64::from(x) + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    FittedLine {
        slope,
        intercept,
        r_squared,
    }
}

fn worst_residual_index(points: &[(u32, f64)], line: &FittedLine) -> usize {
    let mut worst = 0;
    let mut worst_residual = f64::MIN;
    for (index, &(x, y)) in points.iter().enumerate() {
        let residual = (y - line.predict(f64::from(x))).abs();
        if residual > worst_residual {
            worst_residual = residual;
            worst = index;
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_sizer_core::ConcurrencyLevelMetrics;

    fn level(concurrency: u32, runtime: Option<f64>, interrupted: bool) -> ConcurrencyLevelMetrics {
        ConcurrencyLevelMetrics {
            concurrency,
            p95_llm_latency: runtime.map(|r| r * 0.8),
            p95_workflow_runtime: runtime,
            total_runtime: runtime.unwrap_or(0.0) * 10.0,
            workflow_interrupted: interrupted,
            gpu_estimates: None,
        }
    }

    fn metrics_from(levels: Vec<ConcurrencyLevelMetrics>) -> MetricsMap {
        levels.into_iter().map(|m| (m.concurrency, m)).collect()
    }

    #[test]
    fn test_perfect_line_recovered() {
        let metrics = metrics_from(
            [1u32, 2, 4, 8, 16, 32]
                .iter()
                .map(|&c| level(c, Some(0.6 * f64::from(c) + 3.5), false))
                .collect(),
        );
        let fit = LinearFitEstimator::default().fit(&metrics, TimeMetric::WorkflowRuntime);
        let line = fit.line.unwrap();
        assert!((line.slope - 0.6).abs() < 1e-9);
        assert!((line.intercept - 3.5).abs() < 1e-9);
        assert!((line.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(fit.included_points.len(), 6);
        assert!(fit.excluded_points.is_empty());
    }

    #[test]
    fn test_two_points_fit_exactly() {
        let metrics = metrics_from(vec![
            level(2, Some(5.0), false),
            level(8, Some(11.0), false),
        ]);
        let fit = LinearFitEstimator::default().fit(&metrics, TimeMetric::WorkflowRuntime);
        let line = fit.line.unwrap();
        assert!((line.slope - 1.0).abs() < 1e-12);
        assert!((line.intercept - 3.0).abs() < 1e-12);
        assert_eq!(line.r_squared, 1.0);
        assert_eq!(fit.included_points, vec![(2, 5.0), (8, 11.0)]);
    }

    #[test]
    fn test_fewer_than_two_points_is_unfitted() {
        let metrics = metrics_from(vec![
            level(1, Some(4.0), false),
            level(2, Some(5.0), true),
            level(4, None, false),
        ]);
        let fit = LinearFitEstimator::default().fit(&metrics, TimeMetric::WorkflowRuntime);
        assert!(fit.line.is_none());
        assert!(fit.included_points.is_empty());
        assert_eq!(fit.excluded_points.into_iter().collect::<Vec<_>>(), vec![1, 2, 4]);
    }

    #[test]
    fn test_interrupted_levels_never_included() {
        let metrics = metrics_from(
            [1u32, 2, 4, 8, 16, 32]
                .iter()
                .map(|&c| level(c, Some(0.6 * f64::from(c) + 3.5), c == 8))
                .collect(),
        );
        let fit = LinearFitEstimator::default().fit(&metrics, TimeMetric::WorkflowRuntime);
        assert!(fit.is_fitted());
        assert_eq!(fit.included_points.len(), 5);
        assert!(fit.included_points.iter().all(|&(c, _)| c != 8));
        assert!(fit.excluded_points.contains(&8));
    }

    #[test]
    fn test_outlier_removed_and_reported() {
        // Five points on y = x + 1 plus one wild outlier at x = 6.
        let mut levels: Vec<_> = [1u32, 2, 4, 8, 16]
            .iter()
            .map(|&c| level(c, Some(f64::from(c) + 1.0), false))
            .collect();
        levels.push(level(6, Some(100.0), false));
        let fit =
            LinearFitEstimator::default().fit(&metrics_from(levels), TimeMetric::WorkflowRuntime);
        let line = fit.line.unwrap();
        assert!((line.slope - 1.0).abs() < 1e-9);
        assert!((line.intercept - 1.0).abs() < 1e-9);
        assert!(line.r_squared > 0.99);
        assert_eq!(fit.included_points.len(), 5);
        assert!(fit.excluded_points.contains(&6));
    }

    #[test]
    fn test_constant_values_define_r_squared_as_one() {
        let metrics = metrics_from(
            [1u32, 2, 4]
                .iter()
                .map(|&c| level(c, Some(7.0), false))
                .collect(),
        );
        let fit = LinearFitEstimator::default().fit(&metrics, TimeMetric::WorkflowRuntime);
        let line = fit.line.unwrap();
        assert_eq!(line.slope, 0.0);
        assert_eq!(line.r_squared, 1.0);
    }

    #[test]
    fn test_r_squared_within_unit_interval() {
        // Noisy but not outlier-dominated data.
        let metrics = metrics_from(vec![
            level(1, Some(4.2), false),
            level(2, Some(4.9), false),
            level(4, Some(6.4), false),
            level(8, Some(8.1), false),
        ]);
        let fit = LinearFitEstimator::new(0.999).fit(&metrics, TimeMetric::WorkflowRuntime);
        let line = fit.line.unwrap();
        assert!((0.0..=1.0).contains(&line.r_squared));
        // The loop never thins below two points.
        assert!(fit.included_points.len() >= 2);
    }

    #[test]
    fn test_llm_latency_metric_selected() {
        let metrics = metrics_from(vec![
            level(1, Some(5.0), false),
            level(2, Some(6.0), false),
        ]);
        let fit = LinearFitEstimator::default().fit(&metrics, TimeMetric::LlmLatency);
        let line = fit.line.unwrap();
        // Latency values are 0.8x the runtime values in the fixture.
        assert!((line.slope - 0.8).abs() < 1e-12);
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown summary generation.
//!
//! One row per tested concurrency level, with an alert marker for
//! levels whose passes were interrupted (those levels are excluded from
//! the fit), followed by the fitted parameters and the final estimates.

use crate::result::SizingReport;
use llm_sizer_core::FitResult;
use std::fmt::Write;

/// Marker rendered for levels excluded after an interrupted pass.
pub const INTERRUPTED_MARKER: &str = "⚠ interrupted";

/// Generate the markdown summary for a sizing report.
pub fn generate_summary(report: &SizingReport) -> String {
    let mut output = String::new();

    writeln!(output, "# Sizing Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "Targets: {} users, runtime {}, LLM latency {} on {} test GPU(s)",
        report.target_users,
        fmt_target(report.target_runtime_seconds),
        fmt_target(report.target_llm_latency_seconds),
        report.test_gpu_count
    )
    .unwrap();
    writeln!(output).unwrap();

    writeln!(
        output,
        "| Concurrency | P95 LLM latency (s) | P95 workflow runtime (s) | Total runtime (s) | Status |"
    )
    .unwrap();
    writeln!(
        output,
        "|-------------|---------------------|--------------------------|-------------------|--------|"
    )
    .unwrap();
    for metrics in report.metrics.values() {
        writeln!(
            output,
            "| {} | {} | {} | {:.2} | {} |",
            metrics.concurrency,
            fmt_opt(metrics.p95_llm_latency),
            fmt_opt(metrics.p95_workflow_runtime),
            metrics.total_runtime,
            if metrics.workflow_interrupted {
                INTERRUPTED_MARKER
            } else {
                "ok"
            }
        )
        .unwrap();
    }
    writeln!(output).unwrap();

    if let Some(fit) = &report.runtime_fit {
        write_fit(&mut output, "Workflow runtime fit", fit);
    }
    if let Some(fit) = &report.llm_latency_fit {
        write_fit(&mut output, "LLM latency fit", fit);
    }

    writeln!(output, "## Estimates").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "- GPUs by workflow runtime: {}",
        fmt_opt(report.gpu_estimate.gpu_estimate_by_runtime)
    )
    .unwrap();
    writeln!(
        output,
        "- GPUs by LLM latency: {}",
        fmt_opt(report.gpu_estimate.gpu_estimate_by_llm_latency)
    )
    .unwrap();

    output
}

fn write_fit(output: &mut String, title: &str, fit: &FitResult) {
    writeln!(output, "## {title}").unwrap();
    writeln!(output).unwrap();
    match &fit.line {
        Some(line) => {
            writeln!(
                output,
                "slope {:.4}, intercept {:.4}, R² {:.4}, {} point(s) included",
                line.slope,
                line.intercept,
                line.r_squared,
                fit.included_points.len()
            )
            .unwrap();
            if !fit.excluded_points.is_empty() {
                let excluded: Vec<String> =
                    fit.excluded_points.iter().map(u32::to_string).collect();
                writeln!(output, "excluded levels: {}", excluded.join(", ")).unwrap();
            }
        }
        None => writeln!(output, "not enough data for a fit").unwrap(),
    }
    writeln!(output).unwrap();
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "n/a".to_string(),
    }
}

fn fmt_target(value: f64) -> String {
    if value > 0.0 {
        format!("{value:.2}s")
    } else {
        "n/a".to_string()
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON persistence for metrics and reports.
//!
//! The metrics file is the gather/offline boundary: a mapping from
//! concurrency level to its aggregated metrics (including the nested
//! per-level diagnostic estimates). It round-trips losslessly, so an
//! offline `estimate` over a reloaded file matches an estimate over the
//! in-memory mapping.
//!
//! Whether an existing file may be clobbered is an explicit caller
//! decision via the `overwrite` flag, not a global default.

use crate::markdown;
use crate::result::SizingReport;
use llm_sizer_core::{Error, MetricsMap, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name for the persisted metrics mapping.
pub const METRICS_FILE: &str = "metrics.json";

/// File name for the full structured report.
pub const REPORT_FILE: &str = "sizing_report.json";

/// File name for the markdown summary.
pub const SUMMARY_FILE: &str = "summary.md";

/// Write the metrics mapping to `dir/metrics.json`.
pub fn write_metrics(metrics: &MetricsMap, dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let path = prepared_path(dir, METRICS_FILE, overwrite)?;
    fs::write(&path, serde_json::to_string_pretty(metrics)?)?;
    Ok(path)
}

/// Read a metrics mapping previously written by [`write_metrics`].
pub fn read_metrics(path: &Path) -> Result<MetricsMap> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the full report to `dir/sizing_report.json`.
pub fn write_report(report: &SizingReport, dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let path = prepared_path(dir, REPORT_FILE, overwrite)?;
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

/// Write the markdown summary to `dir/summary.md`.
pub fn write_summary(report: &SizingReport, dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let path = prepared_path(dir, SUMMARY_FILE, overwrite)?;
    fs::write(&path, markdown::generate_summary(report))?;
    Ok(path)
}

/// Ensure `dir` exists and resolve `name` within it, refusing to
/// clobber an existing file unless `overwrite` is set.
fn prepared_path(dir: &Path, name: &str, overwrite: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    if path.exists() && !overwrite {
        return Err(Error::invalid_input(format!(
            "{} already exists; pass overwrite to replace it",
            path.display()
        )));
    }
    Ok(path)
}

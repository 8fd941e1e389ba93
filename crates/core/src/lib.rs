// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model for the LLM Sizer concurrency profiler.
//!
//! This crate defines the measurement and estimation types shared by the
//! profiler pipeline:
//!
//! - [`sample`] - Raw per-invocation measurements ([`RunSample`])
//! - [`metrics`] - Per-concurrency-level aggregates ([`ConcurrencyLevelMetrics`])
//! - [`estimate`] - Fitted lines and GPU estimates ([`FitResult`], [`GpuEstimate`])
//! - [`config`] - The explicit sizing configuration ([`SizingConfig`])
//! - [`error`] - The crate-wide error type
//!
//! The types here are data-only; the algorithms that produce them live in
//! `llm-sizer-profiler`.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod estimate;
pub mod metrics;
pub mod sample;

pub use config::SizingConfig;
pub use error::{Error, Result};
pub use estimate::{FitResult, FittedLine, GpuEstimate, TimeMetric};
pub use metrics::{ConcurrencyLevelMetrics, MetricsMap};
pub use sample::RunSample;

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Concurrency sweep runner and GPU sizing estimator.
//!
//! This crate implements the profiling pipeline: drive an opaque async
//! workload at a series of concurrency levels, reduce the raw samples
//! into per-level percentile metrics, fit a least-squares line with
//! iterative outlier removal across the levels, and extrapolate the GPU
//! count required to serve a target user population within a latency or
//! runtime SLA.
//!
//! # Pipeline
//!
//! ```text
//! SizingCalculator::gather
//!   └─ ConcurrencyRunner::run_level   (one level at a time)
//!       └─ Workload::invoke           (up to `concurrency` in flight)
//!   └─ aggregate_level                (per level)
//! SizingCalculator::estimate
//!   └─ LinearFitEstimator::fit        (per target metric)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use llm_sizer_core::SizingConfig;
//! use llm_sizer_profiler::{harness::SimulatedWorkload, Dataset, SizingCalculator};
//! use std::sync::Arc;
//!
//! # async fn run() -> llm_sizer_core::Result<()> {
//! let config = SizingConfig {
//!     concurrency_levels: vec![1, 2, 4, 8],
//!     target_users: 100.0,
//!     target_runtime_seconds: 10.0,
//!     test_gpu_count: 8.0,
//!     ..SizingConfig::default()
//! };
//! let dataset = Dataset::from_payloads(vec!["q1".into(), "q2".into()])?;
//! let calculator = SizingCalculator::new(Arc::new(SimulatedWorkload::default()));
//! let metrics = calculator.gather(&config, &dataset).await?;
//! let outcome = calculator.estimate(&metrics, &config)?;
//! println!("{:?}", outcome.gpu_estimate);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod calculator;
pub mod fit;
pub mod harness;
pub mod runner;
pub mod workload;

pub use aggregate::aggregate_level;
pub use calculator::{SizingCalculator, SizingOutcome};
pub use fit::LinearFitEstimator;
pub use runner::ConcurrencyRunner;
pub use workload::{Dataset, InputItem, Workload, WorkloadOutcome};

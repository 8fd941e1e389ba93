// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Result assembly and persistence for LLM Sizer.
//!
//! # Modules
//!
//! - [`result`] - The [`SizingReport`] struct assembled from a run
//! - [`io`] - JSON persistence for metrics and reports
//! - [`markdown`] - Markdown summary-table generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod io;
pub mod markdown;
pub mod result;

pub use result::SizingReport;

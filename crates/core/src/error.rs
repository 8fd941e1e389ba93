// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the sizing pipeline.
//!
//! Only configuration mistakes and I/O problems surface as errors.
//! Workload failures are recorded in the samples themselves, and an
//! insufficient fit is expressed as `None` fields in the results, never
//! as an `Err`.

use thiserror::Error;

/// Errors that can occur in the sizing pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid caller input (bad concurrency level, empty dataset,
    /// missing targets, ...). Fatal, never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem failure while persisting or loading results.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure at the persistence boundary.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an [`Error::InvalidInput`] from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

/// Result type for sizing operations.
pub type Result<T> = std::result::Result<T, Error>;

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! The workload collaborator boundary.
//!
//! The agent/workflow engine that actually answers each input is
//! external to this crate. It is consumed through the [`Workload`]
//! trait as a black box: given an input item, it returns the per-run
//! timings and a success flag. Failure is expressed in the
//! [`WorkloadOutcome`], never by panicking across the boundary.

use async_trait::async_trait;
use llm_sizer_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One dataset item, identified by a stable id with an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    /// Stable identifier for this item.
    pub id: String,
    /// Caller-provided content, passed through to the workload untouched.
    pub payload: serde_json::Value,
}

/// Result of one workload invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadOutcome {
    /// Wall-clock time of the full workflow invocation.
    pub workflow_runtime_seconds: f64,
    /// Latency of the representative LLM call, if one occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_latency_seconds: Option<f64>,
    /// Whether the invocation completed without raising.
    pub succeeded: bool,
}

/// The external workflow engine, invoked once per sample.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Execute the workload against one input item.
    async fn invoke(&self, input: &InputItem) -> WorkloadOutcome;
}

/// An ordered, non-empty sequence of input items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    items: Vec<InputItem>,
}

impl Dataset {
    /// Create a dataset from items. Errors on an empty input.
    pub fn new(items: Vec<InputItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::invalid_input("dataset must not be empty"));
        }
        Ok(Self { items })
    }

    /// Create a dataset from plain string payloads, assigning ids
    /// `item-0`, `item-1`, ...
    pub fn from_payloads(payloads: Vec<String>) -> Result<Self> {
        let items = payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| InputItem {
                id: format!("item-{i}"),
                payload: serde_json::Value::String(payload),
            })
            .collect();
        Self::new(items)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false: construction rejects empty datasets.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The items in caller order.
    pub fn items(&self) -> &[InputItem] {
        &self.items
    }

    /// The items, cyclically repeated until at least `min_len` entries,
    /// so every concurrent slot has work when the dataset is smaller
    /// than the concurrency level.
    pub fn cycle_to(&self, min_len: usize) -> Vec<InputItem> {
        self.items
            .iter()
            .cycle()
            .take(self.items.len().max(min_len))
            .cloned()
            .collect()
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! LLM Sizer CLI entry point.

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = llm_sizer_cli::run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// Copyright 2025 LLM Sizer Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for the LLM Sizer concurrency profiler.
//!
//! Two subcommands mirror the calculator's two entry modes: `sweep`
//! runs the online gather (and an estimate when targets are given),
//! `estimate` is the offline mode over a previously persisted
//! `metrics.json`.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use llm_sizer_core::{MetricsMap, SizingConfig};
use llm_sizer_profiler::harness::SimulatedWorkload;
use llm_sizer_profiler::{Dataset, SizingCalculator};
use llm_sizer_report::{io, markdown, SizingReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// LLM Sizer CLI.
#[derive(Parser, Debug)]
#[command(name = "llm-sizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Sizing targets shared by both subcommands.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Number of concurrent users the deployment must serve.
    #[arg(long, default_value_t = 0.0)]
    pub target_users: f64,

    /// Maximum acceptable P95 workflow runtime, in seconds (0 disables).
    #[arg(long, default_value_t = 0.0)]
    pub target_runtime: f64,

    /// Maximum acceptable P95 LLM latency, in seconds (0 disables).
    #[arg(long, default_value_t = 0.0)]
    pub target_llm_latency: f64,

    /// Number of GPUs backing the profiled test deployment.
    #[arg(long, default_value_t = 1.0)]
    pub test_gpu_count: f64,

    /// R² threshold at which outlier removal stops.
    #[arg(long, default_value_t = llm_sizer_core::config::DEFAULT_R_SQUARED_THRESHOLD)]
    pub r_squared_threshold: f64,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep the concurrency levels against a workload and persist the
    /// per-level metrics (online mode).
    ///
    /// The sweep drives the built-in simulated workload; deployments
    /// profiling a real workflow engine embed `llm-sizer-profiler` and
    /// supply their own `Workload` implementation.
    Sweep {
        /// Concurrency levels to test, in sweep order.
        #[arg(long, value_delimiter = ',', default_value = "1,2,4,8,16,32")]
        levels: Vec<u32>,

        /// Passes per level (default: dataset size / concurrency).
        #[arg(long)]
        passes: Option<u32>,

        /// JSON file holding an array of input payload strings.
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Synthetic dataset size when no dataset file is given.
        #[arg(long, default_value_t = 8)]
        items: usize,

        /// Per-invocation timeout, in seconds.
        #[arg(long)]
        timeout: Option<f64>,

        /// Directory for metrics and report files.
        #[arg(short, long, default_value = "sizing_output")]
        output: PathBuf,

        /// Overwrite existing output files.
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Estimate GPU needs from previously persisted metrics (offline
    /// mode).
    Estimate {
        /// Path to a metrics.json written by `sweep`.
        #[arg(long)]
        metrics: PathBuf,

        /// Directory for the report files.
        #[arg(short, long, default_value = "sizing_output")]
        output: PathBuf,

        /// Overwrite existing output files.
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        targets: TargetArgs,
    },
}

impl TargetArgs {
    fn apply(&self, config: &mut SizingConfig) {
        config.target_users = self.target_users;
        config.target_runtime_seconds = self.target_runtime;
        config.target_llm_latency_seconds = self.target_llm_latency;
        config.test_gpu_count = self.test_gpu_count;
        config.r_squared_threshold = self.r_squared_threshold;
    }

    fn estimate_requested(&self) -> bool {
        self.target_runtime > 0.0 || self.target_llm_latency > 0.0
    }
}

/// Run the CLI with the given arguments.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            levels,
            passes,
            dataset,
            items,
            timeout,
            output,
            overwrite,
            targets,
        } => {
            let mut config = SizingConfig {
                concurrency_levels: levels,
                num_passes: passes,
                invocation_timeout_seconds: timeout,
                output_dir: output,
                overwrite,
                offline: false,
                ..SizingConfig::default()
            };
            targets.apply(&mut config);
            let dataset = load_dataset(dataset, items)?;
            sweep(&config, &dataset, targets.estimate_requested()).await
        }
        Commands::Estimate {
            metrics,
            output,
            overwrite,
            targets,
        } => {
            let mut config = SizingConfig {
                output_dir: output,
                overwrite,
                offline: true,
                ..SizingConfig::default()
            };
            targets.apply(&mut config);
            let metrics = io::read_metrics(&metrics)
                .with_context(|| format!("reading metrics from {}", metrics.display()))?;
            estimate_and_write(&config, &metrics)
        }
    }
}

async fn sweep(
    config: &SizingConfig,
    dataset: &Dataset,
    estimate_requested: bool,
) -> anyhow::Result<()> {
    let calculator = SizingCalculator::new(Arc::new(SimulatedWorkload::default()));

    let bar = ProgressBar::new(config.concurrency_levels.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} sweeping level {msg} [{pos}/{len}]")
            .expect("static progress template"),
    );

    let mut metrics = MetricsMap::new();
    for &level in &config.concurrency_levels {
        bar.set_message(level.to_string());
        let level_config = SizingConfig {
            concurrency_levels: vec![level],
            ..config.clone()
        };
        metrics.extend(calculator.gather(&level_config, dataset).await?);
        bar.inc(1);
    }
    bar.finish_and_clear();
    info!(levels = metrics.len(), "sweep complete");

    if estimate_requested {
        estimate_and_write(config, &metrics)
    } else {
        let path = io::write_metrics(&metrics, &config.output_dir, config.overwrite)?;
        println!("Metrics written to {}", path.display());
        Ok(())
    }
}

fn estimate_and_write(config: &SizingConfig, metrics: &MetricsMap) -> anyhow::Result<()> {
    // The estimate is a pure function of the metrics mapping; the
    // workload is never invoked here.
    let calculator = SizingCalculator::new(Arc::new(SimulatedWorkload::default()));
    let outcome = calculator.estimate(metrics, config)?;
    let report = SizingReport::new(config, metrics, &outcome);

    io::write_metrics(&report.metrics, &config.output_dir, config.overwrite)?;
    io::write_report(&report, &config.output_dir, config.overwrite)?;
    io::write_summary(&report, &config.output_dir, config.overwrite)?;

    print!("{}", markdown::generate_summary(&report));
    println!("Results written to {}", config.output_dir.display());
    Ok(())
}

fn load_dataset(path: Option<PathBuf>, items: usize) -> anyhow::Result<Dataset> {
    let payloads = match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading dataset from {}", path.display()))?;
            serde_json::from_str::<Vec<String>>(&content)
                .with_context(|| format!("parsing dataset {}", path.display()))?
        }
        None => (0..items.max(1)).map(|i| format!("question-{i}")).collect(),
    };
    Ok(Dataset::from_payloads(payloads)?)
}

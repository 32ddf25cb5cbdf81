//! llmtest - statistical test runner for non-deterministic code
//!
//! ## Commands
//!
//! - `run`: run the built-in demo suite with the sampling hook installed
//! - `plan`: show how many runs a required success rate gets
//! - `markers`: list registered markers

mod demo;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llmtest_core::{EngineConfig, ReportSink, RunPlanner, ThresholdSpec};
use llmtest_harness::{write_results_json, ConsoleSink, Harness, ResultsArtifact};
use serde::Serialize;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "llmtest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run tests many times and judge them by success rate", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo suite
    Run {
        /// Engine configuration file (default: llmtest.toml if present)
        #[arg(short, long, env = "LLMTEST_CONFIG")]
        config: Option<PathBuf>,

        /// Write a results.json artifact to this path
        #[arg(long)]
        results: Option<PathBuf>,

        /// Stop after N failed or errored items (0 = never)
        #[arg(long, default_value = "0")]
        maxfail: usize,
    },

    /// Show the planned run count for a required success rate
    Plan {
        /// Required success rate in [0, 1]
        rate: f64,

        /// Engine configuration file
        #[arg(short, long, env = "LLMTEST_CONFIG")]
        config: Option<PathBuf>,
    },

    /// List registered markers
    Markers,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    required_rate: f64,
    planned_runs: u32,
    min_runs: u32,
    max_runs: u32,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    llmtest_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            config,
            results,
            maxfail,
        } => {
            let mut sink = ConsoleSink::stdout();
            let success = cmd_run(config.as_deref(), results.as_deref(), maxfail, &mut sink)?;
            Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Plan { rate, config } => {
            cmd_plan(rate, config.as_deref(), cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Markers => {
            cmd_markers();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    EngineConfig::load(path).with_context(|| match path {
        Some(p) => format!("load config from {:?}", p),
        None => "load default config".to_string(),
    })
}

/// Returns whether every item passed.
fn cmd_run(
    config: Option<&Path>,
    results: Option<&Path>,
    maxfail: usize,
    sink: &mut dyn ReportSink,
) -> Result<bool> {
    let config = load_config(config)?;
    info!(?config, "engine config loaded");

    let mut harness = Harness::new(config).with_max_failures(maxfail);
    let report = harness.run(demo::suite(), sink);

    if !report.not_run.is_empty() {
        println!(
            "stopping after {} failures; {} not run",
            maxfail,
            report.not_run.len()
        );
    }
    println!("===== {} =====", report.summary_line());

    if let Some(path) = results {
        write_results_json(path, &ResultsArtifact::from_report(&report))?;
        println!("results written to {}", path.display());
    }

    Ok(report.success())
}

fn plan_output(rate: f64, config: &EngineConfig) -> Result<PlanOutput> {
    let threshold = ThresholdSpec::new("plan", rate)?;
    let planner = RunPlanner::from_config(config);
    Ok(PlanOutput {
        required_rate: threshold.required_rate(),
        planned_runs: planner.plan(threshold.required_rate()),
        min_runs: planner.min_runs(),
        max_runs: planner.max_runs(),
    })
}

fn cmd_plan(rate: f64, config: Option<&Path>, json: bool) -> Result<()> {
    let output = plan_output(rate, &load_config(config)?)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "required rate {:.2}% -> {} runs (range {}..={})",
            output.required_rate * 100.0,
            output.planned_runs,
            output.min_runs,
            output.max_runs
        );
    }
    Ok(())
}

fn cmd_markers() {
    let harness = Harness::default();
    for description in harness.registry().descriptions() {
        println!("@llmtest.mark.{description}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "llmtest",
            "--verbose",
            "run",
            "--results",
            "out/results.json",
            "--maxfail",
            "2",
        ])
        .expect("parse");
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                results, maxfail, ..
            } => {
                assert_eq!(results, Some(PathBuf::from("out/results.json")));
                assert_eq!(maxfail, 2);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_plan_output_defaults() {
        let output = plan_output(0.8, &EngineConfig::default()).expect("plan");
        assert_eq!(output.planned_runs, 50);
        assert_eq!(output.min_runs, 10);
        assert_eq!(output.max_runs, 100);
    }

    #[test]
    fn test_plan_rejects_out_of_range_rate() {
        let err = plan_output(1.5, &EngineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn test_run_writes_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("llmtest.toml");
        std::fs::write(&config_path, "max_retained_failures = 2\n").expect("write config");
        let results_path = dir.path().join("results.json");

        let mut sink = ConsoleSink::new(Vec::new());
        let success =
            cmd_run(Some(&config_path), Some(&results_path), 0, &mut sink).expect("run");
        assert!(!success);

        let console = String::from_utf8(sink.into_inner()).expect("utf8");
        assert!(console.contains("test_alternating_model FAILED"));
        assert!(console.contains("test_math_exact PASSED"));
        assert!(!console.contains("panicked"));

        let artifact = llmtest_harness::read_results_json(&results_path).expect("read");
        assert_eq!(artifact.summary.failed, 1);
        assert_eq!(artifact.summary.passed, 6);
    }
}

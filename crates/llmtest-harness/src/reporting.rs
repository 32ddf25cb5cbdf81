use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use llmtest_core::SessionSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::summary::{ItemResult, RunReport};

/// Version of the results.json layout.
pub const RESULTS_SCHEMA_VERSION: &str = "1.0";

/// Count section persisted in results.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsSummaryArtifact {
    pub total_items: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub not_run: usize,
    pub success: bool,
}

/// Machine-readable record of one harness run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub duration_ms: u64,
    pub summary: ResultsSummaryArtifact,
    pub items: Vec<ItemResult>,
    pub sessions: Vec<SessionSummary>,
}

impl ResultsArtifact {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            schema_version: RESULTS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_id: report.run_id,
            duration_ms: report.duration_ms,
            summary: ResultsSummaryArtifact {
                total_items: report.items.len(),
                passed: report.passed_count(),
                failed: report.failed_count(),
                errors: report.error_count(),
                not_run: report.not_run.len(),
                success: report.success(),
            },
            items: report.items.clone(),
            sessions: report.sessions.clone(),
        }
    }
}

/// Write results.json in pretty JSON format.
pub fn write_results_json(path: &Path, artifact: &ResultsArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize results artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

pub fn read_results_json(path: &Path) -> Result<ResultsArtifact> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse {:?}", path))
}

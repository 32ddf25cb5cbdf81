//! Terminal summary of a harness run.

use chrono::{DateTime, Utc};
use llmtest_core::SessionSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final status of one item, pytest-style.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Passed,
    Failed,
    /// Never reached a verdict: rejected at collection or faulted.
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Passed => "passed",
            ItemStatus::Failed => "failed",
            ItemStatus::Error => "error",
        }
    }
}

/// Per-item line of the terminal summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemResult {
    pub node_id: String,
    pub status: ItemStatus,
    /// Whether the item ran as a sampled session.
    pub sampled: bool,
    pub message: Option<String>,
}

impl ItemResult {
    pub fn new(node_id: impl Into<String>, status: ItemStatus, sampled: bool) -> Self {
        Self {
            node_id: node_id.into(),
            status,
            sampled,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Result of [`crate::Harness::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub items: Vec<ItemResult>,
    /// Items skipped after the failure limit was reached.
    pub not_run: Vec<String>,
    pub sessions: Vec<SessionSummary>,
    pub duration_ms: u64,
}

impl RunReport {
    fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn passed_count(&self) -> usize {
        self.count(ItemStatus::Passed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(ItemStatus::Failed)
    }

    pub fn error_count(&self) -> usize {
        self.count(ItemStatus::Error)
    }

    /// True when nothing failed or errored.
    pub fn success(&self) -> bool {
        self.failed_count() == 0 && self.error_count() == 0
    }

    pub fn item(&self, node_id: &str) -> Option<&ItemResult> {
        self.items.iter().find(|i| i.node_id == node_id)
    }

    /// e.g. `2 failed, 4 passed, 1 error in 0.31s`
    pub fn summary_line(&self) -> String {
        let mut parts = Vec::new();
        if self.failed_count() > 0 {
            parts.push(format!("{} failed", self.failed_count()));
        }
        if self.passed_count() > 0 {
            parts.push(format!("{} passed", self.passed_count()));
        }
        match self.error_count() {
            0 => {}
            1 => parts.push("1 error".to_string()),
            n => parts.push(format!("{n} errors")),
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }
        format!(
            "{} in {:.2}s",
            parts.join(", "),
            self.duration_ms as f64 / 1000.0
        )
    }
}

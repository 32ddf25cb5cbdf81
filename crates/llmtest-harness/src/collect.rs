//! Collection: turn test cases into host items, validating markers once.
//!
//! Threshold construction happens here, before anything runs. A case with a
//! bad marker is rejected on its own; the rest of the suite still collects.

use std::collections::HashSet;

use llmtest_core::{TestItem, ThresholdSpec};
use tracing::{debug, warn};

use crate::case::TestCase;
use crate::error::{HarnessError, Result};
use crate::marker::{MarkerRegistry, LLM_MARKER};

/// A case that passed collection, paired with its host item.
#[derive(Debug)]
pub struct CollectedItem {
    pub item: TestItem,
    pub case: TestCase,
}

/// Outcome of collecting one case.
#[derive(Debug)]
pub enum Collected {
    Ready(CollectedItem),
    Rejected { case: TestCase, error: HarnessError },
}

impl Collected {
    pub fn item(&self) -> Option<&TestItem> {
        match self {
            Collected::Ready(collected) => Some(&collected.item),
            Collected::Rejected { .. } => None,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Collected::Ready(collected) => &collected.item.node_id,
            Collected::Rejected { case, .. } => case.node_id(),
        }
    }
}

/// Collect cases in order.
pub fn collect(registry: &MarkerRegistry, cases: Vec<TestCase>) -> Vec<Collected> {
    let mut seen = HashSet::new();
    cases
        .into_iter()
        .map(|case| {
            let first_occurrence = seen.insert(case.node_id().to_string());
            let result = if first_occurrence {
                build_item(registry, &case)
            } else {
                Err(HarnessError::DuplicateNodeId(case.node_id().to_string()))
            };
            match result {
                Ok(item) => {
                    debug!(node_id = %item.node_id, sampled = item.threshold.is_some(), "collected");
                    Collected::Ready(CollectedItem { item, case })
                }
                Err(error) => {
                    warn!(node_id = %case.node_id(), %error, "collection rejected case");
                    Collected::Rejected { case, error }
                }
            }
        })
        .collect()
}

fn build_item(registry: &MarkerRegistry, case: &TestCase) -> Result<TestItem> {
    if let Some(unknown) = case.markers().iter().find(|m| !registry.is_registered(&m.name)) {
        return Err(HarnessError::UnknownMarker(unknown.name.clone()));
    }

    let mut item = TestItem::new(case.node_id());
    if let Some(location) = case.location() {
        item = item.with_location(location.clone());
    }
    if let Some(marker) = case.closest_marker(LLM_MARKER) {
        item = item.with_threshold(ThresholdSpec::from_marker_args(&marker.args)?);
    }
    Ok(item)
}

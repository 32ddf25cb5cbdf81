//! Error types for harness collection and execution.

use llmtest_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("configuration error: '{0}' not found in `markers` configuration option")]
    UnknownMarker(String),

    #[error("configuration error: duplicate test node id: {0}")]
    DuplicateNodeId(String),
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

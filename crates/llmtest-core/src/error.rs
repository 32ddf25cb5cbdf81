//! Error taxonomy for the sampling engine.
//!
//! Only two classes of failure ever leave a session as errors:
//! configuration problems caught before the first run, and execution faults
//! where the test body could not be invoked at all. A failing check inside a
//! run is data (`RunOutcome`), and an unmet threshold is a `Verdict`.

/// Invalid engine configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("min_runs must be at least 1, got {0}")]
    InvalidMinRuns(u32),

    #[error("base_runs must be positive, got {0}")]
    InvalidBaseRuns(f64),

    #[error("margin_floor must be in (0, 1], got {0}")]
    InvalidMarginFloor(f64),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Engine errors surfaced to the host as genuine session failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Threshold outside `[0, 1]` or malformed annotation arguments.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The test body could not be invoked; the sample is incomplete.
    #[error("execution fault in {node_id} (run {run}): {detail}")]
    ExecutionFault {
        node_id: String,
        run: u32,
        detail: String,
    },

    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Whether this error was raised before any run executed.
    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration(_) | EngineError::Config(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

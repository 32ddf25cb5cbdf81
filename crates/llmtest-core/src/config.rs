//! Engine configuration with layered loading.
//!
//! Precedence (lowest to highest):
//! 1. Programmatic defaults
//! 2. TOML file (`llmtest.toml` unless a path is given)
//! 3. `LLMTEST_*` environment variables

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::planner::{DEFAULT_BASE_RUNS, DEFAULT_MARGIN_FLOOR, DEFAULT_MIN_RUNS};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "llmtest.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "LLMTEST_";

/// Tunables for run planning and session record retention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Floor on the number of runs per session.
    pub min_runs: u32,

    /// Numerator of the run-count heuristic (`base_runs / margin`).
    pub base_runs: f64,

    /// Lower bound on the tolerance margin `1 - required_rate`.
    pub margin_floor: f64,

    /// Keep a call-phase report for every run in the session summary.
    /// These are never sent to the report sink.
    pub retain_run_reports: bool,

    /// How many of the most recent failure details a session summary keeps.
    pub max_retained_failures: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_runs: DEFAULT_MIN_RUNS,
            base_runs: DEFAULT_BASE_RUNS,
            margin_floor: DEFAULT_MARGIN_FLOOR,
            retain_run_reports: false,
            max_retained_failures: 5,
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, an optional TOML file, and the
    /// environment. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(EngineConfig::default()))
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Parse configuration from a TOML string layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(EngineConfig::default()))
                .merge(Toml::string(toml)),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: EngineConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make run planning meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_runs == 0 {
            return Err(ConfigError::InvalidMinRuns(self.min_runs));
        }
        if self.base_runs <= 0.0 || !self.base_runs.is_finite() {
            return Err(ConfigError::InvalidBaseRuns(self.base_runs));
        }
        if self.margin_floor.is_nan() || self.margin_floor <= 0.0 || self.margin_floor > 1.0 {
            return Err(ConfigError::InvalidMarginFloor(self.margin_floor));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.min_runs, 10);
        assert_eq!(config.base_runs, 10.0);
        assert_eq!(config.margin_floor, 0.1);
        assert!(!config.retain_run_reports);
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
min_runs = 20
retain_run_reports = true
"#,
        )
        .expect("parse");
        assert_eq!(config.min_runs, 20);
        assert!(config.retain_run_reports);
        assert_eq!(config.margin_floor, 0.1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("min_runs = 0"),
            Err(ConfigError::InvalidMinRuns(0))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("base_runs = -1.0"),
            Err(ConfigError::InvalidBaseRuns(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("margin_floor = 0.0"),
            Err(ConfigError::InvalidMarginFloor(_))
        ));
    }

    #[test]
    fn test_wrong_type_is_load_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("min_runs = \"many\""),
            Err(ConfigError::Load(_))
        ));
    }

    // Loading reads LLMTEST_* variables, so these run inside a figment Jail
    // to keep the environment isolated from other tests.

    #[test]
    fn test_load_from_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "max_retained_failures = 2\n")?;
            let config = EngineConfig::load(Some(Path::new("custom.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.max_retained_failures, 2);
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = EngineConfig::load(Some(Path::new("absent.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, EngineConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "min_runs = 20\nmargin_floor = 0.2\n")?;
            jail.set_env("LLMTEST_MIN_RUNS", "30");
            jail.set_env("LLMTEST_RETAIN_RUN_REPORTS", "true");
            // The CLI's config-path variable shares the prefix.
            jail.set_env("LLMTEST_CONFIG", "/nonexistent/llmtest.toml");

            let config = EngineConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.min_runs, 30);
            assert!(config.retain_run_reports);
            assert_eq!(config.margin_floor, 0.2);
            assert_eq!(config.base_runs, DEFAULT_BASE_RUNS);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LLMTEST_MIN_RUNS", "0");
            assert!(matches!(
                EngineConfig::load(None),
                Err(ConfigError::InvalidMinRuns(0))
            ));
            Ok(())
        });
    }
}

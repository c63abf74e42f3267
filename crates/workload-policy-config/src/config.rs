// crates/workload-policy-config/src/config.rs
// ============================================================================
// Module: Workload Policy Configuration
// Description: Configuration loading and validation for the workload policy runtime.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: workload-policy-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to the service defaults; any
//! value that is present must validate or loading fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use workload_policy_core::CancellationMode;
use workload_policy_core::EnforcementEngineConfig;
use workload_policy_core::EvaluationEngineConfig;
use workload_policy_core::EvaluationOptions;
use workload_policy_core::PolicyEnforcerConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "workload-policy.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "WORKLOAD_POLICY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Accepted log levels.
pub(crate) const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
/// Default maximum policies evaluated per workload.
pub(crate) const DEFAULT_MAX_POLICIES: usize = 1000;
/// Upper bound on policies evaluated per workload.
pub(crate) const MAX_MAX_POLICIES: usize = 100_000;
/// Default evaluation timeout in milliseconds.
pub(crate) const DEFAULT_EVALUATION_TIMEOUT_MS: u64 = 10_000;
/// Default concurrent enforcement bound.
pub(crate) const DEFAULT_MAX_CONCURRENT_ENFORCEMENTS: usize = 64;
/// Upper bound on concurrent enforcements.
pub(crate) const MAX_MAX_CONCURRENT_ENFORCEMENTS: usize = 4096;
/// Default action timeout in milliseconds.
pub(crate) const DEFAULT_ACTION_TIMEOUT_MS: u64 = 300_000;
/// Upper bound on any configured timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 24 * 60 * 60 * 1000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Workload policy runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkloadPolicyConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Evaluation engine configuration.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Enforcement configuration.
    #[serde(default)]
    pub enforcement: EnforcementConfig,
}

impl WorkloadPolicyConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// The path is taken from the argument, then `WORKLOAD_POLICY_CONFIG`,
    /// then `workload-policy.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.evaluation.validate()?;
        self.enforcement.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level; `RUST_LOG` overrides it when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
    /// Destination stream.
    #[serde(default)]
    pub output: LogOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}, got {}",
                LOG_LEVELS.join(", "),
                self.level
            )));
        }
        Ok(())
    }
}

/// Log line formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

/// Log destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogOutput {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluation engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EvaluationConfig {
    /// Applicable-policy cap carried by [`Self::evaluation_options`].
    #[serde(default = "default_max_policies")]
    pub max_policies: usize,
    /// Whole-evaluation timeout in milliseconds.
    #[serde(default = "default_evaluation_timeout_ms")]
    pub evaluation_timeout_ms: u64,
    /// Conflict resolution strategy.
    #[serde(default)]
    pub conflict_resolution: ConflictResolutionMode,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_policies: default_max_policies(),
            evaluation_timeout_ms: default_evaluation_timeout_ms(),
            conflict_resolution: ConflictResolutionMode::default(),
        }
    }
}

impl EvaluationConfig {
    /// Validates evaluation configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_policies == 0 || self.max_policies > MAX_MAX_POLICIES {
            return Err(ConfigError::Invalid(format!(
                "evaluation.max_policies must be between 1 and {MAX_MAX_POLICIES}"
            )));
        }
        validate_timeout("evaluation.evaluation_timeout_ms", self.evaluation_timeout_ms)
    }

    /// Converts into evaluation engine settings.
    #[must_use]
    pub const fn engine_config(&self) -> EvaluationEngineConfig {
        EvaluationEngineConfig {
            evaluation_timeout: Duration::from_millis(self.evaluation_timeout_ms),
        }
    }

    /// Builds call options that cap applicable policies at `max_policies`.
    #[must_use]
    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            max_policies: self.max_policies,
            ..EvaluationOptions::default()
        }
    }
}

/// Conflict resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolutionMode {
    /// Highest-scoring result wins.
    #[default]
    Priority,
}

// ============================================================================
// SECTION: Enforcement
// ============================================================================

/// Enforcement configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnforcementConfig {
    /// Maximum enforcements running at once.
    #[serde(default = "default_max_concurrent_enforcements")]
    pub max_concurrent_enforcements: usize,
    /// Deadline for actions without their own timeout, in milliseconds.
    #[serde(default = "default_action_timeout_ms")]
    pub default_action_timeout_ms: u64,
    /// Cancellation behaviour.
    #[serde(default)]
    pub cancellation: CancellationSetting,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            max_concurrent_enforcements: default_max_concurrent_enforcements(),
            default_action_timeout_ms: default_action_timeout_ms(),
            cancellation: CancellationSetting::default(),
        }
    }
}

impl EnforcementConfig {
    /// Validates enforcement configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_enforcements == 0
            || self.max_concurrent_enforcements > MAX_MAX_CONCURRENT_ENFORCEMENTS
        {
            return Err(ConfigError::Invalid(format!(
                "enforcement.max_concurrent_enforcements must be between 1 and \
                 {MAX_MAX_CONCURRENT_ENFORCEMENTS}"
            )));
        }
        validate_timeout("enforcement.default_action_timeout_ms", self.default_action_timeout_ms)
    }

    /// Converts into enforcement engine settings.
    #[must_use]
    pub const fn engine_config(&self) -> EnforcementEngineConfig {
        EnforcementEngineConfig {
            default_action_timeout: Duration::from_millis(self.default_action_timeout_ms),
        }
    }

    /// Converts into policy enforcer settings.
    #[must_use]
    pub const fn enforcer_config(&self) -> PolicyEnforcerConfig {
        PolicyEnforcerConfig {
            max_concurrent_enforcements: self.max_concurrent_enforcements,
            cancellation: self.cancellation.mode(),
        }
    }
}

/// Cancellation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CancellationSetting {
    /// Cancellation interrupts the running plan.
    #[default]
    Cooperative,
    /// Cancellation only updates the reported status.
    StatusOnly,
}

impl CancellationSetting {
    /// Returns the runtime cancellation mode.
    #[must_use]
    pub const fn mode(self) -> CancellationMode {
        match self {
            Self::Cooperative => CancellationMode::Cooperative,
            Self::StatusOnly => CancellationMode::StatusOnly,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Requires a timeout within `1..=MAX_TIMEOUT_MS`.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Default log level.
fn default_log_level() -> String {
    "info".to_string()
}

/// Default policy cap.
pub(crate) const fn default_max_policies() -> usize {
    DEFAULT_MAX_POLICIES
}

/// Default evaluation timeout.
pub(crate) const fn default_evaluation_timeout_ms() -> u64 {
    DEFAULT_EVALUATION_TIMEOUT_MS
}

/// Default concurrent enforcement bound.
pub(crate) const fn default_max_concurrent_enforcements() -> usize {
    DEFAULT_MAX_CONCURRENT_ENFORCEMENTS
}

/// Default action timeout.
pub(crate) const fn default_action_timeout_ms() -> u64 {
    DEFAULT_ACTION_TIMEOUT_MS
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn validate_path_rejects_long_component() {
        let path = PathBuf::from(format!("./{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1)));
        let err = validate_path(&path).unwrap_err();
        assert!(err.to_string().contains("component too long"));
    }

    #[test]
    fn validate_path_accepts_component_at_max() {
        let path = PathBuf::from(format!("./{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH)));
        assert!(validate_path(&path).is_ok());
    }

    #[test]
    fn validate_path_rejects_total_length() {
        let path = PathBuf::from("a/".repeat(MAX_TOTAL_PATH_LENGTH / 2 + 1));
        let err = validate_path(&path).unwrap_err();
        assert!(err.to_string().contains("max length"));
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn timeout_bounds_are_inclusive() {
        assert!(validate_timeout("t", 1).is_ok());
        assert!(validate_timeout("t", MAX_TIMEOUT_MS).is_ok());
        assert!(validate_timeout("t", 0).is_err());
        assert!(validate_timeout("t", MAX_TIMEOUT_MS + 1).is_err());
    }
}

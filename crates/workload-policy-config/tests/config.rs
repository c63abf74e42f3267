// crates/workload-policy-config/tests/config.rs
// ============================================================================
// Module: Configuration Loading Tests
// Description: Load, default, and validate workload-policy.toml files.
// Purpose: Ensure config parsing fails closed and maps onto runtime settings.
// ============================================================================

//! Configuration loading tests for workload-policy-config.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use workload_policy_config::CancellationSetting;
use workload_policy_config::ConfigError;
use workload_policy_config::LogFormat;
use workload_policy_config::LogOutput;
use workload_policy_config::WorkloadPolicyConfig;
use workload_policy_core::CancellationMode;

type TestResult = Result<(), String>;

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

fn assert_invalid(result: Result<WorkloadPolicyConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn empty_file_yields_service_defaults() -> TestResult {
    let file = write_config("")?;
    let config = WorkloadPolicyConfig::load(Some(file.path())).map_err(|err| err.to_string())?;

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.output, LogOutput::Stdout);
    assert_eq!(config.evaluation.max_policies, 1000);
    assert_eq!(config.evaluation.evaluation_timeout_ms, 10_000);
    assert_eq!(config.enforcement.max_concurrent_enforcements, 64);
    assert_eq!(config.enforcement.default_action_timeout_ms, 300_000);
    assert_eq!(config.enforcement.cancellation, CancellationSetting::Cooperative);
    Ok(())
}

#[test]
fn sections_override_defaults_and_convert() -> TestResult {
    let file = write_config(
        r#"
[logging]
level = "debug"
format = "text"
output = "stderr"

[evaluation]
max_policies = 25
evaluation_timeout_ms = 2500
conflict_resolution = "priority"

[enforcement]
max_concurrent_enforcements = 4
default_action_timeout_ms = 1500
cancellation = "status_only"
"#,
    )?;
    let config = WorkloadPolicyConfig::load(Some(file.path())).map_err(|err| err.to_string())?;

    assert_eq!(config.logging.format, LogFormat::Text);
    assert_eq!(config.logging.output, LogOutput::Stderr);

    let engine = config.evaluation.engine_config();
    assert_eq!(config.evaluation.evaluation_options().max_policies, 25);
    assert_eq!(engine.evaluation_timeout, Duration::from_millis(2500));

    let enforcer = config.enforcement.enforcer_config();
    assert_eq!(enforcer.max_concurrent_enforcements, 4);
    assert_eq!(enforcer.cancellation, CancellationMode::StatusOnly);
    assert_eq!(
        config.enforcement.engine_config().default_action_timeout,
        Duration::from_millis(1500)
    );
    Ok(())
}

#[test]
fn unknown_log_level_is_rejected() -> TestResult {
    assert_invalid(WorkloadPolicyConfig::from_toml("[logging]\nlevel = \"loud\""), "logging.level")
}

#[test]
fn zero_max_policies_is_rejected() -> TestResult {
    assert_invalid(
        WorkloadPolicyConfig::from_toml("[evaluation]\nmax_policies = 0"),
        "evaluation.max_policies",
    )
}

#[test]
fn zero_action_timeout_is_rejected() -> TestResult {
    assert_invalid(
        WorkloadPolicyConfig::from_toml("[enforcement]\ndefault_action_timeout_ms = 0"),
        "enforcement.default_action_timeout_ms",
    )
}

#[test]
fn oversized_concurrency_is_rejected() -> TestResult {
    assert_invalid(
        WorkloadPolicyConfig::from_toml("[enforcement]\nmax_concurrent_enforcements = 100000"),
        "enforcement.max_concurrent_enforcements",
    )
}

#[test]
fn unknown_cancellation_mode_is_a_parse_error() {
    let result = WorkloadPolicyConfig::from_toml("[enforcement]\ncancellation = \"abort\"");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let result = WorkloadPolicyConfig::from_toml("[logging");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = WorkloadPolicyConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    let file = write_config(&padding)?;
    assert_invalid(WorkloadPolicyConfig::load(Some(file.path())), "size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xff, 0xfe, 0xfd]).map_err(|err| err.to_string())?;
    assert_invalid(WorkloadPolicyConfig::load(Some(file.path())), "utf-8")
}

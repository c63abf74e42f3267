// crates/workload-policy-config/src/logging.rs
// ============================================================================
// Module: Logging Initialisation
// Description: Installs the global tracing subscriber from logging config.
// Purpose: Route runtime events to stdout or stderr as JSON or text.
// Dependencies: tracing-subscriber, thiserror
// ============================================================================

//! ## Overview
//! [`init_logging`] installs one global subscriber per process. The level
//! comes from `RUST_LOG` when it is set and parses, otherwise from the
//! config. Repeated initialisation is reported as an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;
use crate::config::LogOutput;
use crate::config::LoggingConfig;

// ============================================================================
// SECTION: State
// ============================================================================

/// Set once the global subscriber has been claimed.
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging initialisation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoggingError {
    /// Logging was already initialised in this process.
    #[error("logging has already been initialized")]
    AlreadyInitialized,
    /// The configured level is not a valid filter directive.
    #[error("invalid log level {0}")]
    InvalidLevel(String),
    /// The subscriber could not be installed.
    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

// ============================================================================
// SECTION: Initialisation
// ============================================================================

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::AlreadyInitialized`] on every call after the
/// first, [`LoggingError::InvalidLevel`] for an unparsable level, and
/// [`LoggingError::Subscriber`] when another subscriber is already global.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let fallback = EnvFilter::try_new(&config.level)
        .map_err(|_| LoggingError::InvalidLevel(config.level.clone()))?;
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(LoggingError::AlreadyInitialized);
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or(fallback);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (config.format, config.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            fmt::layer().json().with_writer(std::io::stdout).boxed()
        }
        (LogFormat::Json, LogOutput::Stderr) => {
            fmt::layer().json().with_writer(std::io::stderr).boxed()
        }
        (LogFormat::Text, LogOutput::Stdout) => fmt::layer().with_writer(std::io::stdout).boxed(),
        (LogFormat::Text, LogOutput::Stderr) => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|err| LoggingError::Subscriber(err.to_string()))?;
    info!(level = %config.level, "logging initialized");
    Ok(())
}

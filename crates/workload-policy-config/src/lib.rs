// crates/workload-policy-config/src/lib.rs
// ============================================================================
// Module: Workload Policy Config Library
// Description: Canonical config model, validation, and logging setup.
// Purpose: Single source of truth for workload-policy.toml semantics.
// Dependencies: workload-policy-core, serde, toml, tracing-subscriber
// ============================================================================

//! ## Overview
//! `workload-policy-config` defines the configuration model for the
//! workload policy runtime. It validates fail-closed, converts sections into
//! the core runtime settings, and installs the tracing subscriber described
//! by the logging section.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod logging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use logging::LoggingError;
pub use logging::init_logging;

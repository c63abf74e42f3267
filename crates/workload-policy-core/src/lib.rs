// crates/workload-policy-core/src/lib.rs
// ============================================================================
// Module: Workload Policy Core Library
// Description: Public API surface for the workload policy core.
// Purpose: Expose core types, collaborator interfaces, and runtime services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Workload policy core evaluates workloads against cost, automation, and
//! priority policies, resolves conflicts between the results, and enforces
//! the recommended decisions through pluggable action executors. Storage and
//! condition evaluation are reached through explicit interfaces so durable
//! backends can be supplied by the embedding service.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ActionExecutor;
pub use interfaces::ConditionEvaluator;
pub use interfaces::DecisionStore;
pub use interfaces::EvaluationStore;
pub use interfaces::PolicyStore;
pub use interfaces::Storage;
pub use interfaces::WorkloadStore;
pub use runtime::CancellationMode;
pub use runtime::ConflictResolver;
pub use runtime::EnforcementEngine;
pub use runtime::EnforcementEngineConfig;
pub use runtime::EvaluationEngine;
pub use runtime::EvaluationEngineConfig;
pub use runtime::FieldConditionEvaluator;
pub use runtime::InMemoryStorage;
pub use runtime::PolicyEnforcer;
pub use runtime::PolicyEnforcerConfig;
pub use runtime::PolicyEvaluator;
pub use runtime::register_builtin_executors;

// crates/workload-policy-core/src/runtime/mod.rs
// ============================================================================
// Module: Workload Policy Runtime
// Description: Evaluation, conflict resolution, and enforcement services.
// Purpose: Score workloads against policies and carry out the resulting decisions.
// Dependencies: crate::{core, interfaces}, tokio, tracing
// ============================================================================

//! ## Overview
//! The evaluation half scores a workload against its applicable policies,
//! reconciles conflicting results, and synthesises a recommended decision.
//! The enforcement half turns a decision into an ordered action plan and
//! runs it through registered executors. In-memory stores and a field-rule
//! condition evaluator make the runtime usable without external services.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod comparator;
pub mod condition;
pub mod conflict;
pub mod enforcement;
pub mod enforcer;
pub mod engine;
pub mod evaluator;
pub mod executors;
pub mod plan;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use comparator::Operator;
pub use condition::FieldConditionEvaluator;
pub use condition::workload_context;
pub use conflict::ConflictResolver;
pub use enforcement::EnforcementEngine;
pub use enforcement::EnforcementEngineConfig;
pub use enforcer::CancellationMode;
pub use enforcer::PolicyEnforcer;
pub use enforcer::PolicyEnforcerConfig;
pub use engine::EvaluationEngine;
pub use engine::EvaluationEngineConfig;
pub use evaluator::PolicyEvaluator;
pub use executors::NotifyExecutor;
pub use executors::WorkloadStatusExecutor;
pub use executors::register_builtin_executors;
pub use plan::generate_actions;
pub use store::InMemoryDecisionStore;
pub use store::InMemoryEvaluationStore;
pub use store::InMemoryPolicyStore;
pub use store::InMemoryStorage;
pub use store::InMemoryWorkloadStore;

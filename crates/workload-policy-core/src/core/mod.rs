// crates/workload-policy-core/src/core/mod.rs
// ============================================================================
// Module: Workload Policy Core Types
// Description: Data model shared by evaluation and enforcement.
// Purpose: Group workload, policy, decision, evaluation, and enforcement records.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types are plain data records plus the error taxonomy. They carry no
//! runtime behaviour beyond small lifecycle helpers.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod decision;
pub mod enforcement;
pub mod errors;
pub mod evaluation;
pub mod identifiers;
pub mod policy;
pub mod time;
pub mod workload;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use decision::Decision;
pub use decision::DecisionMetadata;
pub use decision::DecisionReason;
pub use decision::DecisionStatus;
pub use decision::DecisionType;
pub use enforcement::Action;
pub use enforcement::ActionResult;
pub use enforcement::ActionType;
pub use enforcement::Backoff;
pub use enforcement::EnforcementEvent;
pub use enforcement::EnforcementState;
pub use enforcement::EnforcementStatus;
pub use enforcement::RetryPolicy;
pub use errors::AutomationError;
pub use errors::DecisionError;
pub use errors::EnforcementError;
pub use errors::EvaluationError;
pub use errors::PolicyError;
pub use errors::StorageError;
pub use errors::WorkloadError;
pub use evaluation::ConflictInfo;
pub use evaluation::ConflictResolution;
pub use evaluation::ConflictSeverity;
pub use evaluation::ConflictType;
pub use evaluation::Constraint;
pub use evaluation::EvaluationContext;
pub use evaluation::EvaluationOptions;
pub use evaluation::EvaluationResult;
pub use evaluation::Recommendation;
pub use evaluation::ResolutionStrategy;
pub use evaluation::Violation;
pub use identifiers::DecisionId;
pub use identifiers::EvaluationId;
pub use identifiers::WorkloadId;
pub use policy::AutomationAction;
pub use policy::AutomationCondition;
pub use policy::AutomationRuleSpec;
pub use policy::CostConstraints;
pub use policy::CostOptimizationSpec;
pub use policy::GenericPolicySpec;
pub use policy::OptimizationObjective;
pub use policy::Policy;
pub use policy::PolicyMetadata;
pub use policy::PolicySpec;
pub use policy::PolicyStatus;
pub use policy::PolicyType;
pub use policy::PriorityClass;
pub use policy::WorkloadMapping;
pub use policy::WorkloadPrioritySpec;
pub use time::Timestamp;
pub use workload::GpuRequirements;
pub use workload::NetworkRequirements;
pub use workload::NpuRequirements;
pub use workload::Priority;
pub use workload::ResourceRequirements;
pub use workload::Workload;
pub use workload::WorkloadConstraints;
pub use workload::WorkloadMetadata;
pub use workload::WorkloadStatus;
pub use workload::WorkloadType;

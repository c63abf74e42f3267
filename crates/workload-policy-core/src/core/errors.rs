// crates/workload-policy-core/src/core/errors.rs
// ============================================================================
// Module: Workload Policy Error Taxonomy
// Description: Error kinds shared by evaluation, storage, and enforcement.
// Purpose: Give every failure a stable, programmatically matchable kind.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Errors are grouped by the entity or subsystem they concern. Messages are
//! surfaced verbatim by the service layer, so payload strings carry the
//! identifying context (policy name, decision id, action type).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::DecisionId;

// ============================================================================
// SECTION: Policy Errors
// ============================================================================

/// Policy definition and lifecycle errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Policy was not found.
    #[error("policy not found: {0}")]
    NotFound(String),
    /// Policy name is missing or malformed.
    #[error("invalid policy name: {0}")]
    InvalidName(String),
    /// Policy kind is unknown or unsupported.
    #[error("invalid policy type: {0}")]
    InvalidType(String),
    /// Policy priority is out of range.
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    /// Type-specific validation failed.
    #[error("policy validation failed: {0}")]
    Validation(String),
    /// Policy contradicts another policy.
    #[error("policy conflict detected: {0}")]
    Conflict(String),
    /// Policy is inactive.
    #[error("policy is inactive: {0}")]
    Inactive(String),
    /// Policy is archived.
    #[error("policy is archived: {0}")]
    Archived(String),
}

// ============================================================================
// SECTION: Workload Errors
// ============================================================================

/// Workload state errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkloadError {
    /// Workload was not found.
    #[error("workload not found: {0}")]
    NotFound(String),
    /// Workload type is unknown.
    #[error("invalid workload type: {0}")]
    InvalidType(String),
    /// Workload status does not allow the operation.
    #[error("invalid workload status: {0}")]
    InvalidStatus(String),
    /// Requested resources are unavailable.
    #[error("insufficient resources: {0}")]
    InsufficientResources(String),
    /// Workload is not running.
    #[error("workload is not running: {0}")]
    NotRunning(String),
}

// ============================================================================
// SECTION: Decision Errors
// ============================================================================

/// Decision lifecycle errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// Decision was not found.
    #[error("decision not found: {0}")]
    NotFound(String),
    /// Decision type is unknown.
    #[error("invalid decision type: {0}")]
    InvalidType(String),
    /// Requested status transition is not allowed.
    #[error("invalid decision status: {0}")]
    InvalidStatus(String),
    /// Decision has not been approved.
    #[error("decision is not approved: {0}")]
    NotApproved(String),
    /// Decision is already executing.
    #[error("decision is already executing: {0}")]
    AlreadyExecuting(String),
    /// Decision already reached a terminal state.
    #[error("decision is already completed: {0}")]
    AlreadyCompleted(String),
    /// Decision execution failed.
    #[error("decision execution failed: {0}")]
    ExecutionFailed(String),
}

// ============================================================================
// SECTION: Storage Errors
// ============================================================================

/// Storage collaborator errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backend connection failed.
    #[error("storage connection failed: {0}")]
    Connection(String),
    /// Backend operation failed.
    #[error("storage operation failed: {0}")]
    Operation(String),
    /// Requested record does not exist.
    #[error("storage resource not found: {0}")]
    NotFound(String),
    /// Record already exists.
    #[error("storage conflict: {0}")]
    Conflict(String),
    /// Backend operation timed out.
    #[error("storage operation timeout: {0}")]
    Timeout(String),
    /// Caller is not authorized.
    #[error("storage unauthorized: {0}")]
    Unauthorized(String),
}

// ============================================================================
// SECTION: Automation Errors
// ============================================================================

/// Condition and rule evaluation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    /// Rule was not found.
    #[error("automation rule not found: {0}")]
    RuleNotFound(String),
    /// Condition expression is malformed.
    #[error("invalid rule condition: {0}")]
    InvalidCondition(String),
    /// Rule action is malformed.
    #[error("invalid rule action: {0}")]
    InvalidAction(String),
    /// Rule evaluation failed.
    #[error("rule execution failed: {0}")]
    ExecutionFailed(String),
    /// Rule evaluation timed out.
    #[error("rule execution timeout: {0}")]
    Timeout(String),
}

// ============================================================================
// SECTION: Evaluation Errors
// ============================================================================

/// Evaluation pipeline errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// Evaluation failed for a reason not covered by other variants.
    #[error("policy evaluation failed: {0}")]
    Failed(String),
    /// A single policy failed to evaluate.
    #[error("evaluation of policy {policy} failed: {message}")]
    Policy {
        /// Name of the failing policy.
        policy: String,
        /// Failure detail.
        message: String,
    },
    /// Policy kind has no scoring strategy.
    #[error("unsupported policy type: {0}")]
    UnsupportedPolicyType(String),
    /// No policy applied to the workload.
    #[error("no applicable policies found")]
    NoApplicablePolicies,
    /// Evaluation exceeded its deadline.
    #[error("policy evaluation timeout: {0}")]
    Timeout(String),
    /// Caller supplied invalid input.
    #[error("invalid evaluation input: {0}")]
    InvalidInput(String),
    /// A subsystem failed its health check.
    #[error("{component} health check failed: {message}")]
    Health {
        /// Failing subsystem.
        component: String,
        /// Failure detail.
        message: String,
    },
    /// Storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Policy definition was rejected.
    #[error(transparent)]
    InvalidPolicy(#[from] PolicyError),
}

// ============================================================================
// SECTION: Enforcement Errors
// ============================================================================

/// Enforcement subsystem errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnforcementError {
    /// No executor is registered for the action type.
    #[error("executor for action type {0} not found")]
    ExecutorNotFound(String),
    /// Action failed executor validation.
    #[error("invalid action: {0}")]
    InvalidAction(String),
    /// Executor reported a failure.
    #[error("action execution failed: {0}")]
    ExecutionFailed(String),
    /// Context deadline elapsed.
    #[error("deadline exceeded: {0}")]
    Timeout(String),
    /// Context was cancelled.
    #[error("context cancelled: {0}")]
    Cancelled(String),
    /// Enforcement is already running for the decision.
    #[error("enforcement already in progress for decision {0}")]
    AlreadyInProgress(DecisionId),
    /// No enforcement status is tracked for the decision.
    #[error("enforcement status not found for decision {0}")]
    StatusNotFound(DecisionId),
    /// Enforcement state does not allow the operation.
    #[error("cannot cancel enforcement in state {state}")]
    InvalidState {
        /// Current state label.
        state: String,
    },
    /// Decision type has no action generator.
    #[error("unsupported decision type: {0}")]
    UnsupportedDecision(String),
    /// One or more batch submissions were rejected.
    #[error("failed to enforce {count} decisions: {details}")]
    Batch {
        /// Number of rejected decisions.
        count: usize,
        /// Joined rejection messages.
        details: String,
    },
    /// A subsystem failed its health check.
    #[error("{component} health check failed: {message}")]
    Health {
        /// Failing subsystem.
        component: String,
        /// Failure detail.
        message: String,
    },
    /// Storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Workload state rejected the action.
    #[error(transparent)]
    Workload(#[from] WorkloadError),
}

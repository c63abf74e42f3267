// crates/workload-policy-core/src/interfaces/mod.rs
// ============================================================================
// Module: Workload Policy Interfaces
// Description: Collaborator contracts for storage, conditions, and executors.
// Purpose: Define the seams the runtime depends on without binding a backend.
// Dependencies: crate::core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! The runtime depends on three kinds of collaborators: entity stores
//! grouped behind a [`Storage`] manager, a [`ConditionEvaluator`] used by
//! automation policies, and [`ActionExecutor`] implementations registered
//! with the enforcement engine. Stores are treated as already synchronized;
//! the runtime issues one logical operation per entity at a time and relies
//! on last-writer-wins semantics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Action;
use crate::core::ActionResult;
use crate::core::ActionType;
use crate::core::AutomationError;
use crate::core::Decision;
use crate::core::DecisionId;
use crate::core::EnforcementError;
use crate::core::EvaluationId;
use crate::core::EvaluationResult;
use crate::core::Policy;
use crate::core::PolicyType;
use crate::core::StorageError;
use crate::core::Workload;
use crate::core::WorkloadId;

// ============================================================================
// SECTION: Entity Stores
// ============================================================================

/// Policy persistence keyed by policy name.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Inserts a new policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] when the name is taken.
    async fn create(&self, policy: Policy) -> Result<(), StorageError>;

    /// Loads a policy by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the policy does not exist.
    async fn get(&self, name: &str) -> Result<Policy, StorageError>;

    /// Replaces an existing policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the policy does not exist.
    async fn update(&self, policy: Policy) -> Result<(), StorageError>;

    /// Removes a policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the policy does not exist.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Lists every stored policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    async fn list(&self) -> Result<Vec<Policy>, StorageError>;

    /// Lists policies whose status is active.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    async fn get_active_policies(&self) -> Result<Vec<Policy>, StorageError>;

    /// Lists policies of one kind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    async fn get_by_type(&self, policy_type: PolicyType) -> Result<Vec<Policy>, StorageError>;

    /// Reports backend readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend is unavailable.
    async fn health(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Workload persistence.
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Inserts a new workload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] when the id is taken.
    async fn create(&self, workload: Workload) -> Result<(), StorageError>;

    /// Loads a workload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the workload does not exist.
    async fn get(&self, id: &WorkloadId) -> Result<Workload, StorageError>;

    /// Replaces an existing workload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the workload does not exist.
    async fn update(&self, workload: Workload) -> Result<(), StorageError>;

    /// Removes a workload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the workload does not exist.
    async fn delete(&self, id: &WorkloadId) -> Result<(), StorageError>;

    /// Lists every stored workload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    async fn list(&self) -> Result<Vec<Workload>, StorageError>;

    /// Reports backend readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend is unavailable.
    async fn health(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Decision persistence.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Inserts a new decision.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] when the id is taken.
    async fn create(&self, decision: Decision) -> Result<(), StorageError>;

    /// Loads a decision.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the decision does not exist.
    async fn get(&self, id: &DecisionId) -> Result<Decision, StorageError>;

    /// Replaces an existing decision.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the decision does not exist.
    async fn update(&self, decision: Decision) -> Result<(), StorageError>;

    /// Removes a decision.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the decision does not exist.
    async fn delete(&self, id: &DecisionId) -> Result<(), StorageError>;

    /// Lists decisions targeting a workload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    async fn list_by_workload(&self, workload_id: &WorkloadId)
    -> Result<Vec<Decision>, StorageError>;

    /// Reports backend readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend is unavailable.
    async fn health(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Evaluation record persistence.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Inserts a new evaluation result.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] when the id is taken.
    async fn create(&self, result: EvaluationResult) -> Result<(), StorageError>;

    /// Loads an evaluation result.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the record does not exist.
    async fn get(&self, id: &EvaluationId) -> Result<EvaluationResult, StorageError>;

    /// Lists results recorded for a workload, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    async fn list_by_workload(
        &self,
        workload_id: &WorkloadId,
    ) -> Result<Vec<EvaluationResult>, StorageError>;

    /// Reports backend readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend is unavailable.
    async fn health(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Storage manager grouping the entity stores.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the policy store.
    fn policies(&self) -> &dyn PolicyStore;

    /// Returns the workload store.
    fn workloads(&self) -> &dyn WorkloadStore;

    /// Returns the decision store.
    fn decisions(&self) -> &dyn DecisionStore;

    /// Returns the evaluation store.
    fn evaluations(&self) -> &dyn EvaluationStore;

    /// Checks every entity store, naming the first unhealthy one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] from the first failing store.
    async fn health(&self) -> Result<(), StorageError> {
        self.policies()
            .health()
            .await
            .map_err(|err| StorageError::Connection(format!("policy store: {err}")))?;
        self.workloads()
            .health()
            .await
            .map_err(|err| StorageError::Connection(format!("workload store: {err}")))?;
        self.decisions()
            .health()
            .await
            .map_err(|err| StorageError::Connection(format!("decision store: {err}")))?;
        self.evaluations()
            .health()
            .await
            .map_err(|err| StorageError::Connection(format!("evaluation store: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Condition Evaluator
// ============================================================================

/// Evaluates condition expressions against a JSON context.
pub trait ConditionEvaluator: Send + Sync {
    /// Evaluates a boolean condition.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError`] when the condition is malformed or does not
    /// produce a boolean.
    fn evaluate_condition(&self, expression: &str, context: &Value)
    -> Result<bool, AutomationError>;

    /// Evaluates an expression to a value.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError`] when the expression is malformed.
    fn evaluate_expression(
        &self,
        expression: &str,
        context: &Value,
    ) -> Result<Value, AutomationError>;

    /// Checks that an expression is well formed without evaluating it.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::InvalidCondition`] when the rule is rejected.
    fn validate_rule(&self, expression: &str) -> Result<(), AutomationError>;

    /// Reports evaluator readiness.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError`] when the evaluator cannot serve requests.
    fn health(&self) -> Result<(), AutomationError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Action Executor
// ============================================================================

/// Pluggable handler for one or more action types.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Returns true when this executor handles the action type.
    fn can_execute(&self, action_type: ActionType) -> bool;

    /// Checks an action before execution.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::InvalidAction`] when the action is malformed.
    fn validate(&self, action: &Action) -> Result<(), EnforcementError> {
        if action.target.trim().is_empty() {
            return Err(EnforcementError::InvalidAction(format!(
                "action {} requires a target",
                action.action_type.as_str()
            )));
        }
        Ok(())
    }

    /// Performs the action.
    ///
    /// Business-level failures are reported as an unsuccessful
    /// [`ActionResult`]; errors are reserved for infrastructure failures.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError`] when the executor cannot run the action.
    async fn execute(&self, action: &Action) -> Result<ActionResult, EnforcementError>;

    /// Reports executor readiness.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError`] when the executor cannot serve requests.
    async fn health(&self) -> Result<(), EnforcementError> {
        Ok(())
    }
}

// crates/workload-policy-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared fixtures for workload policy integration tests.
// Purpose: Build workloads, policies, storage, and scripted executors.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use workload_policy_core::Action;
use workload_policy_core::ActionExecutor;
use workload_policy_core::ActionResult;
use workload_policy_core::ActionType;
use workload_policy_core::AutomationCondition;
use workload_policy_core::AutomationRuleSpec;
use workload_policy_core::CostOptimizationSpec;
use workload_policy_core::Decision;
use workload_policy_core::DecisionId;
use workload_policy_core::DecisionStore;
use workload_policy_core::EnforcementError;
use workload_policy_core::EvaluationId;
use workload_policy_core::EvaluationResult;
use workload_policy_core::EvaluationStore;
use workload_policy_core::InMemoryStorage;
use workload_policy_core::Policy;
use workload_policy_core::PolicyMetadata;
use workload_policy_core::PolicySpec;
use workload_policy_core::PolicyStore;
use workload_policy_core::PolicyStatus;
use workload_policy_core::Priority;
use workload_policy_core::Storage;
use workload_policy_core::StorageError;
use workload_policy_core::Workload;
use workload_policy_core::WorkloadId;
use workload_policy_core::WorkloadPrioritySpec;
use workload_policy_core::WorkloadStore;
use workload_policy_core::WorkloadType;
use workload_policy_core::runtime::InMemoryDecisionStore;
use workload_policy_core::runtime::InMemoryEvaluationStore;
use workload_policy_core::runtime::InMemoryPolicyStore;
use workload_policy_core::runtime::InMemoryWorkloadStore;

/// Returns empty shared storage.
pub fn storage() -> Arc<dyn Storage> {
    Arc::new(InMemoryStorage::new())
}

/// Builds a workload with the given id and type.
pub fn workload(id: &str, workload_type: WorkloadType) -> Workload {
    let mut workload = Workload::new(id, workload_type);
    workload.name = id.to_string();
    workload
}

/// Builds an active cost policy.
pub fn cost_policy(name: &str, priority: i32) -> Policy {
    Policy::new(
        PolicyMetadata::new(name, Priority::new(priority)),
        PolicyStatus::Active,
        PolicySpec::CostOptimization(CostOptimizationSpec::default()),
    )
}

/// Builds an active workload priority policy.
pub fn priority_policy(name: &str, priority: i32) -> Policy {
    Policy::new(
        PolicyMetadata::new(name, Priority::new(priority)),
        PolicyStatus::Active,
        PolicySpec::WorkloadPriority(WorkloadPrioritySpec::default()),
    )
}

/// Builds an active automation policy with `field op value` conditions.
pub fn automation_policy(name: &str, conditions: &[(&str, &str, serde_json::Value)]) -> Policy {
    let conditions = conditions
        .iter()
        .map(|(field, operator, value)| AutomationCondition {
            field: (*field).to_string(),
            operator: (*operator).to_string(),
            value: value.clone(),
            duration: None,
        })
        .collect();
    Policy::new(
        PolicyMetadata::new(name, Priority::NORMAL),
        PolicyStatus::Active,
        PolicySpec::Automation(AutomationRuleSpec {
            conditions,
            actions: Vec::new(),
        }),
    )
}

/// Returns a copy of the policy with a different status.
pub fn with_status(mut policy: Policy, status: PolicyStatus) -> Policy {
    policy.status = status;
    policy
}

/// Scripted executor outcome for one attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Successful result.
    Succeed,
    /// Unsuccessful result.
    Fail,
    /// Executor error.
    Error,
}

/// Executor that replays scripted outcomes and records attempts.
pub struct ScriptedExecutor {
    /// Handled action type.
    pub action_type: ActionType,
    /// Outcomes consumed in order; the last one repeats.
    pub script: Mutex<Vec<Outcome>>,
    /// Delay before every attempt.
    pub delay: Duration,
    /// Attempts made so far.
    pub attempts: Mutex<u32>,
}

impl ScriptedExecutor {
    /// Creates an executor for one action type.
    pub fn new(action_type: ActionType, script: Vec<Outcome>) -> Self {
        Self {
            action_type,
            script: Mutex::new(script),
            delay: Duration::ZERO,
            attempts: Mutex::new(0),
        }
    }

    /// Adds a per-attempt delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the attempt count.
    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    fn can_execute(&self, action_type: ActionType) -> bool {
        action_type == self.action_type
    }

    async fn execute(&self, action: &Action) -> Result<ActionResult, EnforcementError> {
        *self.attempts.lock().unwrap() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let outcome = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 { script.remove(0) } else { script[0].clone() }
        };
        match outcome {
            Outcome::Succeed => Ok(ActionResult::succeeded(action.action_type, "scripted success")),
            Outcome::Fail => Ok(ActionResult::failed(
                action.action_type,
                "scripted failure",
                "scripted failure",
            )),
            Outcome::Error => Err(EnforcementError::ExecutionFailed("scripted error".to_string())),
        }
    }
}

/// Evaluation store whose inserts stall before delegating.
#[derive(Debug, Default)]
pub struct SlowEvaluationStore {
    /// Backing store.
    pub inner: InMemoryEvaluationStore,
    /// Delay before every insert.
    pub create_delay: Duration,
}

#[async_trait]
impl EvaluationStore for SlowEvaluationStore {
    async fn create(&self, result: EvaluationResult) -> Result<(), StorageError> {
        tokio::time::sleep(self.create_delay).await;
        self.inner.create(result).await
    }

    async fn get(&self, id: &EvaluationId) -> Result<EvaluationResult, StorageError> {
        self.inner.get(id).await
    }

    async fn list_by_workload(
        &self,
        workload_id: &WorkloadId,
    ) -> Result<Vec<EvaluationResult>, StorageError> {
        self.inner.list_by_workload(workload_id).await
    }
}

/// Decision store whose updates stall before delegating.
#[derive(Debug, Default)]
pub struct SlowDecisionStore {
    /// Backing store.
    pub inner: InMemoryDecisionStore,
    /// Delay before every update.
    pub update_delay: Duration,
}

#[async_trait]
impl DecisionStore for SlowDecisionStore {
    async fn create(&self, decision: Decision) -> Result<(), StorageError> {
        self.inner.create(decision).await
    }

    async fn get(&self, id: &DecisionId) -> Result<Decision, StorageError> {
        self.inner.get(id).await
    }

    async fn update(&self, decision: Decision) -> Result<(), StorageError> {
        tokio::time::sleep(self.update_delay).await;
        self.inner.update(decision).await
    }

    async fn delete(&self, id: &DecisionId) -> Result<(), StorageError> {
        self.inner.delete(id).await
    }

    async fn list_by_workload(
        &self,
        workload_id: &WorkloadId,
    ) -> Result<Vec<Decision>, StorageError> {
        self.inner.list_by_workload(workload_id).await
    }
}

/// Storage with configurable latency on evaluation inserts and decision updates.
#[derive(Debug, Default)]
pub struct SlowStorage {
    /// Policy store.
    pub policies: InMemoryPolicyStore,
    /// Workload store.
    pub workloads: InMemoryWorkloadStore,
    /// Decision store.
    pub decisions: SlowDecisionStore,
    /// Evaluation store.
    pub evaluations: SlowEvaluationStore,
}

impl SlowStorage {
    /// Stalls every evaluation insert.
    pub fn with_evaluation_delay(mut self, delay: Duration) -> Self {
        self.evaluations.create_delay = delay;
        self
    }

    /// Stalls every decision update.
    pub fn with_decision_update_delay(mut self, delay: Duration) -> Self {
        self.decisions.update_delay = delay;
        self
    }
}

#[async_trait]
impl Storage for SlowStorage {
    fn policies(&self) -> &dyn PolicyStore {
        &self.policies
    }

    fn workloads(&self) -> &dyn WorkloadStore {
        &self.workloads
    }

    fn decisions(&self) -> &dyn DecisionStore {
        &self.decisions
    }

    fn evaluations(&self) -> &dyn EvaluationStore {
        &self.evaluations
    }
}

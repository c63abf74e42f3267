// crates/workload-policy-core/tests/enforcer.rs
// ============================================================================
// Module: Policy Enforcer Tests
// Description: Background enforcement, fail-fast plans, and cancellation.
// Purpose: Ensure tracked status matches what the routine actually did.
// ============================================================================

//! Policy enforcer integration tests.

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Outcome;
use common::ScriptedExecutor;
use workload_policy_core::ActionType;
use workload_policy_core::CancellationMode;
use workload_policy_core::Decision;
use workload_policy_core::DecisionId;
use workload_policy_core::DecisionReason;
use workload_policy_core::DecisionStatus;
use workload_policy_core::DecisionType;
use workload_policy_core::EnforcementEngine;
use workload_policy_core::EnforcementError;
use workload_policy_core::EnforcementState;
use workload_policy_core::EnforcementStatus;
use workload_policy_core::PolicyEnforcer;
use workload_policy_core::PolicyEnforcerConfig;
use workload_policy_core::Storage;
use workload_policy_core::WorkloadStatus;
use workload_policy_core::WorkloadType;
use workload_policy_core::register_builtin_executors;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const WAIT_LIMIT: Duration = Duration::from_secs(5);
const SLOW: Duration = Duration::from_secs(5);

struct Harness {
    enforcer: PolicyEnforcer,
    storage: Arc<dyn Storage>,
}

impl Harness {
    async fn new(config: PolicyEnforcerConfig) -> Self {
        Self::with_storage(config, common::storage()).await
    }

    async fn with_storage(config: PolicyEnforcerConfig, storage: Arc<dyn Storage>) -> Self {
        let engine = Arc::new(EnforcementEngine::default());
        register_builtin_executors(&engine, &storage).await;
        let enforcer = PolicyEnforcer::new(engine, Arc::clone(&storage), config);
        Self { enforcer, storage }
    }

    async fn with_executor(self, executor: Arc<ScriptedExecutor>) -> Self {
        self.enforcer.engine().register_executor(executor).await;
        self
    }

    /// Stores a workload and a matching decision, returning the decision.
    async fn seed(&self, id: &str, decision_type: DecisionType) -> Decision {
        let workload_id = format!("w-{id}");
        self.storage
            .workloads()
            .create(common::workload(&workload_id, WorkloadType::Web))
            .await
            .unwrap();
        let decision =
            Decision::new(id, decision_type, DecisionReason::Manual, workload_id, "policy-a");
        self.storage.decisions().create(decision.clone()).await.unwrap();
        decision
    }

    async fn status(&self, id: &DecisionId) -> EnforcementStatus {
        self.enforcer.get_enforcement_status(id).await.unwrap()
    }

    async fn wait_for(
        &self,
        id: &DecisionId,
        done: impl Fn(&EnforcementStatus) -> bool,
    ) -> EnforcementStatus {
        tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                let status = self.status(id).await;
                if done(&status) {
                    return status;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("enforcement {id} did not reach the expected state"))
    }

    async fn wait_terminal(&self, id: &DecisionId) -> EnforcementStatus {
        self.wait_for(id, |status| status.status.is_terminal()).await
    }

    async fn wait_running(&self, id: &DecisionId) -> EnforcementStatus {
        self.wait_for(id, |status| {
            status.status == EnforcementState::Running && status.event_count("action_started") > 0
        })
        .await
    }

    async fn stored_decision(&self, id: &DecisionId) -> Decision {
        self.storage.decisions().get(id).await.unwrap()
    }

    async fn wait_decision(&self, id: &DecisionId, status: DecisionStatus) -> Decision {
        tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                let decision = self.stored_decision(id).await;
                if decision.status == status {
                    return decision;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("decision {id} never reached {status:?}"))
    }
}

fn slow_schedule() -> Arc<ScriptedExecutor> {
    Arc::new(ScriptedExecutor::new(ActionType::Schedule, vec![Outcome::Succeed]).with_delay(SLOW))
}

fn event_types(status: &EnforcementStatus) -> Vec<&str> {
    status.events.iter().map(|event| event.event_type.as_str()).collect()
}

// ============================================================================
// SECTION: Execution
// ============================================================================

#[tokio::test]
async fn schedule_decision_runs_to_completion() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;
    let decision = harness.seed("d1", DecisionType::Schedule).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let status = harness.wait_terminal(&decision.id).await;

    assert_eq!(status.status, EnforcementState::Completed, "status: {status:?}");
    assert_eq!(status.message, "Enforcement completed successfully");
    assert!((status.progress - 100.0).abs() < f64::EPSILON);
    assert!(status.completed_at.is_some());
    assert_eq!(event_types(&status), ["started", "action_started", "action_completed", "completed"]);
    assert_eq!(
        status.events[1].data.get("action_target"),
        Some(&serde_json::json!("w-d1"))
    );

    let workload = harness.storage.workloads().get(&decision.workload_id).await.unwrap();
    assert_eq!(workload.status, WorkloadStatus::Running);
    let stored = harness.wait_decision(&decision.id, DecisionStatus::Completed).await;
    assert!(stored.executed_at.is_some());
}

#[tokio::test]
async fn slow_decision_store_does_not_block_status_reads() {
    let storage = common::SlowStorage::default()
        .with_decision_update_delay(Duration::from_millis(500));
    let harness = Harness::with_storage(PolicyEnforcerConfig::default(), Arc::new(storage)).await;
    let other = harness.seed("other", DecisionType::Schedule).await;
    harness.enforcer.enforce(other.clone()).await.unwrap();
    harness.wait_terminal(&other.id).await;

    let decision = harness.seed("d1", DecisionType::Schedule).await;
    harness.enforcer.enforce(decision.clone()).await.unwrap();
    harness.wait_for(&decision.id, |status| status.event_count("action_completed") == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = std::time::Instant::now();
    let status = harness.status(&other.id).await;
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "status read waited {:?}",
        started.elapsed()
    );
    assert_eq!(status.status, EnforcementState::Completed);

    assert_eq!(harness.wait_terminal(&decision.id).await.status, EnforcementState::Completed);
    harness.wait_decision(&decision.id, DecisionStatus::Completed).await;
}

#[tokio::test]
async fn optimize_plan_updates_then_notifies() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;
    let decision = harness.seed("d-opt", DecisionType::Optimize).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let status = harness.wait_terminal(&decision.id).await;

    assert_eq!(status.status, EnforcementState::Completed);
    assert_eq!(status.event_count("action_completed"), 2);
}

#[tokio::test]
async fn first_failed_action_stops_the_plan() {
    let harness = Harness::new(PolicyEnforcerConfig::default())
        .await
        .with_executor(Arc::new(ScriptedExecutor::new(ActionType::Notify, vec![Outcome::Fail])))
        .await;
    let mut decision = harness.seed("d1", DecisionType::Schedule).await;
    decision.message = "placing workload".to_string();

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let status = harness.wait_terminal(&decision.id).await;

    assert_eq!(status.status, EnforcementState::Failed);
    assert_eq!(status.error.as_deref(), Some("Action execution failed: scripted failure"));
    assert_eq!(status.event_count("action_started"), 2);
    assert_eq!(status.event_count("action_completed"), 1);
    assert_eq!(status.event_count("action_failed"), 1);
    assert_eq!(status.event_count("completed"), 0);
    assert_eq!(harness.stored_decision(&decision.id).await.status, DecisionStatus::Pending);
}

#[tokio::test]
async fn failing_primary_action_skips_notifications() {
    let notify = Arc::new(ScriptedExecutor::new(ActionType::Notify, vec![Outcome::Succeed]));
    let harness = Harness::new(PolicyEnforcerConfig::default())
        .await
        .with_executor(Arc::new(ScriptedExecutor::new(ActionType::Schedule, vec![Outcome::Fail])))
        .await
        .with_executor(Arc::clone(&notify))
        .await;
    let mut decision = harness.seed("d1", DecisionType::Schedule).await;
    decision.message = "placing workload".to_string();

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let status = harness.wait_terminal(&decision.id).await;

    assert_eq!(status.status, EnforcementState::Failed);
    assert_eq!(status.event_count("action_started"), 1);
    assert_eq!(notify.attempts(), 0);
}

#[tokio::test]
async fn unsupported_and_unrouted_decisions_fail() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;

    let consolidate = harness.seed("d-con", DecisionType::Consolidate).await;
    harness.enforcer.enforce(consolidate.clone()).await.unwrap();
    let status = harness.wait_terminal(&consolidate.id).await;
    assert_eq!(status.status, EnforcementState::Failed);
    assert_eq!(
        status.error.as_deref(),
        Some("Failed to generate actions: unsupported decision type: consolidate")
    );
    assert_eq!(status.event_count("action_started"), 0);

    let migrate = harness.seed("d-mig", DecisionType::Migrate).await;
    harness.enforcer.enforce(migrate.clone()).await.unwrap();
    let status = harness.wait_terminal(&migrate.id).await;
    assert_eq!(status.status, EnforcementState::Failed);
    assert!(status.error.unwrap_or_default().contains("migrate"));
}

#[tokio::test]
async fn missing_workload_fails_before_any_action() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;
    let decision =
        Decision::new("d-orphan", DecisionType::Schedule, DecisionReason::Manual, "ghost", "p");

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let status = harness.wait_terminal(&decision.id).await;

    assert_eq!(status.status, EnforcementState::Failed);
    assert!(status.error.unwrap_or_default().starts_with("Failed to get workload"));
}

#[tokio::test]
async fn finished_enforcements_can_be_resubmitted() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;
    let decision = harness.seed("d1", DecisionType::Consolidate).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    harness.wait_terminal(&decision.id).await;
    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let status = harness.wait_terminal(&decision.id).await;

    assert_eq!(status.event_count("failed"), 1);
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[tokio::test]
async fn running_enforcements_reject_resubmission() {
    let harness =
        Harness::new(PolicyEnforcerConfig::default()).await.with_executor(slow_schedule()).await;
    let decision = harness.seed("d1", DecisionType::Schedule).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    harness.wait_running(&decision.id).await;

    assert_eq!(
        harness.enforcer.enforce(decision.clone()).await,
        Err(EnforcementError::AlreadyInProgress(decision.id.clone()))
    );
    harness.enforcer.cancel_enforcement(&decision.id).await.unwrap();
}

#[tokio::test]
async fn batch_submission_reports_rejections() {
    let harness =
        Harness::new(PolicyEnforcerConfig::default()).await.with_executor(slow_schedule()).await;
    let running = harness.seed("d1", DecisionType::Schedule).await;
    let fresh = harness.seed("d2", DecisionType::Consolidate).await;

    harness.enforcer.enforce(running.clone()).await.unwrap();
    harness.wait_running(&running.id).await;

    let err = harness.enforcer.enforce_many(vec![running.clone(), fresh.clone()]).await.unwrap_err();
    match err {
        EnforcementError::Batch { count, details } => {
            assert_eq!(count, 1);
            assert!(details.contains("already in progress"), "details: {details}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(harness.wait_terminal(&fresh.id).await.status, EnforcementState::Failed);
    harness.enforcer.cancel_enforcement(&running.id).await.unwrap();
}

#[tokio::test]
async fn worker_limit_keeps_extra_enforcements_pending() {
    let config = PolicyEnforcerConfig {
        max_concurrent_enforcements: 1,
        ..PolicyEnforcerConfig::default()
    };
    let harness = Harness::new(config).await.with_executor(slow_schedule()).await;
    let first = harness.seed("d1", DecisionType::Schedule).await;
    let second = harness.seed("d2", DecisionType::Optimize).await;

    harness.enforcer.enforce(first.clone()).await.unwrap();
    harness.wait_running(&first.id).await;
    harness.enforcer.enforce(second.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.status(&second.id).await.status, EnforcementState::Pending);
    assert_eq!(
        harness.enforcer.cancel_enforcement(&second.id).await,
        Err(EnforcementError::InvalidState {
            state: "pending".to_string()
        })
    );

    harness.enforcer.cancel_enforcement(&first.id).await.unwrap();
    let status = harness.wait_terminal(&second.id).await;
    assert_eq!(status.status, EnforcementState::Completed);
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

#[tokio::test]
async fn cooperative_cancel_abandons_the_running_action() {
    let executor = slow_schedule();
    let harness = Harness::new(PolicyEnforcerConfig::default())
        .await
        .with_executor(Arc::clone(&executor))
        .await;
    let decision = harness.seed("d1", DecisionType::Schedule).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    let running = harness.wait_running(&decision.id).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(executor.attempts(), 1);
    harness.enforcer.cancel_enforcement(&decision.id).await.unwrap();

    let status = harness.status(&decision.id).await;
    assert_eq!(status.status, EnforcementState::Cancelled);
    assert_eq!(status.message, "Enforcement cancelled");
    assert!((status.progress - running.progress).abs() < f64::EPSILON);
    assert_eq!(status.events.last().map(|event| event.event_type.as_str()), Some("cancelled"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let later = harness.status(&decision.id).await;
    assert_eq!(later.status, EnforcementState::Cancelled);
    assert_eq!(later.event_count("action_completed"), 0);
    assert_eq!(later.event_count("completed"), 0);
    assert_eq!(executor.attempts(), 1);
    assert_eq!(harness.stored_decision(&decision.id).await.status, DecisionStatus::Pending);
}

#[tokio::test]
async fn status_only_cancel_lets_the_plan_finish_without_completing() {
    let config = PolicyEnforcerConfig {
        cancellation: CancellationMode::StatusOnly,
        ..PolicyEnforcerConfig::default()
    };
    let harness = Harness::new(config)
        .await
        .with_executor(Arc::new(
            ScriptedExecutor::new(ActionType::Schedule, vec![Outcome::Succeed])
                .with_delay(Duration::from_millis(100)),
        ))
        .await;
    let decision = harness.seed("d1", DecisionType::Schedule).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    harness.wait_running(&decision.id).await;
    harness.enforcer.cancel_enforcement(&decision.id).await.unwrap();

    let status =
        harness.wait_for(&decision.id, |status| status.event_count("action_completed") == 1).await;
    assert_eq!(status.status, EnforcementState::Cancelled);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let later = harness.status(&decision.id).await;
    assert_eq!(later.status, EnforcementState::Cancelled);
    assert_eq!(later.event_count("completed"), 0);
    assert_eq!(harness.stored_decision(&decision.id).await.status, DecisionStatus::Pending);
}

#[tokio::test]
async fn only_running_enforcements_can_be_cancelled() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;
    let decision = harness.seed("d1", DecisionType::Schedule).await;

    harness.enforcer.enforce(decision.clone()).await.unwrap();
    harness.wait_terminal(&decision.id).await;

    assert_eq!(
        harness.enforcer.cancel_enforcement(&decision.id).await,
        Err(EnforcementError::InvalidState {
            state: "completed".to_string()
        })
    );
    assert!(matches!(
        harness.enforcer.cancel_enforcement(&DecisionId::from("unknown")).await,
        Err(EnforcementError::StatusNotFound(_))
    ));
}

#[tokio::test]
async fn health_checks_engine_and_storage() {
    let harness = Harness::new(PolicyEnforcerConfig::default()).await;
    assert!(harness.enforcer.health().await.is_ok());
}

// crates/workload-policy-core/src/runtime/enforcer.rs
// ============================================================================
// Module: Policy Enforcer
// Description: Background enforcement of decisions with tracked progress.
// Purpose: Turn decisions into executed action plans and report their status.
// Dependencies: crate::{core, interfaces, runtime}, tokio, tracing, serde_json
// ============================================================================

//! ## Overview
//! [`PolicyEnforcer::enforce`] records a `pending` status for the decision
//! and returns; a spawned routine waits for a worker slot, runs the action
//! plan one action at a time, and records events as it goes. The first
//! failed action fails the enforcement and skips the rest of the plan.
//! Applied side effects are not rolled back.
//!
//! Cancellation marks the status `cancelled` immediately. In cooperative
//! mode it also trips a per-decision signal: the routine stops before the
//! next action and abandons the in-flight one.
//!
//! ## Invariants
//! - Only `running` enforcements can be cancelled, and only one enforcement
//!   per decision can be running.
//! - Terminal states are never overwritten by the routine.
//! - The decision is marked completed only when every action succeeded and
//!   the enforcement was not cancelled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde_json::Value;
use serde_json::json;
use tokio::sync::RwLock;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::info;
use tracing::warn;

use crate::core::Action;
use crate::core::ActionResult;
use crate::core::Decision;
use crate::core::DecisionId;
use crate::core::DecisionStatus;
use crate::core::EnforcementError;
use crate::core::EnforcementState;
use crate::core::EnforcementStatus;
use crate::interfaces::Storage;
use crate::runtime::enforcement::EnforcementEngine;
use crate::runtime::plan::generate_actions;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default bound on enforcements running at once.
pub const DEFAULT_MAX_CONCURRENT_ENFORCEMENTS: usize = 64;

/// How cancellation reaches a running enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancellationMode {
    /// Stop between actions and abandon the in-flight action.
    #[default]
    Cooperative,
    /// Only mark the status; the routine runs its plan to the end.
    StatusOnly,
}

impl CancellationMode {
    /// Returns the stable configuration label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cooperative => "cooperative",
            Self::StatusOnly => "status_only",
        }
    }
}

/// Policy enforcer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyEnforcerConfig {
    /// Maximum enforcements running at once; at least one.
    pub max_concurrent_enforcements: usize,
    /// Cancellation behaviour.
    pub cancellation: CancellationMode,
}

impl Default for PolicyEnforcerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_enforcements: DEFAULT_MAX_CONCURRENT_ENFORCEMENTS,
            cancellation: CancellationMode::Cooperative,
        }
    }
}

// ============================================================================
// SECTION: Tracked State
// ============================================================================

/// Status plus the routine's cancellation signal.
struct Tracked {
    /// Submission this entry belongs to.
    generation: u64,
    /// Observable status.
    status: EnforcementStatus,
    /// Cancellation signal read by the routine.
    cancel: watch::Sender<bool>,
}

/// Status map keyed by decision.
type StatusMap = BTreeMap<DecisionId, Tracked>;

// ============================================================================
// SECTION: Policy Enforcer
// ============================================================================

/// Runs decisions' action plans in the background.
///
/// Clones share the same status map, engine, and worker slots.
#[derive(Clone)]
pub struct PolicyEnforcer {
    /// Action router.
    engine: Arc<EnforcementEngine>,
    /// Storage manager.
    storage: Arc<dyn Storage>,
    /// Per-decision status.
    statuses: Arc<RwLock<StatusMap>>,
    /// Worker slots.
    permits: Arc<Semaphore>,
    /// Submission counter.
    generations: Arc<AtomicU64>,
    /// Enforcer settings.
    config: PolicyEnforcerConfig,
}

impl PolicyEnforcer {
    /// Creates an enforcer over an engine and storage.
    #[must_use]
    pub fn new(
        engine: Arc<EnforcementEngine>,
        storage: Arc<dyn Storage>,
        config: PolicyEnforcerConfig,
    ) -> Self {
        Self {
            engine,
            storage,
            statuses: Arc::new(RwLock::new(BTreeMap::new())),
            permits: Arc::new(Semaphore::new(config.max_concurrent_enforcements.max(1))),
            generations: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// Returns the enforcement engine.
    #[must_use]
    pub const fn engine(&self) -> &Arc<EnforcementEngine> {
        &self.engine
    }

    /// Accepts a decision and starts enforcing it in the background.
    ///
    /// A previous finished enforcement of the same decision is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::AlreadyInProgress`] when the decision is
    /// currently running.
    pub async fn enforce(&self, decision: Decision) -> Result<(), EnforcementError> {
        let (cancel, signal) = watch::channel(false);
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        {
            let mut statuses = self.statuses.write().await;
            if let Some(existing) = statuses.get(&decision.id)
                && existing.status.status == EnforcementState::Running
            {
                return Err(EnforcementError::AlreadyInProgress(decision.id.clone()));
            }
            statuses.insert(
                decision.id.clone(),
                Tracked {
                    generation,
                    status: EnforcementStatus::pending(decision.id.clone()),
                    cancel,
                },
            );
        }

        info!(
            decision_id = %decision.id,
            workload_id = %decision.workload_id,
            decision_type = decision.decision_type.as_str(),
            "accepted decision for enforcement"
        );
        let enforcer = self.clone();
        tokio::spawn(async move {
            enforcer.run_enforcement(decision, generation, signal).await;
        });
        Ok(())
    }

    /// Submits several decisions concurrently.
    ///
    /// Only submission rejections are reported; execution outcomes are
    /// observed through [`PolicyEnforcer::get_enforcement_status`].
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::Batch`] listing every rejection.
    pub async fn enforce_many(&self, decisions: Vec<Decision>) -> Result<(), EnforcementError> {
        let mut submissions = JoinSet::new();
        for decision in decisions {
            let enforcer = self.clone();
            submissions.spawn(async move { enforcer.enforce(decision).await });
        }

        let mut rejections = Vec::new();
        while let Some(joined) = submissions.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => rejections.push(err.to_string()),
                Err(err) => rejections.push(format!("submission task failed: {err}")),
            }
        }
        if rejections.is_empty() {
            return Ok(());
        }
        Err(EnforcementError::Batch {
            count: rejections.len(),
            details: rejections.join("; "),
        })
    }

    /// Returns a snapshot of a decision's enforcement status.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::StatusNotFound`] for unknown decisions.
    pub async fn get_enforcement_status(
        &self,
        decision_id: &DecisionId,
    ) -> Result<EnforcementStatus, EnforcementError> {
        self.statuses
            .read()
            .await
            .get(decision_id)
            .map(|tracked| tracked.status.clone())
            .ok_or_else(|| EnforcementError::StatusNotFound(decision_id.clone()))
    }

    /// Cancels a running enforcement.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::StatusNotFound`] for unknown decisions and
    /// [`EnforcementError::InvalidState`] when the enforcement is not running.
    pub async fn cancel_enforcement(
        &self,
        decision_id: &DecisionId,
    ) -> Result<(), EnforcementError> {
        let mut statuses = self.statuses.write().await;
        let tracked = statuses
            .get_mut(decision_id)
            .ok_or_else(|| EnforcementError::StatusNotFound(decision_id.clone()))?;
        if tracked.status.status != EnforcementState::Running {
            return Err(EnforcementError::InvalidState {
                state: tracked.status.status.as_str().to_string(),
            });
        }

        let progress = tracked.status.progress;
        tracked.status.finish(EnforcementState::Cancelled, "Enforcement cancelled");
        tracked.status.progress = progress;
        tracked.status.push_event("cancelled", "Enforcement cancelled by user");
        tracked.cancel.send_replace(true);

        info!(
            decision_id = %decision_id,
            mode = self.config.cancellation.as_str(),
            "cancelled policy enforcement"
        );
        Ok(())
    }

    /// Checks the enforcement engine, then storage.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::Health`] naming the failing component.
    pub async fn health(&self) -> Result<(), EnforcementError> {
        self.engine.health().await.map_err(|err| EnforcementError::Health {
            component: "enforcement engine".to_string(),
            message: err.to_string(),
        })?;
        self.storage.health().await.map_err(|err| EnforcementError::Health {
            component: "storage".to_string(),
            message: err.to_string(),
        })?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Background routine
    // ------------------------------------------------------------------------

    /// Runs one submission's plan to a terminal state.
    async fn run_enforcement(
        &self,
        decision: Decision,
        generation: u64,
        mut signal: watch::Receiver<bool>,
    ) {
        let id = decision.id.clone();
        let Ok(_permit) = Arc::clone(&self.permits).acquire_owned().await else {
            self.fail(&id, generation, "Enforcement worker pool closed".to_string()).await;
            return;
        };

        let started = self
            .transition(&id, generation, |status| {
                status.status = EnforcementState::Running;
                status.message = "Enforcement in progress".to_string();
                status.push_event("started", "Enforcement started");
            })
            .await;
        if !started {
            return;
        }

        let workload = match self.storage.workloads().get(&decision.workload_id).await {
            Ok(workload) => workload,
            Err(err) => {
                self.fail(&id, generation, format!("Failed to get workload: {err}")).await;
                return;
            }
        };
        let actions = match generate_actions(&decision, &workload) {
            Ok(actions) => actions,
            Err(err) => {
                self.fail(&id, generation, format!("Failed to generate actions: {err}")).await;
                return;
            }
        };

        let total = actions.len();
        for (index, action) in actions.iter().enumerate() {
            if self.cancel_requested(&signal) {
                info!(
                    decision_id = %id,
                    completed_actions = index,
                    "enforcement stopped after cancellation"
                );
                return;
            }
            self.transition(&id, generation, |status| status.progress = percent(index, total))
                .await;
            self.record(
                &id,
                generation,
                "action_started",
                format!("Executing action: {}", action.action_type.as_str()),
                action_started_data(action),
            )
            .await;

            let Some(result) = self.execute(action, &mut signal).await else {
                info!(
                    decision_id = %id,
                    action_type = action.action_type.as_str(),
                    "abandoned in-flight action after cancellation"
                );
                return;
            };

            if !result.success {
                let reason = result.error.clone().unwrap_or_else(|| result.message.clone());
                self.record(
                    &id,
                    generation,
                    "action_failed",
                    format!("Action failed: {reason}"),
                    action_failed_data(&result),
                )
                .await;
                self.fail(&id, generation, format!("Action execution failed: {reason}")).await;
                return;
            }

            self.record(
                &id,
                generation,
                "action_completed",
                format!("Action completed: {}", action.action_type.as_str()),
                action_completed_data(&result),
            )
            .await;
            info!(
                decision_id = %id,
                action_type = action.action_type.as_str(),
                success = result.success,
                duration_ms = result.duration_ms,
                "executed action"
            );
        }

        self.complete(decision, generation).await;
    }

    /// Runs one action, racing the cancellation signal in cooperative mode.
    ///
    /// Returns `None` when the action was abandoned.
    async fn execute(
        &self,
        action: &Action,
        signal: &mut watch::Receiver<bool>,
    ) -> Option<ActionResult> {
        if self.config.cancellation == CancellationMode::StatusOnly {
            return Some(self.engine.execute_action(action).await);
        }
        tokio::select! {
            result = self.engine.execute_action(action) => Some(result),
            () = cancelled(signal) => None,
        }
    }

    /// Returns true when cooperative cancellation has been requested.
    fn cancel_requested(&self, signal: &watch::Receiver<bool>) -> bool {
        self.config.cancellation == CancellationMode::Cooperative && *signal.borrow()
    }

    /// Marks the enforcement completed, then the decision.
    ///
    /// Once the status is terminal a cancel is rejected, so the decision
    /// update runs without the status lock.
    async fn complete(&self, mut decision: Decision, generation: u64) {
        let duration_ms = {
            let mut statuses = self.statuses.write().await;
            let Some(tracked) = live_entry(&mut statuses, &decision.id, generation) else {
                return;
            };
            let message = "Enforcement completed successfully";
            tracked.status.finish(EnforcementState::Completed, message);
            tracked.status.push_event("completed", message);
            tracked.status.duration_ms
        };

        decision.set_status(DecisionStatus::Completed);
        if let Err(err) = self.storage.decisions().update(decision.clone()).await {
            warn!(decision_id = %decision.id, error = %err, "failed to update decision status");
        }
        info!(decision_id = %decision.id, duration_ms, "policy enforcement completed");
    }

    /// Fails a live enforcement.
    async fn fail(&self, decision_id: &DecisionId, generation: u64, message: String) {
        let failed = self
            .transition(decision_id, generation, |status| {
                status.finish(EnforcementState::Failed, message.clone());
                status.error = Some(message.clone());
                status.push_event("failed", message.clone());
            })
            .await;
        if failed {
            warn!(decision_id = %decision_id, error = %message, "policy enforcement failed");
        }
    }

    /// Applies a change to a live (current and non-terminal) status.
    ///
    /// Returns false when the entry was replaced or already terminal.
    async fn transition(
        &self,
        decision_id: &DecisionId,
        generation: u64,
        change: impl FnOnce(&mut EnforcementStatus),
    ) -> bool {
        let mut statuses = self.statuses.write().await;
        live_entry(&mut statuses, decision_id, generation).is_some_and(|tracked| {
            change(&mut tracked.status);
            true
        })
    }

    /// Appends an event to the submission's status, terminal or not.
    async fn record(
        &self,
        decision_id: &DecisionId,
        generation: u64,
        event_type: &str,
        message: String,
        data: BTreeMap<String, Value>,
    ) {
        let mut statuses = self.statuses.write().await;
        if let Some(tracked) = statuses.get_mut(decision_id)
            && tracked.generation == generation
        {
            tracked.status.push_event_with(event_type, message, data);
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the entry when it belongs to the submission and is not terminal.
fn live_entry<'a>(
    statuses: &'a mut StatusMap,
    decision_id: &DecisionId,
    generation: u64,
) -> Option<&'a mut Tracked> {
    statuses
        .get_mut(decision_id)
        .filter(|tracked| tracked.generation == generation && !tracked.status.status.is_terminal())
}

/// Resolves once the signal reads true; never resolves if the sender is gone.
async fn cancelled(signal: &mut watch::Receiver<bool>) {
    if signal.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Share of the plan finished before action `done`, as a percentage.
fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let done = u32::try_from(done).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    f64::from(done) / f64::from(total) * 100.0
}

/// Event data for `action_started`.
fn action_started_data(action: &Action) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("action_type".to_string(), json!(action.action_type.as_str())),
        ("action_target".to_string(), json!(action.target)),
    ])
}

/// Event data for `action_completed`.
fn action_completed_data(result: &ActionResult) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("action_type".to_string(), json!(result.action_type.as_str())),
        ("success".to_string(), json!(result.success)),
        ("duration_ms".to_string(), json!(result.duration_ms)),
    ])
}

/// Event data for `action_failed`.
fn action_failed_data(result: &ActionResult) -> BTreeMap<String, Value> {
    let error = result.error.clone().unwrap_or_else(|| result.message.clone());
    BTreeMap::from([
        ("action_type".to_string(), json!(result.action_type.as_str())),
        ("error".to_string(), json!(error)),
    ])
}

// ============================================================================
// SECTION: Tests
// ============================================================================

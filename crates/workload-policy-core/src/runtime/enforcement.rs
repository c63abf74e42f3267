// crates/workload-policy-core/src/runtime/enforcement.rs
// ============================================================================
// Module: Enforcement Engine
// Description: Executor registry with deadline and retry handling.
// Purpose: Route actions to executors and normalize their outcomes.
// Dependencies: crate::{core, interfaces}, tokio, tracing
// ============================================================================

//! ## Overview
//! The engine maps each [`ActionType`] to one registered executor; the last
//! registration for a type wins. Running an action never returns an error:
//! a missing executor, a validation failure, an executor error, or a missed
//! deadline all come back as an unsuccessful [`ActionResult`] so batch
//! execution and enforcement progress treat every failure the same way.
//!
//! ## Invariants
//! - Every returned result carries the wall-clock duration of the call.
//! - Retries stop at the first successful attempt, which sets `retry_count`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use crate::core::Action;
use crate::core::ActionResult;
use crate::core::ActionType;
use crate::core::EnforcementError;
use crate::core::RetryPolicy;
use crate::core::time::duration_millis;
use crate::interfaces::ActionExecutor;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Deadline applied to actions that do not set one.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Enforcement engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementEngineConfig {
    /// Deadline for actions without an explicit timeout.
    pub default_action_timeout: Duration,
}

impl Default for EnforcementEngineConfig {
    fn default() -> Self {
        Self {
            default_action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Enforcement Engine
// ============================================================================

/// Executor registry keyed by action type.
type Registry = BTreeMap<ActionType, Arc<dyn ActionExecutor>>;

/// Routes actions to their executors.
pub struct EnforcementEngine {
    /// Registered executors; read-mostly.
    executors: RwLock<Registry>,
    /// Engine settings.
    config: EnforcementEngineConfig,
}

impl Default for EnforcementEngine {
    fn default() -> Self {
        Self::new(EnforcementEngineConfig::default())
    }
}

impl EnforcementEngine {
    /// Creates an engine with no executors.
    #[must_use]
    pub fn new(config: EnforcementEngineConfig) -> Self {
        Self {
            executors: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Registers an executor for every action type it reports it can run.
    ///
    /// Returns the action types now routed to this executor.
    pub async fn register_executor(&self, executor: Arc<dyn ActionExecutor>) -> Vec<ActionType> {
        let mut registry = self.executors.write().await;
        let mut claimed = Vec::new();
        for action_type in ActionType::ALL {
            if executor.can_execute(action_type) {
                registry.insert(action_type, Arc::clone(&executor));
                claimed.push(action_type);
                info!(action_type = action_type.as_str(), "registered action executor");
            }
        }
        claimed
    }

    /// Removes the executor for an action type.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::ExecutorNotFound`] when nothing is
    /// registered for the type.
    pub async fn unregister_executor(
        &self,
        action_type: ActionType,
    ) -> Result<(), EnforcementError> {
        let mut registry = self.executors.write().await;
        if registry.remove(&action_type).is_none() {
            return Err(EnforcementError::ExecutorNotFound(action_type.as_str().to_string()));
        }
        info!(action_type = action_type.as_str(), "unregistered action executor");
        Ok(())
    }

    /// Lists action types with a registered executor.
    pub async fn registered_action_types(&self) -> Vec<ActionType> {
        self.executors.read().await.keys().copied().collect()
    }

    /// Runs one action under its deadline and retry policy.
    pub async fn execute_action(&self, action: &Action) -> ActionResult {
        let started = Instant::now();
        let executor = self.executors.read().await.get(&action.action_type).cloned();

        let mut result = match executor {
            None => ActionResult::failed(
                action.action_type,
                format!("No executor found for action type: {}", action.action_type.as_str()),
                EnforcementError::ExecutorNotFound(action.action_type.as_str().to_string())
                    .to_string(),
            ),
            Some(executor) => match executor.validate(action) {
                Err(err) => ActionResult::failed(
                    action.action_type,
                    format!("Action validation failed: {err}"),
                    err.to_string(),
                ),
                Ok(()) => self.run_with_deadline(executor.as_ref(), action).await,
            },
        };
        result.set_duration(started.elapsed());

        info!(
            action_type = action.action_type.as_str(),
            action_target = %action.target,
            success = result.success,
            duration_ms = result.duration_ms,
            retry_count = result.retry_count,
            "executed action"
        );
        result
    }

    /// Runs actions concurrently and collects every result.
    ///
    /// Results are returned in input order; a failing action does not stop
    /// its siblings.
    pub async fn execute_actions(self: &Arc<Self>, actions: Vec<Action>) -> Vec<ActionResult> {
        let handles: Vec<(ActionType, JoinHandle<ActionResult>)> = actions
            .into_iter()
            .map(|action| {
                let engine = Arc::clone(self);
                let action_type = action.action_type;
                let handle = tokio::spawn(async move { engine.execute_action(&action).await });
                (action_type, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (action_type, handle) in handles {
            let result = handle.await.unwrap_or_else(|err| {
                ActionResult::failed(
                    action_type,
                    format!("Action execution error: {err}"),
                    err.to_string(),
                )
            });
            results.push(result);
        }
        results
    }

    /// Checks every registered executor, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::Health`] naming the failing action type.
    pub async fn health(&self) -> Result<(), EnforcementError> {
        let executors: Vec<(ActionType, Arc<dyn ActionExecutor>)> = self
            .executors
            .read()
            .await
            .iter()
            .map(|(action_type, executor)| (*action_type, Arc::clone(executor)))
            .collect();
        for (action_type, executor) in executors {
            executor.health().await.map_err(|err| EnforcementError::Health {
                component: format!("executor for action type {}", action_type.as_str()),
                message: err.to_string(),
            })?;
        }
        Ok(())
    }

    /// Applies the action deadline around execution and retries.
    async fn run_with_deadline(
        &self,
        executor: &dyn ActionExecutor,
        action: &Action,
    ) -> ActionResult {
        let deadline = action.timeout.unwrap_or(self.config.default_action_timeout);
        let attempt = async {
            match &action.retry_policy {
                Some(policy) => execute_with_retry(executor, action, policy).await,
                None => executor.execute(action).await,
            }
        };
        let outcome = tokio::time::timeout(deadline, attempt).await.unwrap_or_else(|_| {
            Err(EnforcementError::Timeout(format!(
                "action timed out after {}ms",
                duration_millis(deadline)
            )))
        });
        outcome.unwrap_or_else(|err| {
            let mut failed = ActionResult::failed(
                action.action_type,
                format!("Action execution failed: {err}"),
                err.to_string(),
            );
            failed.retry_count = action.retry_policy.map_or(0, |policy| policy.max_retries);
            failed
        })
    }
}

// ============================================================================
// SECTION: Retry
// ============================================================================

/// Runs attempts `0..=max_retries`, sleeping the backoff delay between them.
///
/// When every attempt fails the last outcome is returned; an unsuccessful
/// result carries `retry_count == max_retries`.
async fn execute_with_retry(
    executor: &dyn ActionExecutor,
    action: &Action,
    policy: &RetryPolicy,
) -> Result<ActionResult, EnforcementError> {
    let mut attempt = 0_u32;
    loop {
        let outcome = executor.execute(action).await;
        if let Ok(result) = &outcome
            && result.success
        {
            let mut result = result.clone();
            result.retry_count = attempt;
            return Ok(result);
        }
        if attempt >= policy.max_retries {
            return outcome.map(|mut result| {
                result.retry_count = policy.max_retries;
                result
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            action_type = action.action_type.as_str(),
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            delay_ms = duration_millis(delay),
            error = ?outcome.as_ref().err(),
            "action execution failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

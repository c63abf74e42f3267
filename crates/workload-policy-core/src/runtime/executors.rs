// crates/workload-policy-core/src/runtime/executors.rs
// ============================================================================
// Module: Built-in Action Executors
// Description: Workload status executors and the notification executor.
// Purpose: Apply schedule, update, terminate, suspend, resume, and notify actions.
// Dependencies: crate::{core, interfaces, runtime::enforcement}, async-trait, tracing
// ============================================================================

//! ## Overview
//! Workload executors share one shape: read `workload_id` from the action
//! parameters, load the workload, set its status, and persist it. Missing
//! parameters and storage failures are reported as unsuccessful results
//! rather than errors. The notify executor has no storage dependency and
//! echoes its message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::Action;
use crate::core::ActionResult;
use crate::core::ActionType;
use crate::core::EnforcementError;
use crate::core::WorkloadId;
use crate::core::WorkloadStatus;
use crate::interfaces::ActionExecutor;
use crate::interfaces::Storage;
use crate::runtime::enforcement::EnforcementEngine;

// ============================================================================
// SECTION: Workload Executors
// ============================================================================

/// Executor that moves a workload to a new status.
pub struct WorkloadStatusExecutor {
    /// Handled action type.
    action_type: ActionType,
    /// Status written on success; `None` only touches the update time.
    target_status: Option<WorkloadStatus>,
    /// Message reported on success.
    success_message: &'static str,
    /// Storage manager.
    storage: Arc<dyn Storage>,
}

impl WorkloadStatusExecutor {
    /// Schedules a workload: status becomes `running`.
    #[must_use]
    pub fn schedule(storage: Arc<dyn Storage>) -> Self {
        Self::build(
            ActionType::Schedule,
            Some(WorkloadStatus::Running),
            "Workload scheduled successfully",
            storage,
        )
    }

    /// Records an update on a workload without changing its status.
    #[must_use]
    pub fn update(storage: Arc<dyn Storage>) -> Self {
        Self::build(ActionType::Update, None, "Workload updated successfully", storage)
    }

    /// Terminates a workload: status becomes `completed`.
    #[must_use]
    pub fn terminate(storage: Arc<dyn Storage>) -> Self {
        Self::build(
            ActionType::Terminate,
            Some(WorkloadStatus::Completed),
            "Workload terminated successfully",
            storage,
        )
    }

    /// Suspends a workload: status becomes `suspended`.
    #[must_use]
    pub fn suspend(storage: Arc<dyn Storage>) -> Self {
        Self::build(
            ActionType::Suspend,
            Some(WorkloadStatus::Suspended),
            "Workload suspended successfully",
            storage,
        )
    }

    /// Resumes a workload: status becomes `running`.
    #[must_use]
    pub fn resume(storage: Arc<dyn Storage>) -> Self {
        Self::build(
            ActionType::Resume,
            Some(WorkloadStatus::Running),
            "Workload resumed successfully",
            storage,
        )
    }

    /// Shared constructor.
    fn build(
        action_type: ActionType,
        target_status: Option<WorkloadStatus>,
        success_message: &'static str,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            action_type,
            target_status,
            success_message,
            storage,
        }
    }
}

#[async_trait]
impl ActionExecutor for WorkloadStatusExecutor {
    fn can_execute(&self, action_type: ActionType) -> bool {
        action_type == self.action_type
    }

    async fn execute(&self, action: &Action) -> Result<ActionResult, EnforcementError> {
        info!(
            action_type = self.action_type.as_str(),
            action_target = %action.target,
            "executing workload action"
        );

        let Some(workload_id) = action.string_parameter("workload_id") else {
            return Ok(ActionResult::failed(
                action.action_type,
                "workload_id parameter is required",
                "missing workload_id parameter",
            ));
        };
        let workload_id = WorkloadId::new(workload_id);

        let mut workload = match self.storage.workloads().get(&workload_id).await {
            Ok(workload) => workload,
            Err(err) => {
                return Ok(ActionResult::failed(
                    action.action_type,
                    format!("Failed to get workload: {err}"),
                    err.to_string(),
                ));
            }
        };

        if let Some(optimizations) = action.parameters.get("optimizations") {
            info!(
                workload_id = %workload_id,
                optimizations = %optimizations,
                "applying optimizations"
            );
        }
        if let Some(status) = self.target_status {
            workload.set_status(status);
        }
        let status = workload.status;

        if let Err(err) = self.storage.workloads().update(workload).await {
            return Ok(ActionResult::failed(
                action.action_type,
                format!("Failed to update workload: {err}"),
                err.to_string(),
            ));
        }

        info!(workload_id = %workload_id, status = status.as_str(), "workload action completed");
        let mut result = ActionResult::succeeded(action.action_type, self.success_message)
            .with_data("workload_id", workload_id.as_str());
        if self.target_status.is_some() {
            result = result.with_data("status", status.as_str());
        }
        Ok(result)
    }
}

// ============================================================================
// SECTION: Notify Executor
// ============================================================================

/// Executor that records a notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyExecutor;

#[async_trait]
impl ActionExecutor for NotifyExecutor {
    fn can_execute(&self, action_type: ActionType) -> bool {
        action_type == ActionType::Notify
    }

    async fn execute(&self, action: &Action) -> Result<ActionResult, EnforcementError> {
        let message = action.string_parameter("message").unwrap_or("Notification sent").to_string();
        info!(action_target = %action.target, message = %message, "notification sent");
        Ok(ActionResult::succeeded(action.action_type, message.clone())
            .with_data("target", action.target.clone())
            .with_data("message", message))
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the built-in executors with an engine.
pub async fn register_builtin_executors(engine: &EnforcementEngine, storage: &Arc<dyn Storage>) {
    let executors: [Arc<dyn ActionExecutor>; 6] = [
        Arc::new(WorkloadStatusExecutor::schedule(Arc::clone(storage))),
        Arc::new(WorkloadStatusExecutor::update(Arc::clone(storage))),
        Arc::new(WorkloadStatusExecutor::terminate(Arc::clone(storage))),
        Arc::new(WorkloadStatusExecutor::suspend(Arc::clone(storage))),
        Arc::new(WorkloadStatusExecutor::resume(Arc::clone(storage))),
        Arc::new(NotifyExecutor),
    ];
    for executor in executors {
        engine.register_executor(executor).await;
    }
}

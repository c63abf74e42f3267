// crates/workload-policy-core/src/core/decision.rs
// ============================================================================
// Module: Decision Model
// Description: Decisions handed from evaluation to enforcement.
// Purpose: Carry the chosen course of action and its approval lifecycle.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Decision`] is produced by the evaluation engine and consumed by the
//! policy enforcer. Its status follows
//! `pending -> approved -> executing -> {completed | failed | cancelled}`,
//! with `pending -> rejected` as the refusal branch.
//!
//! ## Invariants
//! - Only `approved` decisions can be executed.
//! - Moving to `completed` or `failed` stamps `executed_at`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::errors::DecisionError;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::WorkloadId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Decision Enums
// ============================================================================

/// Course of action chosen for a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    /// Place the workload.
    Schedule,
    /// Move the workload to a better placement.
    Reschedule,
    /// Live-migrate the workload.
    Migrate,
    /// Change replica or resource scale.
    Scale,
    /// Stop the workload.
    Terminate,
    /// Pause the workload.
    Suspend,
    /// Resume a paused workload.
    Resume,
    /// Apply in-place optimizations.
    Optimize,
    /// Pack workloads onto fewer nodes.
    Consolidate,
}

impl DecisionType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Reschedule => "reschedule",
            Self::Migrate => "migrate",
            Self::Scale => "scale",
            Self::Terminate => "terminate",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Optimize => "optimize",
            Self::Consolidate => "consolidate",
        }
    }
}

/// Decision lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Awaiting approval.
    #[default]
    Pending,
    /// Approved for execution.
    Approved,
    /// Refused.
    Rejected,
    /// Enforcement in progress.
    Executing,
    /// Enforcement finished successfully.
    Completed,
    /// Enforcement failed.
    Failed,
    /// Enforcement was cancelled.
    Cancelled,
}

impl DecisionStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true for terminal execution outcomes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Why a decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Reduce spend.
    CostOptimization,
    /// Improve performance.
    PerformanceOptimization,
    /// Improve utilization.
    ResourceUtilization,
    /// Satisfy a policy.
    PolicyCompliance,
    /// Restore an SLA.
    SlaViolation,
    /// Reduce power draw.
    PowerOptimization,
    /// Triggered by an automation rule.
    AutomationRule,
    /// Requested by an operator.
    Manual,
    /// Platform maintenance.
    SystemMaintenance,
}

impl DecisionReason {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CostOptimization => "cost_optimization",
            Self::PerformanceOptimization => "performance_optimization",
            Self::ResourceUtilization => "resource_utilization",
            Self::PolicyCompliance => "policy_compliance",
            Self::SlaViolation => "sla_violation",
            Self::PowerOptimization => "power_optimization",
            Self::AutomationRule => "automation_rule",
            Self::Manual => "manual",
            Self::SystemMaintenance => "system_maintenance",
        }
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Provenance metadata for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMetadata {
    /// Producing component.
    pub source: String,
    /// Producer version.
    pub version: String,
    /// Originating request identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Originating user identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Production time.
    pub timestamp: Timestamp,
    /// Labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Decision identifier.
    pub id: DecisionId,
    /// Course of action.
    #[serde(rename = "type")]
    pub decision_type: DecisionType,
    /// Lifecycle status.
    pub status: DecisionStatus,
    /// Motivation.
    pub reason: DecisionReason,
    /// Target workload.
    pub workload_id: WorkloadId,
    /// Name of the policy that produced the decision.
    pub policy_id: String,
    /// Current cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    /// Current node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Recommended cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_cluster: Option<String>,
    /// Recommended node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_node: Option<String>,
    /// Estimated hourly cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    /// Estimated power draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_power: Option<f64>,
    /// Estimated latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_latency: Option<f64>,
    /// Confidence in the decision.
    pub confidence: f64,
    /// Score of the selected evaluation.
    pub score: f64,
    /// Human-readable summary.
    #[serde(default)]
    pub message: String,
    /// Free-form details.
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    /// Provenance metadata.
    pub metadata: DecisionMetadata,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
    /// Time the decision reached completed or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<Timestamp>,
}

impl Decision {
    /// Creates a pending decision for a workload.
    #[must_use]
    pub fn new(
        id: impl Into<DecisionId>,
        decision_type: DecisionType,
        reason: DecisionReason,
        workload_id: impl Into<WorkloadId>,
        policy_id: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: id.into(),
            decision_type,
            status: DecisionStatus::Pending,
            reason,
            workload_id: workload_id.into(),
            policy_id: policy_id.into(),
            cluster_id: None,
            node_id: None,
            recommended_cluster: None,
            recommended_node: None,
            estimated_cost: None,
            estimated_power: None,
            estimated_latency: None,
            confidence: 0.0,
            score: 0.0,
            message: String::new(),
            details: BTreeMap::new(),
            metadata: DecisionMetadata {
                source: String::new(),
                version: String::new(),
                request_id: None,
                user_id: None,
                timestamp: now,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
            },
            created_at: now,
            updated_at: now,
            executed_at: None,
        }
    }

    /// Returns true when the decision may be handed to enforcement.
    #[must_use]
    pub fn can_be_executed(&self) -> bool {
        self.status == DecisionStatus::Approved
    }

    /// Returns true once execution reached a terminal outcome.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.status.is_terminal()
    }

    /// Sets the status unconditionally, stamping update and execution times.
    pub fn set_status(&mut self, status: DecisionStatus) {
        let now = Timestamp::now();
        self.status = status;
        self.updated_at = now;
        if matches!(status, DecisionStatus::Completed | DecisionStatus::Failed) {
            self.executed_at = Some(now);
        }
    }

    /// Applies a status change only if the lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] when the transition is not permitted.
    pub fn transition(&mut self, next: DecisionStatus) -> Result<(), DecisionError> {
        let id = self.id.to_string();
        let allowed = match (self.status, next) {
            (DecisionStatus::Pending, DecisionStatus::Approved | DecisionStatus::Rejected)
            | (DecisionStatus::Approved, DecisionStatus::Executing | DecisionStatus::Cancelled)
            | (
                DecisionStatus::Executing,
                DecisionStatus::Completed | DecisionStatus::Failed | DecisionStatus::Cancelled,
            ) => true,
            (DecisionStatus::Executing, DecisionStatus::Executing) => {
                return Err(DecisionError::AlreadyExecuting(id));
            }
            (current, DecisionStatus::Executing) if current.is_terminal() => {
                return Err(DecisionError::AlreadyCompleted(id));
            }
            (_, DecisionStatus::Executing) => return Err(DecisionError::NotApproved(id)),
            _ => false,
        };
        if !allowed {
            return Err(DecisionError::InvalidStatus(format!(
                "decision {id} cannot move from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.set_status(next);
        Ok(())
    }

    /// Adds or replaces a detail entry.
    pub fn add_detail(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.details.insert(key.into(), value.into());
    }

    /// Returns a detail entry when present.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/workload-policy-core/src/runtime/plan.rs
// ============================================================================
// Module: Action Plans
// Description: Translates decisions into ordered action plans.
// Purpose: Give each decision type its primary action and follow-up notices.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! One generator exists per enforceable [`DecisionType`]. Each builds a
//! single primary action targeted at the decision's workload. Schedule plans
//! add a `scheduler` notification when the decision carries a message, and
//! optimize plans always end with an `optimizer` notification. Consolidation
//! has no generator.
//!
//! ## Invariants
//! - Plans are executed in the order returned.
//! - Every action carries an explicit deadline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use crate::core::Action;
use crate::core::ActionType;
use crate::core::Decision;
use crate::core::DecisionType;
use crate::core::EnforcementError;
use crate::core::Workload;

// ============================================================================
// SECTION: Deadlines
// ============================================================================

/// Deadline for notification actions.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// One minute.
const MINUTE: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Plan Generation
// ============================================================================

/// Builds the ordered action plan for a decision.
///
/// # Errors
///
/// Returns [`EnforcementError::UnsupportedDecision`] for decision types with
/// no generator.
pub fn generate_actions(
    decision: &Decision,
    workload: &Workload,
) -> Result<Vec<Action>, EnforcementError> {
    let plan = match decision.decision_type {
        DecisionType::Schedule => schedule_plan(decision, workload),
        DecisionType::Reschedule => vec![
            primary(ActionType::Reschedule, decision, workload, MINUTE * 10)
                .with_parameter("current_cluster", json!(decision.cluster_id))
                .with_parameter("recommended_cluster", json!(decision.recommended_cluster))
                .with_parameter("reason", decision.reason.as_str()),
        ],
        DecisionType::Migrate => vec![
            primary(ActionType::Migrate, decision, workload, MINUTE * 15)
                .with_parameter("source_cluster", json!(decision.cluster_id))
                .with_parameter("target_cluster", json!(decision.recommended_cluster))
                .with_parameter("source_node", json!(decision.node_id))
                .with_parameter("target_node", json!(decision.recommended_node))
                .with_parameter("migration_strategy", "live"),
        ],
        DecisionType::Scale => vec![
            primary(ActionType::Scale, decision, workload, MINUTE * 5)
                .with_parameter("scale_factor", detail(decision, "scale_factor"))
                .with_parameter("scale_direction", detail(decision, "scale_direction")),
        ],
        DecisionType::Terminate => vec![
            primary(ActionType::Terminate, decision, workload, MINUTE * 2)
                .with_parameter("reason", decision.reason.as_str())
                .with_parameter("grace_period", "30s"),
        ],
        DecisionType::Suspend => vec![
            primary(ActionType::Suspend, decision, workload, MINUTE * 2)
                .with_parameter("reason", decision.reason.as_str()),
        ],
        DecisionType::Resume => vec![
            primary(ActionType::Resume, decision, workload, MINUTE * 2)
                .with_parameter("reason", decision.reason.as_str()),
        ],
        DecisionType::Optimize => vec![
            primary(ActionType::Update, decision, workload, MINUTE * 5)
                .with_parameter("optimizations", detail(decision, "optimizations")),
            notification("optimizer", "Workload optimization completed", decision, workload),
        ],
        DecisionType::Consolidate => {
            return Err(EnforcementError::UnsupportedDecision(
                decision.decision_type.as_str().to_string(),
            ));
        }
    };
    Ok(plan)
}

/// Schedule action plus an optional scheduler notice.
fn schedule_plan(decision: &Decision, workload: &Workload) -> Vec<Action> {
    let resources = serde_json::to_value(&workload.requirements).unwrap_or(Value::Null);
    let mut plan = vec![
        primary(ActionType::Schedule, decision, workload, MINUTE * 5)
            .with_parameter("cluster_id", json!(decision.cluster_id))
            .with_parameter("node_id", json!(decision.node_id))
            .with_parameter("recommended_cluster", json!(decision.recommended_cluster))
            .with_parameter("recommended_node", json!(decision.recommended_node))
            .with_parameter("resources", resources),
    ];
    if !decision.message.is_empty() {
        plan.push(notification("scheduler", &decision.message, decision, workload));
    }
    plan
}

/// Primary action targeted at the decision's workload.
fn primary(
    action_type: ActionType,
    decision: &Decision,
    workload: &Workload,
    timeout: Duration,
) -> Action {
    Action::new(action_type, decision.workload_id.as_str())
        .with_parameter("workload_id", workload.id.as_str())
        .with_timeout(timeout)
}

/// Notification addressed to a named component.
fn notification(target: &str, message: &str, decision: &Decision, workload: &Workload) -> Action {
    Action::new(ActionType::Notify, target)
        .with_parameter("message", message)
        .with_parameter("workload_id", workload.id.as_str())
        .with_parameter("decision_id", decision.id.as_str())
        .with_timeout(NOTIFY_TIMEOUT)
}

/// Copies a decision detail, null when absent.
fn detail(decision: &Decision, key: &str) -> Value {
    decision.detail(key).cloned().unwrap_or(Value::Null)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

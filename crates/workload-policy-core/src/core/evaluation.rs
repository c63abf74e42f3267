// crates/workload-policy-core/src/core/evaluation.rs
// ============================================================================
// Module: Evaluation Model
// Description: Evaluation results, findings, and conflict records.
// Purpose: Capture the outcome of scoring workloads against policies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! One [`EvaluationResult`] is produced per (workload, policy) pair. Results
//! carry findings (violations, recommendations, constraints) that the
//! conflict resolver compares across policies.
//!
//! ## Invariants
//! - When `applicable` is false the score is zero and is never consulted.
//! - Scores are clamped into `[0.0, 1.0]` by the evaluator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::EvaluationId;
use crate::core::identifiers::WorkloadId;
use crate::core::policy::Policy;
use crate::core::policy::PolicyType;
use crate::core::time::Timestamp;
use crate::core::time::duration_millis;
use crate::core::workload::Workload;

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Policy violation found during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation category.
    #[serde(rename = "type")]
    pub violation_type: String,
    /// Severity label (e.g. `warning`, `critical`).
    pub severity: String,
    /// Human-readable message.
    pub message: String,
    /// Offending field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Observed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Expected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Detection time.
    pub timestamp: Timestamp,
}

/// Suggested follow-up produced during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommendation category.
    #[serde(rename = "type")]
    pub recommendation_type: String,
    /// Priority label.
    pub priority: String,
    /// Human-readable message.
    pub message: String,
    /// Suggested action token.
    pub action: String,
    /// Expected impact label.
    pub impact: String,
    /// Effort label.
    pub effort: String,
    /// Creation time.
    pub timestamp: Timestamp,
}

/// Constraint asserted by a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint category.
    #[serde(rename = "type")]
    pub constraint_type: String,
    /// Constraint name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Bound value.
    pub value: Value,
    /// Comparison operator token.
    pub operator: String,
    /// Whether the constraint is enforced.
    pub enforced: bool,
}

// ============================================================================
// SECTION: Evaluation Result
// ============================================================================

/// Outcome of scoring one workload against one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Evaluation record identifier.
    pub id: EvaluationId,
    /// Evaluated policy name.
    pub policy_name: String,
    /// Evaluated policy kind.
    pub policy_type: PolicyType,
    /// Evaluated workload.
    pub workload_id: WorkloadId,
    /// Whether the policy applied to the workload.
    pub applicable: bool,
    /// Score in `[0.0, 1.0]`.
    pub score: f64,
    /// Violations found.
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Recommendations produced.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Constraints asserted.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Free-form metrics.
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
    /// Evaluation duration in milliseconds.
    pub duration_ms: u64,
    /// Completion time.
    pub timestamp: Timestamp,
}

impl EvaluationResult {
    /// Creates an empty, non-applicable result for a pair.
    #[must_use]
    pub fn new(id: impl Into<EvaluationId>, workload: &Workload, policy: &Policy) -> Self {
        Self {
            id: id.into(),
            policy_name: policy.name().to_string(),
            policy_type: policy.policy_type(),
            workload_id: workload.id.clone(),
            applicable: false,
            score: 0.0,
            violations: Vec::new(),
            recommendations: Vec::new(),
            constraints: Vec::new(),
            metrics: BTreeMap::new(),
            duration_ms: 0,
            timestamp: Timestamp::now(),
        }
    }

    /// Returns true when any violation was recorded.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Returns true when any recommendation was recorded.
    #[must_use]
    pub fn has_recommendations(&self) -> bool {
        !self.recommendations.is_empty()
    }

    /// Stamps the elapsed evaluation time.
    pub fn set_duration(&mut self, elapsed: Duration) {
        self.duration_ms = duration_millis(elapsed);
    }

    /// Records a metric value.
    pub fn set_metric(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metrics.insert(key.into(), value.into());
    }
}

// ============================================================================
// SECTION: Conflicts
// ============================================================================

/// Kind of contradiction detected between results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Same recommendation type, different actions.
    ContradictoryRecommendations,
    /// Same constraint type, different values.
    ConflictingConstraints,
    /// Same violation type, different severities.
    ConflictingViolations,
    /// Applicable scores spread beyond the tolerance.
    ConflictingScores,
}

impl ConflictType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContradictoryRecommendations => "contradictory_recommendations",
            Self::ConflictingConstraints => "conflicting_constraints",
            Self::ConflictingViolations => "conflicting_violations",
            Self::ConflictingScores => "conflicting_scores",
        }
    }
}

/// Conflict severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Informational.
    Low,
    /// Should be reviewed.
    Medium,
    /// Contradictory hard limits.
    High,
}

/// Detected contradiction between evaluation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictInfo {
    /// Conflict kind.
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Severity.
    pub severity: ConflictSeverity,
    /// Names of the implicated policies.
    pub policies: Vec<String>,
    /// Human-readable description.
    pub description: String,
    /// Supporting details.
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

/// Strategy applied when reconciling results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Nothing to reconcile.
    None,
    /// Highest-scoring result wins.
    PriorityBased,
}

impl ResolutionStrategy {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PriorityBased => "priority_based",
        }
    }
}

/// Outcome of reconciling a set of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Selected policy name; empty when nothing was selected.
    pub selected_policy: String,
    /// Strategy used.
    pub resolution_strategy: ResolutionStrategy,
    /// Losing policy names, in resolution order.
    pub conflicting_policies: Vec<String>,
    /// Justification.
    pub reason: String,
    /// Supporting details.
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    /// Resolution time.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Evaluation Requests
// ============================================================================

/// Inputs for a context-driven evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Workload under evaluation; required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<Workload>,
    /// Cluster snapshot supplied by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_info: Option<Value>,
    /// Node snapshot supplied by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_info: Option<Value>,
    /// Live metrics supplied by the caller.
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
    /// Environment tags.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Originating request identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Originating user identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Knobs for a single evaluation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvaluationOptions {
    /// Restrict candidates to these policy names when non-empty.
    pub policy_ids: Vec<String>,
    /// Keep at most this many applicable policies; zero keeps all.
    pub max_policies: usize,
    /// Fetch every stored policy rather than only active ones.
    pub include_inactive: bool,
    /// Skip persisting results.
    pub dry_run: bool,
    /// Deadline for the whole evaluation call.
    pub timeout: Option<Duration>,
}

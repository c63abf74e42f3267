// crates/workload-policy-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Policy Evaluator
// Description: Applicability checks and per-kind scoring of workloads.
// Purpose: Produce one evaluation result per (workload, policy) pair.
// Dependencies: crate::{core, interfaces, runtime::condition}, serde_json, tracing
// ============================================================================

//! ## Overview
//! The evaluator decides whether a policy applies to a workload and, when it
//! does, scores the pair with the strategy for the policy kind. Batch
//! evaluation isolates failures: a policy that cannot be scored is logged and
//! skipped while the remaining policies are still evaluated.
//!
//! ## Invariants
//! - Inactive policies are never applicable.
//! - Every score is clamped into `[0.0, 1.0]`.
//! - A non-applicable result has a zero score and no findings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Instant;

use serde_json::Value;
use serde_json::json;
use tracing::debug;
use tracing::warn;

use crate::core::AutomationRuleSpec;
use crate::core::EvaluationError;
use crate::core::EvaluationResult;
use crate::core::Policy;
use crate::core::PolicyError;
use crate::core::PolicySpec;
use crate::core::Recommendation;
use crate::core::Timestamp;
use crate::core::Violation;
use crate::core::Workload;
use crate::core::WorkloadType;
use crate::core::time::unix_nanos;
use crate::interfaces::ConditionEvaluator;
use crate::interfaces::Storage;
use crate::runtime::condition::workload_context;

// ============================================================================
// SECTION: Scoring Constants
// ============================================================================

/// Neutral starting score for cost optimization.
const COST_BASE_SCORE: f64 = 0.5;
/// Cost scores below this emit a violation.
const COST_VIOLATION_THRESHOLD: f64 = 0.5;
/// Cost scores below this emit a review recommendation.
const COST_REVIEW_THRESHOLD: f64 = 0.7;
/// Stored priority above which the priority score is raised.
const PRIORITY_BOOST_ABOVE: i32 = 500;
/// Stored priority below which the priority score is lowered.
const PRIORITY_PENALTY_BELOW: i32 = 100;
/// Magnitude of the stored-priority nudge.
const PRIORITY_NUDGE: f64 = 0.2;

// ============================================================================
// SECTION: Policy Evaluator
// ============================================================================

/// Scores workloads against policies.
pub struct PolicyEvaluator {
    /// Storage manager consulted for health.
    storage: Arc<dyn Storage>,
    /// Condition evaluator for automation rules.
    conditions: Arc<dyn ConditionEvaluator>,
    /// Number of single evaluations performed.
    evaluations: AtomicU64,
}

impl PolicyEvaluator {
    /// Creates an evaluator over the given collaborators.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, conditions: Arc<dyn ConditionEvaluator>) -> Self {
        Self {
            storage,
            conditions,
            evaluations: AtomicU64::new(0),
        }
    }

    /// Evaluates a workload against every policy, skipping failures.
    #[must_use]
    pub fn evaluate(&self, workload: &Workload, policies: &[Policy]) -> Vec<EvaluationResult> {
        let mut results = Vec::with_capacity(policies.len());
        for policy in policies {
            match self.evaluate_single(workload, policy) {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(
                        workload_id = %workload.id,
                        policy = policy.name(),
                        error = %err,
                        "policy evaluation failed; skipping policy"
                    );
                }
            }
        }
        results
    }

    /// Evaluates a workload against one policy.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Policy`] naming the policy when it cannot be
    /// scored, for example when its kind has no scoring strategy.
    pub fn evaluate_single(
        &self,
        workload: &Workload,
        policy: &Policy,
    ) -> Result<EvaluationResult, EvaluationError> {
        let started = Instant::now();
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let id = format!("eval-{}-{}-{}", workload.id, policy.name(), unix_nanos());
        let mut result = EvaluationResult::new(id, workload, policy);

        if !self.is_applicable(workload, policy) {
            result.set_duration(started.elapsed());
            debug!(workload_id = %workload.id, policy = policy.name(), "policy not applicable");
            return Ok(result);
        }
        result.applicable = true;

        match &policy.spec {
            PolicySpec::CostOptimization(_) => score_cost(workload, &mut result),
            PolicySpec::Automation(spec) => self.score_automation(workload, spec, &mut result),
            PolicySpec::WorkloadPriority(_) => score_priority(workload, &mut result),
            PolicySpec::ResourceQuota(_) | PolicySpec::Sla(_) | PolicySpec::Security(_) => {
                return Err(EvaluationError::Policy {
                    policy: policy.name().to_string(),
                    message: EvaluationError::UnsupportedPolicyType(
                        policy.policy_type().as_str().to_string(),
                    )
                    .to_string(),
                });
            }
        }

        result.set_duration(started.elapsed());
        debug!(
            workload_id = %workload.id,
            policy = policy.name(),
            evaluation_id = %result.id,
            score = result.score,
            duration_ms = result.duration_ms,
            "policy evaluated"
        );
        Ok(result)
    }

    /// Returns true when the policy applies to the workload.
    ///
    /// Active status is required, the policy namespace (when set) must match,
    /// and every policy label must be present on the workload with the same
    /// value.
    #[must_use]
    pub fn is_applicable(&self, workload: &Workload, policy: &Policy) -> bool {
        if !policy.is_active() {
            return false;
        }
        let metadata = policy.metadata();
        if !metadata.namespace.is_empty() && metadata.namespace != workload.metadata.namespace {
            return false;
        }
        metadata
            .labels
            .iter()
            .all(|(key, value)| workload.labels.get(key).is_some_and(|actual| actual == value))
    }

    /// Filters applicable policies and orders them by priority, highest first.
    ///
    /// Ties keep their input order.
    #[must_use]
    pub fn get_applicable_policies(&self, workload: &Workload, policies: &[Policy]) -> Vec<Policy> {
        let mut applicable: Vec<Policy> = policies
            .iter()
            .filter(|policy| self.is_applicable(workload, policy))
            .cloned()
            .collect();
        applicable.sort_by(|left, right| right.priority().cmp(&left.priority()));
        applicable
    }

    /// Validates policy metadata and kind.
    ///
    /// Kind-specific checks for the scored kinds are permissive.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] for a blank name, a non-positive priority, or a
    /// kind without a scoring strategy.
    pub fn validate_policy(&self, policy: &Policy) -> Result<(), PolicyError> {
        policy.validate()?;
        match policy.spec {
            PolicySpec::CostOptimization(_)
            | PolicySpec::Automation(_)
            | PolicySpec::WorkloadPriority(_) => Ok(()),
            PolicySpec::ResourceQuota(_) | PolicySpec::Sla(_) | PolicySpec::Security(_) => {
                Err(PolicyError::InvalidType(format!(
                    "unknown policy type: {}",
                    policy.policy_type().as_str()
                )))
            }
        }
    }

    /// Returns the number of single evaluations performed.
    #[must_use]
    pub fn evaluations_count(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Checks storage and the condition evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Health`] naming the failing component.
    pub async fn health(&self) -> Result<(), EvaluationError> {
        self.storage.health().await.map_err(|err| EvaluationError::Health {
            component: "storage".to_string(),
            message: err.to_string(),
        })?;
        self.conditions.health().map_err(|err| EvaluationError::Health {
            component: "condition evaluator".to_string(),
            message: err.to_string(),
        })
    }

    /// Scores an automation rule: 1.0 when every condition holds.
    fn score_automation(
        &self,
        workload: &Workload,
        spec: &AutomationRuleSpec,
        result: &mut EvaluationResult,
    ) {
        let met = self.conditions_met(workload, spec);
        result.score = if met { 1.0 } else { 0.0 };
        if met {
            result.recommendations.push(Recommendation {
                recommendation_type: "automation".to_string(),
                priority: "high".to_string(),
                message: "Automation conditions met - action should be triggered".to_string(),
                action: "trigger_automation".to_string(),
                impact: "operational_efficiency".to_string(),
                effort: "low".to_string(),
                timestamp: Timestamp::now(),
            });
        }
        result.set_metric("conditions_met", met);
        result.set_metric("evaluation_type", "automation");
    }

    /// Returns true when every rule condition evaluates to true.
    fn conditions_met(&self, workload: &Workload, spec: &AutomationRuleSpec) -> bool {
        if spec.conditions.is_empty() {
            return true;
        }
        let context = workload_context(workload);
        spec.conditions.iter().all(|condition| {
            let expression = condition.expression();
            match self.conditions.evaluate_condition(&expression, &context) {
                Ok(met) => met,
                Err(err) => {
                    warn!(
                        workload_id = %workload.id,
                        condition = %expression,
                        error = %err,
                        "condition evaluation failed; treating as not met"
                    );
                    false
                }
            }
        })
    }
}

// ============================================================================
// SECTION: Scoring Strategies
// ============================================================================

/// Scores cost optimization potential.
fn score_cost(workload: &Workload, result: &mut EvaluationResult) {
    let score = cost_score(workload);
    result.score = score;

    if score < COST_VIOLATION_THRESHOLD {
        result.violations.push(Violation {
            violation_type: "cost_optimization".to_string(),
            severity: "warning".to_string(),
            message: "Workload may not be cost-optimized".to_string(),
            field: Some("cost_score".to_string()),
            value: Some(json!(score)),
            expected: Some(json!(COST_VIOLATION_THRESHOLD)),
            timestamp: Timestamp::now(),
        });
    }
    if score < COST_REVIEW_THRESHOLD {
        result.recommendations.push(Recommendation {
            recommendation_type: "cost_optimization".to_string(),
            priority: "high".to_string(),
            message: "Consider reviewing resource requirements to reduce cost".to_string(),
            action: "review_resource_requirements".to_string(),
            impact: "cost_reduction".to_string(),
            effort: "medium".to_string(),
            timestamp: Timestamp::now(),
        });
    }
    result.set_metric("cost_score", score);
    result.set_metric("evaluation_type", "cost_optimization");
}

/// Computes the clamped cost score.
fn cost_score(workload: &Workload) -> f64 {
    let type_bonus = match workload.workload_type {
        WorkloadType::MlTraining => 0.2,
        WorkloadType::Inference => 0.3,
        WorkloadType::Batch => 0.4,
        _ => 0.1,
    };
    let gpu_penalty = if workload.requirements.gpu_count() > 0 { 0.1 } else { 0.0 };
    (COST_BASE_SCORE + type_bonus - gpu_penalty).clamp(0.0, 1.0)
}

/// Scores scheduling priority.
fn score_priority(workload: &Workload, result: &mut EvaluationResult) {
    let score = priority_score(workload);
    result.score = score;

    let current = workload.priority.value();
    if (f64::from(current) - (score * 1000.0).floor()).abs() > f64::EPSILON {
        result.recommendations.push(Recommendation {
            recommendation_type: "priority_adjustment".to_string(),
            priority: "medium".to_string(),
            message: "Consider adjusting workload priority".to_string(),
            action: "update_priority".to_string(),
            impact: "scheduling_efficiency".to_string(),
            effort: "low".to_string(),
            timestamp: Timestamp::now(),
        });
    }
    result.set_metric("priority_score", score);
    result.set_metric("current_priority", Value::from(current));
    result.set_metric("evaluation_type", "workload_priority");
}

/// Computes the clamped priority score.
fn priority_score(workload: &Workload) -> f64 {
    let base = match workload.workload_type {
        WorkloadType::RealTime => 0.9,
        WorkloadType::Inference => 0.8,
        WorkloadType::MlTraining => 0.6,
        WorkloadType::Batch => 0.3,
        _ => 0.5,
    };
    let current = workload.priority.value();
    let nudge = if current > PRIORITY_BOOST_ABOVE {
        PRIORITY_NUDGE
    } else if current < PRIORITY_PENALTY_BELOW {
        -PRIORITY_NUDGE
    } else {
        0.0
    };
    (base + nudge).clamp(0.0, 1.0)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;
    use crate::core::GpuRequirements;
    use crate::core::Priority;

    #[test]
    fn cost_score_adjusts_for_type_and_gpu() {
        let batch = Workload::new("w1", WorkloadType::Batch);
        assert!((cost_score(&batch) - 0.9).abs() < 1e-9);

        let mut training = Workload::new("w2", WorkloadType::MlTraining);
        training.requirements.gpu = Some(GpuRequirements {
            count: 2,
            gpu_type: None,
            memory: None,
        });
        assert!((cost_score(&training) - 0.6).abs() < 1e-9);

        let web = Workload::new("w3", WorkloadType::Web);
        assert!((cost_score(&web) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn priority_score_nudged_by_stored_priority() {
        let mut realtime = Workload::new("w1", WorkloadType::RealTime);
        realtime.priority = Priority::CRITICAL;
        assert_eq!(priority_score(&realtime), 1.0);

        let mut batch = Workload::new("w2", WorkloadType::Batch);
        batch.priority = Priority::LOW;
        assert!((priority_score(&batch) - 0.1).abs() < 1e-9);

        let inference = Workload::new("w3", WorkloadType::Inference);
        assert!((priority_score(&inference) - 0.8).abs() < 1e-9);
    }
}

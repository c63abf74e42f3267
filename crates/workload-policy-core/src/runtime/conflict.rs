// crates/workload-policy-core/src/runtime/conflict.rs
// ============================================================================
// Module: Conflict Resolver
// Description: Detects and reconciles contradictions between evaluation results.
// Purpose: Select one policy when several policies disagree about a workload.
// Dependencies: crate::core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Four independent detectors run over the results for one workload:
//! contradictory recommendations, conflicting constraints, conflicting
//! violation severities, and a wide spread of applicable scores. When any
//! conflict is found the result with the highest score wins; score stands in
//! for policy priority here and stored policy priority is not consulted.
//!
//! ## Invariants
//! - A single result always resolves with strategy `none`.
//! - Priority-based resolution is stable for equal scores.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;
use serde_json::json;
use tracing::info;

use crate::core::ConflictInfo;
use crate::core::ConflictResolution;
use crate::core::ConflictSeverity;
use crate::core::ConflictType;
use crate::core::EvaluationError;
use crate::core::EvaluationResult;
use crate::core::PolicyType;
use crate::core::ResolutionStrategy;
use crate::core::Timestamp;
use crate::core::WorkloadId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Score spread above which applicable results are flagged.
pub const SCORE_CONFLICT_THRESHOLD: f64 = 0.3;

// ============================================================================
// SECTION: Conflict Resolver
// ============================================================================

/// Stateless conflict detector and resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    /// Creates a resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reconciles a set of results into one selection.
    #[must_use]
    pub fn resolve_conflicts(&self, results: &[EvaluationResult]) -> ConflictResolution {
        match results {
            [] => none_resolution(String::new(), "No policies to resolve"),
            [only] => none_resolution(only.policy_name.clone(), "Only one policy applicable"),
            [first, ..] => {
                let conflicts = self.detect_conflicts(results);
                if conflicts.is_empty() {
                    return none_resolution(first.policy_name.clone(), "No conflicts detected");
                }
                resolve_by_score(results, &conflicts)
            }
        }
    }

    /// Runs every detector and concatenates their findings.
    #[must_use]
    pub fn detect_conflicts(&self, results: &[EvaluationResult]) -> Vec<ConflictInfo> {
        let mut conflicts = detect_contradictory_recommendations(results);
        conflicts.extend(detect_conflicting_constraints(results));
        conflicts.extend(detect_conflicting_violations(results));
        conflicts.extend(detect_conflicting_scores(results));
        conflicts
    }

    /// Self-test resolving two synthetic results.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Health`] when the self-test selects the
    /// wrong policy.
    pub fn health(&self) -> Result<(), EvaluationError> {
        let probe = [probe_result("policy1", 0.8), probe_result("policy2", 0.6)];
        let resolution = self.resolve_conflicts(&probe);
        if resolution.selected_policy != "policy1" {
            return Err(EvaluationError::Health {
                component: "conflict resolver".to_string(),
                message: format!(
                    "self-test selected {:?} instead of policy1",
                    resolution.selected_policy
                ),
            });
        }
        Ok(())
    }
}

/// Builds a strategy `none` resolution.
fn none_resolution(selected_policy: String, reason: &str) -> ConflictResolution {
    ConflictResolution {
        selected_policy,
        resolution_strategy: ResolutionStrategy::None,
        conflicting_policies: Vec::new(),
        reason: reason.to_string(),
        details: BTreeMap::new(),
        timestamp: Timestamp::now(),
    }
}

/// Selects the highest-scoring result; the rest become conflicting policies.
fn resolve_by_score(
    results: &[EvaluationResult],
    conflicts: &[ConflictInfo],
) -> ConflictResolution {
    let mut ranked: Vec<&EvaluationResult> = results.iter().collect();
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));

    let (selected, rest) = match ranked.split_first() {
        Some((selected, rest)) => ((*selected).clone(), rest),
        None => return none_resolution(String::new(), "No policies to resolve"),
    };
    let conflicting_policies: Vec<String> =
        rest.iter().map(|result| result.policy_name.clone()).collect();

    let mut details = BTreeMap::new();
    details.insert("selected_score".to_string(), json!(selected.score));
    details.insert("conflict_count".to_string(), json!(conflicts.len()));
    details.insert("total_policies".to_string(), json!(results.len()));

    info!(
        selected_policy = %selected.policy_name,
        conflicting_policies = ?conflicting_policies,
        conflict_count = conflicts.len(),
        "resolved policy conflicts by score"
    );

    ConflictResolution {
        selected_policy: selected.policy_name,
        resolution_strategy: ResolutionStrategy::PriorityBased,
        conflicting_policies,
        reason: format!("Selected policy with highest priority/score: {:.2}", selected.score),
        details,
        timestamp: Timestamp::now(),
    }
}

// ============================================================================
// SECTION: Detectors
// ============================================================================

/// Values observed for one finding category: value label to policy names.
type Observations = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Records `(category, value, policy)` for applicable results only.
fn observe<'a, F, I>(results: &'a [EvaluationResult], findings: F) -> Observations
where
    F: Fn(&'a EvaluationResult) -> I,
    I: Iterator<Item = (String, String)>,
{
    let mut observed: Observations = BTreeMap::new();
    for result in results.iter().filter(|result| result.applicable) {
        for (category, value) in findings(result) {
            observed
                .entry(category)
                .or_default()
                .entry(value)
                .or_default()
                .insert(result.policy_name.clone());
        }
    }
    observed
}

/// Turns categories with more than one distinct value into conflicts.
fn conflicts_from(
    observed: Observations,
    conflict_type: ConflictType,
    severity: ConflictSeverity,
    category_key: &str,
    values_key: &str,
    describe: impl Fn(&str) -> String,
) -> Vec<ConflictInfo> {
    observed
        .into_iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(category, values)| {
            let policies: BTreeSet<String> = values.values().flatten().cloned().collect();
            let value_map: serde_json::Map<String, Value> = values
                .iter()
                .map(|(value, owners)| (value.clone(), json!(owners)))
                .collect();
            let mut details = BTreeMap::new();
            details.insert(category_key.to_string(), json!(category));
            details.insert(values_key.to_string(), Value::Object(value_map));
            ConflictInfo {
                conflict_type,
                severity,
                policies: policies.into_iter().collect(),
                description: describe(&category),
                details,
            }
        })
        .collect()
}

/// Same recommendation type with different actions.
fn detect_contradictory_recommendations(results: &[EvaluationResult]) -> Vec<ConflictInfo> {
    let observed = observe(results, |result| {
        result
            .recommendations
            .iter()
            .map(|rec| (rec.recommendation_type.clone(), rec.action.clone()))
    });
    conflicts_from(
        observed,
        ConflictType::ContradictoryRecommendations,
        ConflictSeverity::Medium,
        "recommendation_type",
        "conflicting_actions",
        |category| format!("Conflicting recommendations for type '{category}'"),
    )
}

/// Same constraint type with different values.
fn detect_conflicting_constraints(results: &[EvaluationResult]) -> Vec<ConflictInfo> {
    let observed = observe(results, |result| {
        result
            .constraints
            .iter()
            .map(|constraint| (constraint.constraint_type.clone(), constraint.value.to_string()))
    });
    conflicts_from(
        observed,
        ConflictType::ConflictingConstraints,
        ConflictSeverity::High,
        "constraint_type",
        "conflicting_values",
        |category| format!("Conflicting constraints for type '{category}'"),
    )
}

/// Same violation type with different severities.
fn detect_conflicting_violations(results: &[EvaluationResult]) -> Vec<ConflictInfo> {
    let observed = observe(results, |result| {
        result
            .violations
            .iter()
            .map(|violation| (violation.violation_type.clone(), violation.severity.clone()))
    });
    conflicts_from(
        observed,
        ConflictType::ConflictingViolations,
        ConflictSeverity::Medium,
        "violation_type",
        "conflicting_severities",
        |category| format!("Conflicting violation assessments for type '{category}'"),
    )
}

/// Applicable scores spread wider than the threshold.
fn detect_conflicting_scores(results: &[EvaluationResult]) -> Vec<ConflictInfo> {
    let mut applicable = results.iter().filter(|result| result.applicable);
    let Some(first) = applicable.next() else {
        return Vec::new();
    };
    let mut min = first;
    let mut max = first;
    let mut count = 1_usize;
    for result in applicable {
        count += 1;
        if result.score < min.score {
            min = result;
        }
        if result.score > max.score {
            max = result;
        }
    }
    let difference = max.score - min.score;
    if count < 2 || difference <= SCORE_CONFLICT_THRESHOLD {
        return Vec::new();
    }

    let mut details = BTreeMap::new();
    details.insert("min_score".to_string(), json!(min.score));
    details.insert("max_score".to_string(), json!(max.score));
    details.insert("difference".to_string(), json!(difference));
    details.insert("min_policy".to_string(), json!(min.policy_name));
    details.insert("max_policy".to_string(), json!(max.policy_name));
    vec![ConflictInfo {
        conflict_type: ConflictType::ConflictingScores,
        severity: ConflictSeverity::Low,
        policies: vec![min.policy_name.clone(), max.policy_name.clone()],
        description: format!(
            "Significant score difference between policies: {:.2} vs {:.2}",
            min.score, max.score
        ),
        details,
    }]
}

/// Synthetic applicable result for the health self-test.
fn probe_result(policy: &str, score: f64) -> EvaluationResult {
    EvaluationResult {
        id: format!("health-{policy}").into(),
        policy_name: policy.to_string(),
        policy_type: PolicyType::CostOptimization,
        workload_id: WorkloadId::new("health-check"),
        applicable: true,
        score,
        violations: Vec::new(),
        recommendations: Vec::new(),
        constraints: Vec::new(),
        metrics: BTreeMap::new(),
        duration_ms: 0,
        timestamp: Timestamp::now(),
    }
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
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn health_self_test_passes() {
        assert!(ConflictResolver::new().health().is_ok());
    }

    #[test]
    fn non_applicable_results_do_not_spread_scores() {
        let mut low = probe_result("low", 0.0);
        low.applicable = false;
        let results = [probe_result("high", 0.9), low];
        assert!(detect_conflicting_scores(&results).is_empty());
    }
}

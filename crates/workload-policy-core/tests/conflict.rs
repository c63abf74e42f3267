// crates/workload-policy-core/tests/conflict.rs
// ============================================================================
// Module: Conflict Resolution Tests
// Description: Detector coverage and score-based selection.
// Purpose: Ensure competing results resolve to the highest score.
// ============================================================================

//! Conflict detection and resolution tests.

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

use serde_json::json;
use workload_policy_core::ConflictResolver;
use workload_policy_core::ConflictSeverity;
use workload_policy_core::ConflictType;
use workload_policy_core::Constraint;
use workload_policy_core::EvaluationResult;
use workload_policy_core::Recommendation;
use workload_policy_core::ResolutionStrategy;
use workload_policy_core::Timestamp;
use workload_policy_core::Violation;
use workload_policy_core::WorkloadType;

fn result(policy: &str, score: f64) -> EvaluationResult {
    let workload = common::workload("w1", WorkloadType::Batch);
    let mut result = EvaluationResult::new(
        format!("eval-{policy}"),
        &workload,
        &common::cost_policy(policy, 100),
    );
    result.applicable = true;
    result.score = score;
    result
}

fn recommendation(recommendation_type: &str, action: &str) -> Recommendation {
    Recommendation {
        recommendation_type: recommendation_type.to_string(),
        priority: "medium".to_string(),
        message: format!("{recommendation_type} via {action}"),
        action: action.to_string(),
        impact: "cost_reduction".to_string(),
        effort: "low".to_string(),
        timestamp: Timestamp::now(),
    }
}

fn violation(violation_type: &str, severity: &str) -> Violation {
    Violation {
        violation_type: violation_type.to_string(),
        severity: severity.to_string(),
        message: "over budget".to_string(),
        field: None,
        value: None,
        expected: None,
        timestamp: Timestamp::now(),
    }
}

fn constraint(constraint_type: &str, value: serde_json::Value) -> Constraint {
    Constraint {
        constraint_type: constraint_type.to_string(),
        name: "max-cost".to_string(),
        description: String::new(),
        value,
        operator: "<=".to_string(),
        enforced: true,
    }
}

#[test]
fn empty_and_single_inputs_need_no_resolution() {
    let resolver = ConflictResolver::new();

    let empty = resolver.resolve_conflicts(&[]);
    assert_eq!(empty.resolution_strategy, ResolutionStrategy::None);
    assert_eq!(empty.selected_policy, "");
    assert_eq!(empty.reason, "No policies to resolve");

    let single = resolver.resolve_conflicts(&[result("only", 0.4)]);
    assert_eq!(single.selected_policy, "only");
    assert_eq!(single.reason, "Only one policy applicable");
    assert!(single.conflicting_policies.is_empty());
}

#[test]
fn agreeing_results_keep_the_first_policy() {
    let resolution =
        ConflictResolver::new().resolve_conflicts(&[result("first", 0.5), result("second", 0.7)]);
    assert_eq!(resolution.resolution_strategy, ResolutionStrategy::None);
    assert_eq!(resolution.selected_policy, "first");
    assert_eq!(resolution.reason, "No conflicts detected");
}

#[test]
fn contradictory_recommendations_select_the_highest_score() {
    let mut cheap = result("cheap", 0.6);
    cheap.recommendations.push(recommendation("scaling", "scale_down"));
    let mut fast = result("fast", 0.75);
    fast.recommendations.push(recommendation("scaling", "scale_up"));
    let neutral = result("neutral", 0.7);

    let resolver = ConflictResolver::new();
    let conflicts = resolver.detect_conflicts(&[cheap.clone(), fast.clone(), neutral.clone()]);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].conflict_type, ConflictType::ContradictoryRecommendations);
    assert_eq!(conflicts[0].severity, ConflictSeverity::Medium);
    assert_eq!(conflicts[0].policies, vec!["cheap", "fast"]);
    assert_eq!(conflicts[0].details.get("recommendation_type"), Some(&json!("scaling")));

    let resolution = resolver.resolve_conflicts(&[cheap, fast, neutral]);
    assert_eq!(resolution.resolution_strategy, ResolutionStrategy::PriorityBased);
    assert_eq!(resolution.selected_policy, "fast");
    assert_eq!(resolution.conflicting_policies, vec!["neutral", "cheap"]);
    assert_eq!(resolution.reason, "Selected policy with highest priority/score: 0.75");
    assert_eq!(resolution.details.get("conflict_count"), Some(&json!(1)));
    assert_eq!(resolution.details.get("total_policies"), Some(&json!(3)));
}

#[test]
fn score_ranking_orders_the_losing_policies() {
    let results = [result("a", 0.9), result("b", 0.6), result("c", 0.3)];
    let resolution = ConflictResolver::new().resolve_conflicts(&results);
    assert_eq!(resolution.resolution_strategy, ResolutionStrategy::PriorityBased);
    assert_eq!(resolution.selected_policy, "a");
    assert_eq!(resolution.conflicting_policies, vec!["b", "c"]);
}

#[test]
fn score_spread_threshold_is_exclusive_of_small_gaps() {
    let resolver = ConflictResolver::new();
    let wide = resolver.detect_conflicts(&[result("a", 0.9), result("b", 0.5)]);
    assert!(wide.iter().any(|conflict| conflict.conflict_type == ConflictType::ConflictingScores));
    assert!(resolver.detect_conflicts(&[result("a", 0.9), result("b", 0.7)]).is_empty());
}

#[test]
fn constraint_and_violation_disagreements_are_reported() {
    let mut left = result("left", 0.5);
    left.constraints.push(constraint("cost", json!(100)));
    left.violations.push(violation("budget", "warning"));
    let mut right = result("right", 0.6);
    right.constraints.push(constraint("cost", json!(250)));
    right.violations.push(violation("budget", "critical"));

    let conflicts = ConflictResolver::new().detect_conflicts(&[left, right]);
    let types: Vec<ConflictType> = conflicts.iter().map(|conflict| conflict.conflict_type).collect();
    assert_eq!(
        types,
        vec![ConflictType::ConflictingConstraints, ConflictType::ConflictingViolations]
    );
    assert_eq!(conflicts[0].severity, ConflictSeverity::High);
    assert_eq!(conflicts[1].description, "Conflicting violation assessments for type 'budget'");
}

#[test]
fn wide_score_spread_is_a_low_severity_conflict() {
    let results = [result("mid", 0.5), result("low", 0.1), result("high", 0.9)];
    let conflicts = ConflictResolver::new().detect_conflicts(&results);

    assert_eq!(conflicts.len(), 1);
    let spread = &conflicts[0];
    assert_eq!(spread.conflict_type, ConflictType::ConflictingScores);
    assert_eq!(spread.severity, ConflictSeverity::Low);
    assert_eq!(spread.policies, vec!["low", "high"]);
    assert_eq!(spread.details.get("min_policy"), Some(&json!("low")));
    assert_eq!(spread.details.get("max_policy"), Some(&json!("high")));

    let resolution = ConflictResolver::new().resolve_conflicts(&results);
    assert_eq!(resolution.selected_policy, "high");
}

#[test]
fn non_applicable_findings_are_ignored() {
    let mut ignored = result("ignored", 0.0);
    ignored.applicable = false;
    ignored.recommendations.push(recommendation("scaling", "scale_up"));
    let mut counted = result("counted", 0.2);
    counted.recommendations.push(recommendation("scaling", "scale_down"));

    assert!(ConflictResolver::new().detect_conflicts(&[ignored, counted]).is_empty());
}

// crates/workload-policy-core/src/runtime/engine.rs
// ============================================================================
// Module: Evaluation Engine
// Description: Orchestrates policy lookup, scoring, conflict checks, and persistence.
// Purpose: Evaluate workloads end to end and synthesize recommended decisions.
// Dependencies: crate::{core, interfaces, runtime}, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! The evaluation engine is the entry point for scoring a workload. It loads
//! candidate policies from storage, keeps the applicable ones, scores them,
//! runs conflict resolution for observability, and persists every result.
//! Conflict resolution never filters or reorders what callers receive.
//!
//! ## Invariants
//! - Zero applicable policies yields an empty result set, not an error.
//! - The deadline bounds lookup and scoring only; results are persisted
//!   after it and persistence failures are logged, never returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::core::Decision;
use crate::core::DecisionReason;
use crate::core::DecisionStatus;
use crate::core::DecisionType;
use crate::core::EvaluationContext;
use crate::core::EvaluationError;
use crate::core::EvaluationOptions;
use crate::core::EvaluationResult;
use crate::core::PolicyType;
use crate::core::ResolutionStrategy;
use crate::core::Workload;
use crate::core::time::duration_millis;
use crate::core::time::unix_nanos;
use crate::interfaces::ConditionEvaluator;
use crate::interfaces::Storage;
use crate::runtime::conflict::ConflictResolver;
use crate::runtime::evaluator::PolicyEvaluator;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default deadline for one evaluation call.
pub const DEFAULT_EVALUATION_TIMEOUT: Duration = Duration::from_secs(10);
/// Source recorded on synthesized decisions.
const DECISION_SOURCE: &str = "policy_evaluator";
/// Version recorded on synthesized decisions.
const DECISION_VERSION: &str = "1.0";

/// Evaluation engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationEngineConfig {
    /// Deadline used when a call does not set one.
    pub evaluation_timeout: Duration,
}

impl Default for EvaluationEngineConfig {
    fn default() -> Self {
        Self {
            evaluation_timeout: DEFAULT_EVALUATION_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Evaluation Engine
// ============================================================================

/// Orchestrator over the policy evaluator and conflict resolver.
pub struct EvaluationEngine {
    /// Policy scorer.
    evaluator: PolicyEvaluator,
    /// Conflict resolver.
    resolver: ConflictResolver,
    /// Storage manager.
    storage: Arc<dyn Storage>,
    /// Engine settings.
    config: EvaluationEngineConfig,
}

impl EvaluationEngine {
    /// Creates an engine over shared storage and a condition evaluator.
    #[must_use]
    pub fn new(
        storage: Arc<dyn Storage>,
        conditions: Arc<dyn ConditionEvaluator>,
        config: EvaluationEngineConfig,
    ) -> Self {
        Self {
            evaluator: PolicyEvaluator::new(Arc::clone(&storage), conditions),
            resolver: ConflictResolver::new(),
            storage,
            config,
        }
    }

    /// Returns the policy evaluator.
    #[must_use]
    pub const fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// Returns the conflict resolver.
    #[must_use]
    pub const fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    /// Evaluates a workload against the stored policies.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Storage`] when policies cannot be loaded and
    /// [`EvaluationError::Timeout`] when lookup and scoring exceed the
    /// deadline.
    pub async fn evaluate_workload(
        &self,
        workload: &Workload,
        options: &EvaluationOptions,
    ) -> Result<Vec<EvaluationResult>, EvaluationError> {
        let started = Instant::now();
        let deadline = options.timeout.unwrap_or(self.config.evaluation_timeout);
        let results = tokio::time::timeout(deadline, self.score_workload(workload, options))
            .await
            .map_err(|_| {
                EvaluationError::Timeout(format!(
                    "evaluation of workload {} exceeded {}ms",
                    workload.id,
                    duration_millis(deadline)
                ))
            })??;

        if !options.dry_run {
            self.persist_results(workload, &results).await;
        }

        info!(
            workload_id = %workload.id,
            duration_ms = duration_millis(started.elapsed()),
            policies_evaluated = results.len(),
            "completed workload evaluation"
        );
        Ok(results)
    }

    /// Evaluates the workload carried by a context.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidInput`] when the context has no
    /// workload, otherwise the errors of [`Self::evaluate_workload`].
    pub async fn evaluate_with_context(
        &self,
        context: &EvaluationContext,
        options: &EvaluationOptions,
    ) -> Result<Vec<EvaluationResult>, EvaluationError> {
        let Some(workload) = &context.workload else {
            return Err(EvaluationError::InvalidInput(
                "workload is required in evaluation context".to_string(),
            ));
        };
        self.evaluate_workload(workload, options).await
    }

    /// Builds a pending decision from the best-scoring result.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidInput`] when `results` is empty.
    pub fn get_recommended_decision(
        &self,
        results: &[EvaluationResult],
    ) -> Result<Decision, EvaluationError> {
        let best = results
            .iter()
            .reduce(|best, candidate| if candidate.score > best.score { candidate } else { best })
            .ok_or_else(|| {
                EvaluationError::InvalidInput(
                    "no evaluation results to base decision on".to_string(),
                )
            })?;

        let decision_type = match best.policy_type {
            PolicyType::CostOptimization => DecisionType::Optimize,
            _ => DecisionType::Schedule,
        };
        let reason = match best.policy_type {
            PolicyType::CostOptimization => DecisionReason::CostOptimization,
            PolicyType::Automation => DecisionReason::AutomationRule,
            _ => DecisionReason::PolicyCompliance,
        };
        let id = format!("decision-{}-{}", best.workload_id, unix_nanos());

        let mut decision = Decision::new(
            id,
            decision_type,
            reason,
            best.workload_id.clone(),
            best.policy_name.clone(),
        );
        decision.status = DecisionStatus::Pending;
        decision.confidence = best.score;
        decision.score = best.score;
        decision.message = decision_message(best);
        decision.metadata.source = DECISION_SOURCE.to_string();
        decision.metadata.version = DECISION_VERSION.to_string();
        decision.add_detail("policy_name", best.policy_name.clone());
        decision.add_detail("policy_type", best.policy_type.as_str());
        decision.add_detail("violations_count", best.violations.len());
        decision.add_detail("recommendations_count", best.recommendations.len());
        if let Some(primary) = best.recommendations.first() {
            decision.add_detail(
                "primary_recommendation",
                serde_json::to_value(primary).unwrap_or(Value::Null),
            );
        }

        info!(
            decision_id = %decision.id,
            decision_type = decision.decision_type.as_str(),
            policy = %decision.policy_id,
            confidence = decision.confidence,
            "generated recommended decision"
        );
        Ok(decision)
    }

    /// Returns a snapshot of engine metrics.
    #[must_use]
    pub fn metrics(&self) -> BTreeMap<String, Value> {
        let mut metrics = BTreeMap::new();
        metrics.insert("engine_type".to_string(), json!("policy_evaluation"));
        metrics.insert(
            "components".to_string(),
            json!(["policy_evaluator", "conflict_resolver", "storage_manager"]),
        );
        metrics.insert("evaluations_count".to_string(), json!(self.evaluator.evaluations_count()));
        metrics
    }

    /// Checks the evaluator, resolver, and storage in turn.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Health`] naming the failing subsystem.
    pub async fn health(&self) -> Result<(), EvaluationError> {
        self.evaluator.health().await.map_err(|err| EvaluationError::Health {
            component: "policy evaluator".to_string(),
            message: err.to_string(),
        })?;
        self.resolver.health().map_err(|err| EvaluationError::Health {
            component: "conflict resolver".to_string(),
            message: err.to_string(),
        })?;
        self.storage.health().await.map_err(|err| EvaluationError::Health {
            component: "storage".to_string(),
            message: err.to_string(),
        })
    }

    /// Loads, filters, and scores the candidate policies.
    async fn score_workload(
        &self,
        workload: &Workload,
        options: &EvaluationOptions,
    ) -> Result<Vec<EvaluationResult>, EvaluationError> {
        info!(
            workload_id = %workload.id,
            workload_type = workload.workload_type.as_str(),
            "starting workload evaluation"
        );

        let store = self.storage.policies();
        let mut candidates = if options.include_inactive {
            store.list().await?
        } else {
            store.get_active_policies().await?
        };
        if !options.policy_ids.is_empty() {
            let wanted: BTreeSet<&str> = options.policy_ids.iter().map(String::as_str).collect();
            candidates.retain(|policy| wanted.contains(policy.name()));
        }

        let mut applicable = self.evaluator.get_applicable_policies(workload, &candidates);
        if options.max_policies > 0 {
            applicable.truncate(options.max_policies);
        }
        if applicable.is_empty() {
            info!(workload_id = %workload.id, "no applicable policies found");
            return Ok(Vec::new());
        }

        let results = self.evaluator.evaluate(workload, &applicable);

        if results.len() > 1 {
            let resolution = self.resolver.resolve_conflicts(&results);
            if resolution.resolution_strategy != ResolutionStrategy::None {
                info!(
                    workload_id = %workload.id,
                    strategy = resolution.resolution_strategy.as_str(),
                    selected_policy = %resolution.selected_policy,
                    conflicting_policies = ?resolution.conflicting_policies,
                    "policy conflicts resolved"
                );
            }
        }
        Ok(results)
    }

    /// Stores every result, logging failures.
    async fn persist_results(&self, workload: &Workload, results: &[EvaluationResult]) {
        let store = self.storage.evaluations();
        for result in results {
            if let Err(err) = store.create(result.clone()).await {
                warn!(
                    workload_id = %workload.id,
                    policy = %result.policy_name,
                    evaluation_id = %result.id,
                    error = %err,
                    "failed to store evaluation result"
                );
            }
        }
    }
}

/// Picks the human-readable message for a decision.
fn decision_message(result: &EvaluationResult) -> String {
    if let Some(recommendation) = result.recommendations.first() {
        return recommendation.message.clone();
    }
    if let Some(violation) = result.violations.first() {
        return format!("Policy violation detected: {}", violation.message);
    }
    format!("Policy evaluation completed with score {:.2}", result.score)
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
    use crate::core::Policy;
    use crate::core::PolicyMetadata;
    use crate::core::PolicySpec;
    use crate::core::PolicyStatus;
    use crate::core::Priority;
    use crate::core::WorkloadType;

    fn result_with_score(score: f64) -> EvaluationResult {
        let workload = Workload::new("w1", WorkloadType::Batch);
        let policy = Policy::new(
            PolicyMetadata::new("p", Priority::NORMAL),
            PolicyStatus::Active,
            PolicySpec::CostOptimization(crate::core::CostOptimizationSpec::default()),
        );
        let mut result = EvaluationResult::new("e", &workload, &policy);
        result.applicable = true;
        result.score = score;
        result
    }

    #[test]
    fn generic_message_reports_score() {
        assert_eq!(
            decision_message(&result_with_score(0.5)),
            "Policy evaluation completed with score 0.50"
        );
    }
}

// crates/workload-policy-core/src/runtime/condition.rs
// ============================================================================
// Module: Field Condition Evaluator
// Description: Built-in condition evaluator for `path op literal` rules.
// Purpose: Evaluate automation conditions against a workload context.
// Dependencies: crate::interfaces, crate::runtime::comparator, serde_json
// ============================================================================

//! ## Overview
//! [`FieldConditionEvaluator`] understands structured comparisons only, not a
//! general expression language. A rule has the form `path operator literal`
//! where `path` is a dotted lookup into the context, `operator` is one of the
//! tokens accepted by [`Operator::parse`], and `literal` is JSON. A literal
//! that is not valid JSON is taken as a bare string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::AutomationError;
use crate::core::Workload;
use crate::interfaces::ConditionEvaluator;
use crate::runtime::comparator::Operator;
use crate::runtime::comparator::compare;

// ============================================================================
// SECTION: Workload Context
// ============================================================================

/// Builds the evaluation context for a workload.
///
/// Keys: `workload`, `requirements`, `metadata`, `constraints`.
#[must_use]
pub fn workload_context(workload: &Workload) -> Value {
    let mut context = Map::new();
    context.insert("workload".to_string(), serde_json::to_value(workload).unwrap_or(Value::Null));
    context.insert(
        "requirements".to_string(),
        serde_json::to_value(&workload.requirements).unwrap_or(Value::Null),
    );
    context.insert(
        "metadata".to_string(),
        serde_json::to_value(&workload.metadata).unwrap_or(Value::Null),
    );
    context.insert(
        "constraints".to_string(),
        workload
            .constraints
            .as_ref()
            .and_then(|constraints| serde_json::to_value(constraints).ok())
            .unwrap_or(Value::Null),
    );
    Value::Object(context)
}

// ============================================================================
// SECTION: Rule Parsing
// ============================================================================

/// Parsed `path op literal` rule.
#[derive(Debug, Clone, PartialEq)]
struct FieldRule {
    /// Dotted context path.
    path: String,
    /// Comparison operator.
    operator: Operator,
    /// Literal operand.
    literal: Value,
}

/// Splits a rule into path and remainder.
fn split_token(input: &str) -> (&str, Option<&str>) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, Some(rest.trim_start())),
        None => (input, None),
    }
}

/// Parses a full `path op literal` rule.
fn parse_rule(expression: &str) -> Result<FieldRule, AutomationError> {
    if expression.trim().is_empty() {
        return Err(AutomationError::InvalidCondition("rule cannot be empty".to_string()));
    }
    let (path, rest) = split_token(expression);
    let Some(rest) = rest else {
        return Err(AutomationError::InvalidCondition(format!(
            "rule {expression:?} is missing an operator"
        )));
    };
    let (token, literal) = split_token(rest);
    let operator = Operator::parse(token).ok_or_else(|| {
        AutomationError::InvalidCondition(format!("unknown operator {token:?}"))
    })?;
    let Some(literal) = literal.filter(|literal| !literal.is_empty()) else {
        return Err(AutomationError::InvalidCondition(format!(
            "rule {expression:?} is missing a value"
        )));
    };
    let literal =
        serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.to_string()));
    Ok(FieldRule {
        path: path.to_string(),
        operator,
        literal,
    })
}

/// Resolves a dotted path; array segments are numeric indices.
fn resolve_path<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Condition evaluator for structured field comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldConditionEvaluator;

impl FieldConditionEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ConditionEvaluator for FieldConditionEvaluator {
    fn evaluate_condition(
        &self,
        expression: &str,
        context: &Value,
    ) -> Result<bool, AutomationError> {
        let rule = parse_rule(expression)?;
        let actual = resolve_path(context, &rule.path).unwrap_or(&Value::Null);
        compare(rule.operator, actual, &rule.literal).ok_or_else(|| {
            AutomationError::InvalidCondition(format!(
                "cannot compare {} {} {}",
                rule.path,
                rule.operator.as_str(),
                rule.literal
            ))
        })
    }

    fn evaluate_expression(
        &self,
        expression: &str,
        context: &Value,
    ) -> Result<Value, AutomationError> {
        let (path, rest) = split_token(expression);
        if path.is_empty() {
            return Err(AutomationError::InvalidCondition("rule cannot be empty".to_string()));
        }
        if rest.is_some() {
            return self.evaluate_condition(expression, context).map(Value::Bool);
        }
        resolve_path(context, path)
            .cloned()
            .ok_or_else(|| AutomationError::InvalidCondition(format!("path {path} not found")))
    }

    fn validate_rule(&self, expression: &str) -> Result<(), AutomationError> {
        parse_rule(expression).map(|_| ())
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

    use serde_json::json;

    use super::*;
    use crate::core::GpuRequirements;
    use crate::core::WorkloadType;

    fn gpu_workload() -> Workload {
        let mut workload = Workload::new("w1", WorkloadType::MlTraining);
        workload.requirements.gpu = Some(GpuRequirements {
            count: 4,
            gpu_type: Some("a100".to_string()),
            memory: None,
        });
        workload.metadata.namespace = "research".to_string();
        workload
    }

    #[test]
    fn evaluates_against_workload_context() {
        let evaluator = FieldConditionEvaluator::new();
        let context = workload_context(&gpu_workload());
        assert!(evaluator.evaluate_condition("requirements.gpu.count >= 2", &context).unwrap());
        assert!(evaluator.evaluate_condition("workload.type == \"ml_training\"", &context).unwrap());
        assert!(evaluator.evaluate_condition("metadata.namespace == research", &context).unwrap());
        assert!(!evaluator.evaluate_condition("requirements.gpu.type == \"h100\"", &context).unwrap());
    }

    #[test]
    fn missing_path_is_null() {
        let evaluator = FieldConditionEvaluator::new();
        let context = json!({"workload": {}});
        assert!(evaluator.evaluate_condition("workload.missing == null", &context).unwrap());
        assert!(evaluator.evaluate_condition("workload.missing > 1", &context).is_err());
    }

    #[test]
    fn rejects_malformed_rules() {
        let evaluator = FieldConditionEvaluator::new();
        assert_eq!(
            evaluator.validate_rule("  "),
            Err(AutomationError::InvalidCondition("rule cannot be empty".to_string()))
        );
        assert!(evaluator.validate_rule("workload.type").is_err());
        assert!(evaluator.validate_rule("workload.type ~= batch").is_err());
        assert!(evaluator.validate_rule("workload.type ==").is_err());
        assert!(evaluator.validate_rule("workload.type in [\"batch\"]").is_ok());
    }

    #[test]
    fn bare_path_expression_returns_value() {
        let evaluator = FieldConditionEvaluator::new();
        let context = workload_context(&gpu_workload());
        assert_eq!(evaluator.evaluate_expression("requirements.gpu.count", &context).unwrap(), json!(4));
        assert_eq!(
            evaluator.evaluate_expression("requirements.cpu < 1", &context).unwrap(),
            json!(true)
        );
    }
}

// crates/workload-policy-core/src/runtime/comparator.rs
// ============================================================================
// Module: Condition Operators
// Description: Operator tokens and value comparison for field conditions.
// Purpose: Compare resolved context values against condition literals.
// Dependencies: bigdecimal, serde_json, time
// ============================================================================

//! ## Overview
//! Comparison returns `None` when the operands cannot be compared under the
//! requested operator (for example ordering a string against a number).
//! Callers treat `None` as a malformed condition. Numeric comparison is
//! decimal-aware; strings that both parse as RFC3339 compare temporally.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Number;
use serde_json::Value;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Comparison operator accepted in automation conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `contains`
    Contains,
    /// `not_contains`
    NotContains,
    /// `starts_with`
    StartsWith,
    /// `ends_with`
    EndsWith,
    /// `in`
    In,
    /// `not_in`
    NotIn,
}

impl Operator {
    /// Parses an operator token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let operator = match token {
            "==" | "eq" => Self::Equals,
            "!=" | "ne" => Self::NotEquals,
            ">" | "gt" => Self::GreaterThan,
            ">=" | "gte" => Self::GreaterThanOrEqual,
            "<" | "lt" => Self::LessThan,
            "<=" | "lte" => Self::LessThanOrEqual,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            _ => return None,
        };
        Some(operator)
    }

    /// Returns the canonical token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::In => "in",
            Self::NotIn => "not_in",
        }
    }
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Compares an observed value against a condition literal.
#[must_use]
pub fn compare(operator: Operator, actual: &Value, expected: &Value) -> Option<bool> {
    match operator {
        Operator::Equals => Some(values_equal(actual, expected)),
        Operator::NotEquals => Some(!values_equal(actual, expected)),
        Operator::GreaterThan
        | Operator::GreaterThanOrEqual
        | Operator::LessThan
        | Operator::LessThanOrEqual => {
            let ordering = compare_ordering(actual, expected)?;
            Some(match operator {
                Operator::GreaterThan => ordering.is_gt(),
                Operator::GreaterThanOrEqual => ordering.is_ge(),
                Operator::LessThan => ordering.is_lt(),
                _ => ordering.is_le(),
            })
        }
        Operator::Contains => compare_contains(actual, expected),
        Operator::NotContains => compare_contains(actual, expected).map(|found| !found),
        Operator::StartsWith => match (actual, expected) {
            (Value::String(value), Value::String(prefix)) => Some(value.starts_with(prefix)),
            _ => None,
        },
        Operator::EndsWith => match (actual, expected) {
            (Value::String(value), Value::String(suffix)) => Some(value.ends_with(suffix)),
            _ => None,
        },
        Operator::In => compare_in_set(actual, expected),
        Operator::NotIn => compare_in_set(actual, expected).map(|found| !found),
    }
}

/// Equality with decimal-aware numbers.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            decimal_cmp(left, right).is_some_and(Ordering::is_eq)
        }
        _ => left == right,
    }
}

/// Orders numbers or RFC3339 strings.
fn compare_ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => decimal_cmp(left, right),
        (Value::String(left), Value::String(right)) => temporal_cmp(left, right),
        _ => None,
    }
}

/// Substring or element containment.
fn compare_contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match (haystack, needle) {
        (Value::String(haystack), Value::String(needle)) => Some(haystack.contains(needle)),
        (Value::Array(items), Value::Array(needles)) => {
            Some(needles.iter().all(|needle| items.iter().any(|item| values_equal(item, needle))))
        }
        (Value::Array(items), scalar) => {
            Some(items.iter().any(|item| values_equal(item, scalar)))
        }
        (Value::Object(map), Value::String(key)) => Some(map.contains_key(key)),
        _ => None,
    }
}

/// Set membership against an array literal.
fn compare_in_set(value: &Value, set: &Value) -> Option<bool> {
    let Value::Array(items) = set else {
        return None;
    };
    match value {
        Value::Array(_) | Value::Object(_) => None,
        _ => Some(items.iter().any(|item| values_equal(value, item))),
    }
}

/// Orders numeric JSON values using decimal-aware comparison.
fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = BigDecimal::from_str(&left.to_string()).ok()?;
    let right = BigDecimal::from_str(&right.to_string()).ok()?;
    Some(left.cmp(&right))
}

/// Compares RFC3339 date-time or date-only strings.
fn temporal_cmp(left: &str, right: &str) -> Option<Ordering> {
    if let (Ok(left), Ok(right)) =
        (OffsetDateTime::parse(left, &Rfc3339), OffsetDateTime::parse(right, &Rfc3339))
    {
        return Some(left.cmp(&right));
    }
    let left = parse_date(left)?;
    let right = parse_date(right)?;
    Some(left.cmp(&right))
}

/// Parses a `YYYY-MM-DD` date.
fn parse_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
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

    #[test]
    fn numbers_compare_by_decimal_value() {
        assert_eq!(compare(Operator::Equals, &json!(1), &json!(1.0)), Some(true));
        assert_eq!(compare(Operator::GreaterThan, &json!(2.5), &json!(2)), Some(true));
        assert_eq!(compare(Operator::LessThanOrEqual, &json!(3), &json!(3)), Some(true));
    }

    #[test]
    fn rfc3339_strings_compare_temporally() {
        let earlier = json!("2024-01-01T00:00:00Z");
        let later = json!("2024-01-01T01:00:00+00:00");
        assert_eq!(compare(Operator::LessThan, &earlier, &later), Some(true));
        assert_eq!(compare(Operator::GreaterThan, &json!("2024-02-01"), &json!("2024-01-31")), Some(true));
    }

    #[test]
    fn ordering_mismatched_types_is_undecidable() {
        assert_eq!(compare(Operator::GreaterThan, &json!("abc"), &json!(1)), None);
        assert_eq!(compare(Operator::LessThan, &json!("abc"), &json!("abd")), None);
    }

    #[test]
    fn membership_and_containment() {
        assert_eq!(compare(Operator::In, &json!("batch"), &json!(["batch", "inference"])), Some(true));
        assert_eq!(compare(Operator::NotIn, &json!("web"), &json!(["batch"])), Some(true));
        assert_eq!(compare(Operator::Contains, &json!(["a", "b"]), &json!("b")), Some(true));
        assert_eq!(compare(Operator::NotContains, &json!("training"), &json!("infer")), Some(true));
        assert_eq!(compare(Operator::StartsWith, &json!("gpu-a100"), &json!("gpu-")), Some(true));
        assert_eq!(compare(Operator::EndsWith, &json!("gpu-a100"), &json!("a100")), Some(true));
    }

    #[test]
    fn operator_tokens_round_trip() {
        for token in ["==", "!=", ">", ">=", "<", "<=", "contains", "not_contains", "in", "not_in"] {
            let operator = Operator::parse(token).unwrap();
            assert_eq!(operator.as_str(), token);
        }
        assert!(Operator::parse("~=").is_none());
    }
}

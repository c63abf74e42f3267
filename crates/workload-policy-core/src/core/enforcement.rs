// crates/workload-policy-core/src/core/enforcement.rs
// ============================================================================
// Module: Enforcement Model
// Description: Actions, action results, retry policies, and enforcement status.
// Purpose: Describe the executable steps derived from a decision and their progress.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Actions are ephemeral: the policy enforcer generates them from a decision
//! and the enforcement engine routes each one to an executor. Progress for a
//! whole decision is tracked in an [`EnforcementStatus`].
//!
//! ## Invariants
//! - Enforcement state moves `pending -> running -> terminal` and never leaves
//!   a terminal state.
//! - Reaching a terminal state stamps `completed_at` and sets progress to 100.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::DecisionId;
use crate::core::time::Timestamp;
use crate::core::time::duration_millis;

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Routing key for executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Place a workload.
    Schedule,
    /// Re-place a workload.
    Reschedule,
    /// Migrate a workload.
    Migrate,
    /// Scale a workload.
    Scale,
    /// Terminate a workload.
    Terminate,
    /// Suspend a workload.
    Suspend,
    /// Resume a workload.
    Resume,
    /// Send a notification.
    Notify,
    /// Update a workload in place.
    Update,
    /// Delete a resource.
    Delete,
    /// Create a resource.
    Create,
}

impl ActionType {
    /// Every action type, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Schedule,
        Self::Reschedule,
        Self::Migrate,
        Self::Scale,
        Self::Terminate,
        Self::Suspend,
        Self::Resume,
        Self::Notify,
        Self::Update,
        Self::Delete,
        Self::Create,
    ];

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
            Self::Notify => "notify",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }
}

/// Delay growth between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Constant delay.
    #[default]
    Fixed,
    /// Delay grows by one interval per attempt.
    Linear,
    /// Delay doubles per attempt.
    Exponential,
}

/// Retry policy for a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay.
    pub interval: Duration,
    /// Delay growth.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Returns the delay to wait after the zero-indexed `attempt` fails.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Linear => self.interval.saturating_mul(attempt.saturating_add(1)),
            Backoff::Exponential => self.interval.saturating_mul(2_u32.saturating_pow(attempt)),
        }
    }
}

/// One executable step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Routing key.
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Target resource (usually a workload id).
    pub target: String,
    /// Executor parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    /// Deadline; the engine default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Optional retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

impl Action {
    /// Creates an action with no parameters, timeout, or retry policy.
    #[must_use]
    pub fn new(action_type: ActionType, target: impl Into<String>) -> Self {
        Self {
            action_type,
            target: target.into(),
            parameters: BTreeMap::new(),
            timeout: None,
            retry_policy: None,
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    /// Returns a string parameter when present and non-empty.
    #[must_use]
    pub fn string_parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str).filter(|value| !value.is_empty())
    }
}

/// Outcome of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Executed action type.
    pub action_type: ActionType,
    /// Whether the action succeeded.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Executor output.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
    /// Completion time.
    pub timestamp: Timestamp,
    /// Error text when the action failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Retries actually used.
    pub retry_count: u32,
}

impl ActionResult {
    /// Creates a successful result.
    #[must_use]
    pub fn succeeded(action_type: ActionType, message: impl Into<String>) -> Self {
        Self {
            action_type,
            success: true,
            message: message.into(),
            data: BTreeMap::new(),
            duration_ms: 0,
            timestamp: Timestamp::now(),
            error: None,
            retry_count: 0,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(
        action_type: ActionType,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            success: false,
            message: message.into(),
            data: BTreeMap::new(),
            duration_ms: 0,
            timestamp: Timestamp::now(),
            error: Some(error.into()),
            retry_count: 0,
        }
    }

    /// Adds an output entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Stamps the wall time.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ms = duration_millis(duration);
    }
}

// ============================================================================
// SECTION: Enforcement Status
// ============================================================================

/// Enforcement lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementState {
    /// Accepted, waiting for a worker slot.
    #[default]
    Pending,
    /// Executing the action plan.
    Running,
    /// Every action succeeded.
    Completed,
    /// An action or setup step failed.
    Failed,
    /// Cancelled by a caller.
    Cancelled,
    /// Deadline elapsed.
    Timeout,
}

impl EnforcementState {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }

    /// Returns true for states the routine never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled | Self::Timeout)
    }
}

/// Progress event recorded during enforcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementEvent {
    /// Event kind (e.g. `started`, `action_started`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Human-readable message.
    pub message: String,
    /// Event time.
    pub timestamp: Timestamp,
    /// Optional structured data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

/// Per-decision progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementStatus {
    /// Decision being enforced.
    pub decision_id: DecisionId,
    /// Lifecycle state.
    pub status: EnforcementState,
    /// Progress percentage in `[0, 100]`.
    pub progress: f64,
    /// Latest human-readable message.
    pub message: String,
    /// Creation time.
    pub started_at: Timestamp,
    /// Terminal time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Total wall time in milliseconds once terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-form details.
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    /// Ordered progress events.
    #[serde(default)]
    pub events: Vec<EnforcementEvent>,
}

impl EnforcementStatus {
    /// Creates a pending status for a decision.
    #[must_use]
    pub fn pending(decision_id: DecisionId) -> Self {
        Self {
            decision_id,
            status: EnforcementState::Pending,
            progress: 0.0,
            message: "Enforcement pending".to_string(),
            started_at: Timestamp::now(),
            completed_at: None,
            duration_ms: None,
            error: None,
            details: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Appends an event without data.
    pub fn push_event(&mut self, event_type: &str, message: impl Into<String>) {
        self.push_event_with(event_type, message, BTreeMap::new());
    }

    /// Appends an event with structured data.
    pub fn push_event_with(
        &mut self,
        event_type: &str,
        message: impl Into<String>,
        data: BTreeMap<String, Value>,
    ) {
        self.events.push(EnforcementEvent {
            event_type: event_type.to_string(),
            message: message.into(),
            timestamp: Timestamp::now(),
            data,
        });
    }

    /// Moves to a terminal state, stamping completion time, duration, and progress.
    pub fn finish(&mut self, state: EnforcementState, message: impl Into<String>) {
        let now = Timestamp::now();
        self.status = state;
        self.message = message.into();
        self.progress = 100.0;
        self.completed_at = Some(now);
        self.duration_ms = Some(duration_millis(now.since(self.started_at)));
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn event_count(&self, event_type: &str) -> usize {
        self.events.iter().filter(|event| event.event_type == event_type).count()
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

    fn policy(backoff: Backoff) -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            interval: Duration::from_millis(10),
            backoff,
        }
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let retry = policy(Backoff::Fixed);
        assert_eq!(retry.delay_for(0), Duration::from_millis(10));
        assert_eq!(retry.delay_for(4), Duration::from_millis(10));
    }

    #[test]
    fn linear_backoff_grows_by_interval() {
        let retry = policy(Backoff::Linear);
        assert_eq!(retry.delay_for(0), Duration::from_millis(10));
        assert_eq!(retry.delay_for(2), Duration::from_millis(30));
    }

    #[test]
    fn exponential_backoff_doubles() {
        let retry = policy(Backoff::Exponential);
        assert_eq!(retry.delay_for(0), Duration::from_millis(10));
        assert_eq!(retry.delay_for(1), Duration::from_millis(20));
        assert_eq!(retry.delay_for(3), Duration::from_millis(80));
    }

    #[test]
    fn exponential_backoff_saturates_instead_of_overflowing() {
        let retry = policy(Backoff::Exponential);
        assert!(retry.delay_for(200) >= retry.delay_for(31));
    }

    #[test]
    fn finish_stamps_completion_and_full_progress() {
        let mut status = EnforcementStatus::pending(DecisionId::new("d1"));
        status.finish(EnforcementState::Failed, "boom");
        assert_eq!(status.status, EnforcementState::Failed);
        assert!((status.progress - 100.0).abs() < f64::EPSILON);
        assert!(status.completed_at.is_some());
        assert!(status.duration_ms.is_some());
    }
}

// crates/workload-policy-core/src/core/policy.rs
// ============================================================================
// Module: Policy Model
// Description: Policy records and their type-specific payloads.
// Purpose: Represent cost, automation, and priority policies behind one shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Policy`] pairs shared metadata with a [`PolicySpec`] payload tagged by
//! kind. Callers read policies through the shared accessors
//! (`metadata`, `policy_type`, `priority`, `status`, `validate`); only the
//! scoring and validation boundaries in the evaluator match on the payload.
//!
//! ## Invariants
//! - Policies are immutable for the duration of an evaluation pass.
//! - `PolicyMetadata::name` is the policy identity in evaluation records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::errors::PolicyError;
use crate::core::time::Timestamp;
use crate::core::workload::Priority;

// ============================================================================
// SECTION: Policy Enums
// ============================================================================

/// Policy kind label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    /// Cost optimization policy.
    #[serde(rename = "CostOptimizationPolicy")]
    CostOptimization,
    /// Automation rule.
    #[serde(rename = "AutomationRule")]
    Automation,
    /// Workload priority policy.
    #[serde(rename = "WorkloadPriorityPolicy")]
    WorkloadPriority,
    /// Resource quota policy.
    #[serde(rename = "ResourceQuotaPolicy")]
    ResourceQuota,
    /// Service-level agreement policy.
    #[serde(rename = "SLAPolicy")]
    Sla,
    /// Security policy.
    #[serde(rename = "SecurityPolicy")]
    Security,
}

impl PolicyType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CostOptimization => "CostOptimizationPolicy",
            Self::Automation => "AutomationRule",
            Self::WorkloadPriority => "WorkloadPriorityPolicy",
            Self::ResourceQuota => "ResourceQuotaPolicy",
            Self::Sla => "SLAPolicy",
            Self::Security => "SecurityPolicy",
        }
    }
}

/// Policy lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    /// Participates in evaluation.
    Active,
    /// Stored but ignored by evaluation.
    Inactive,
    /// Authored but not yet released.
    #[default]
    Draft,
    /// Retired.
    Archived,
}

impl PolicyStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Draft => "draft",
            Self::Archived => "archived",
        }
    }
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Metadata shared by every policy kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// Unique policy name.
    pub name: String,
    /// Namespace scope; empty applies to every namespace.
    #[serde(default)]
    pub namespace: String,
    /// Policy priority used for ordering applicable policies.
    #[serde(default)]
    pub priority: Priority,
    /// Label selector; every entry must match the workload's labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Free-form annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Author-supplied version string.
    #[serde(default)]
    pub version: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl PolicyMetadata {
    /// Creates metadata with a name and priority and empty selectors.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            priority,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            version: String::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

// ============================================================================
// SECTION: Cost Optimization Payload
// ============================================================================

/// Weighted optimization objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationObjective {
    /// Objective kind (e.g. `cost`, `latency`, `power`).
    #[serde(rename = "type")]
    pub objective_type: String,
    /// Relative weight.
    pub weight: f64,
    /// Optional target expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Hard limits declared by a cost policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostConstraints {
    /// Maximum hourly cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_per_hour: Option<f64>,
    /// Maximum power usage in watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power_usage: Option<u32>,
    /// Minimum efficiency ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_efficiency_ratio: Option<f64>,
    /// Maximum latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency_ms: Option<u32>,
    /// Minimum availability ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_availability_ratio: Option<f64>,
}

/// Cost optimization policy payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostOptimizationSpec {
    /// Weighted objectives.
    #[serde(default)]
    pub objectives: Vec<OptimizationObjective>,
    /// Hard limits.
    #[serde(default)]
    pub constraints: CostConstraints,
}

// ============================================================================
// SECTION: Automation Payload
// ============================================================================

/// Single automation trigger condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationCondition {
    /// Dotted path into the workload context.
    pub field: String,
    /// Comparison operator token.
    pub operator: String,
    /// Expected value.
    pub value: Value,
    /// Optional sustain duration (e.g. `5m`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl AutomationCondition {
    /// Renders the condition as a `field operator literal` expression.
    #[must_use]
    pub fn expression(&self) -> String {
        format!("{} {} {}", self.field, self.operator, self.value)
    }
}

/// Action an automation rule requests when triggered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationAction {
    /// Action kind label.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Optional action target.
    #[serde(default)]
    pub target: String,
    /// Optional human message.
    #[serde(default)]
    pub message: String,
    /// Free-form parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

/// Automation rule payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutomationRuleSpec {
    /// Conditions that must all hold for the rule to fire.
    #[serde(default)]
    pub conditions: Vec<AutomationCondition>,
    /// Actions requested when the rule fires.
    #[serde(default)]
    pub actions: Vec<AutomationAction>,
}

// ============================================================================
// SECTION: Workload Priority Payload
// ============================================================================

/// Named priority class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityClass {
    /// Class name.
    pub name: String,
    /// Numeric priority for the class.
    pub value: i32,
    /// Optional description.
    #[serde(default)]
    pub description: String,
}

/// Pattern-to-class mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadMapping {
    /// Workload name pattern.
    pub pattern: String,
    /// Priority class applied on match.
    pub priority_class: String,
}

/// Workload priority policy payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkloadPrioritySpec {
    /// Declared priority classes.
    #[serde(default)]
    pub priority_classes: Vec<PriorityClass>,
    /// Pattern mapping.
    #[serde(default)]
    pub workload_mapping: Vec<WorkloadMapping>,
    /// Class used when no mapping matches.
    #[serde(default)]
    pub default_class: String,
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Opaque payload for policy kinds without a dedicated scoring strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenericPolicySpec {
    /// Free-form parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

/// Type-specific policy payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PolicySpec {
    /// Cost optimization payload.
    #[serde(rename = "CostOptimizationPolicy")]
    CostOptimization(CostOptimizationSpec),
    /// Automation rule payload.
    #[serde(rename = "AutomationRule")]
    Automation(AutomationRuleSpec),
    /// Workload priority payload.
    #[serde(rename = "WorkloadPriorityPolicy")]
    WorkloadPriority(WorkloadPrioritySpec),
    /// Resource quota payload.
    #[serde(rename = "ResourceQuotaPolicy")]
    ResourceQuota(GenericPolicySpec),
    /// SLA payload.
    #[serde(rename = "SLAPolicy")]
    Sla(GenericPolicySpec),
    /// Security payload.
    #[serde(rename = "SecurityPolicy")]
    Security(GenericPolicySpec),
}

impl PolicySpec {
    /// Returns the policy kind for this payload.
    #[must_use]
    pub const fn policy_type(&self) -> PolicyType {
        match self {
            Self::CostOptimization(_) => PolicyType::CostOptimization,
            Self::Automation(_) => PolicyType::Automation,
            Self::WorkloadPriority(_) => PolicyType::WorkloadPriority,
            Self::ResourceQuota(_) => PolicyType::ResourceQuota,
            Self::Sla(_) => PolicyType::Sla,
            Self::Security(_) => PolicyType::Security,
        }
    }
}

/// Policy record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Shared metadata.
    pub metadata: PolicyMetadata,
    /// Lifecycle status.
    pub status: PolicyStatus,
    /// Kind-tagged payload.
    pub spec: PolicySpec,
}

impl Policy {
    /// Creates a policy from its parts.
    #[must_use]
    pub const fn new(metadata: PolicyMetadata, status: PolicyStatus, spec: PolicySpec) -> Self {
        Self {
            metadata,
            status,
            spec,
        }
    }

    /// Returns the shared metadata.
    #[must_use]
    pub const fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the policy kind.
    #[must_use]
    pub const fn policy_type(&self) -> PolicyType {
        self.spec.policy_type()
    }

    /// Returns the policy priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.metadata.priority
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PolicyStatus {
        self.status
    }

    /// Returns true when the policy participates in evaluation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    /// Validates the metadata shared by every policy kind.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the name is blank or the priority is not positive.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.metadata.name.trim().is_empty() {
            return Err(PolicyError::InvalidName("policy name must be non-empty".to_string()));
        }
        if self.metadata.priority.value() <= 0 {
            return Err(PolicyError::InvalidPriority(format!(
                "policy {} priority must be positive, got {}",
                self.metadata.name,
                self.metadata.priority.value()
            )));
        }
        Ok(())
    }
}

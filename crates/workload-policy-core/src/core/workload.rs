// crates/workload-policy-core/src/core/workload.rs
// ============================================================================
// Module: Workload Model
// Description: Workload descriptions consumed by evaluation and enforcement.
// Purpose: Describe the unit of compute being placed or optimized.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Workloads are created by the surrounding platform. This crate reads them
//! during evaluation and mutates only their status (and update timestamp)
//! when enforcement executors act on them. Workloads are never deleted here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::WorkloadId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Priority
// ============================================================================

/// Numeric scheduling priority shared by workloads and policies.
///
/// # Invariants
/// - Higher values win; the named constants are conventional anchors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    /// Low priority anchor.
    pub const LOW: Self = Self(10);
    /// Normal priority anchor.
    pub const NORMAL: Self = Self(100);
    /// High priority anchor.
    pub const HIGH: Self = Self(500);
    /// Critical priority anchor.
    pub const CRITICAL: Self = Self(1000);

    /// Creates a priority from a raw value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw priority value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

// ============================================================================
// SECTION: Workload Enums
// ============================================================================

/// Workload category used by scoring heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadType {
    /// Long-running deployment.
    Deployment,
    /// Machine-learning training job.
    MlTraining,
    /// Model inference service.
    Inference,
    /// Batch job.
    Batch,
    /// Latency-sensitive real-time workload.
    #[serde(rename = "realtime")]
    RealTime,
    /// Web service.
    Web,
    /// Database.
    Database,
    /// Cache tier.
    Cache,
    /// Storage service.
    Storage,
}

impl WorkloadType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::MlTraining => "ml_training",
            Self::Inference => "inference",
            Self::Batch => "batch",
            Self::RealTime => "realtime",
            Self::Web => "web",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Storage => "storage",
        }
    }
}

/// Workload lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    /// Accepted but not yet placed.
    #[default]
    Pending,
    /// Placed and running.
    Running,
    /// Finished successfully or terminated.
    Completed,
    /// Finished unsuccessfully.
    Failed,
    /// Cancelled before completion.
    Cancelled,
    /// Paused by enforcement.
    Suspended,
}

impl WorkloadStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Suspended => "suspended",
        }
    }
}

// ============================================================================
// SECTION: Resource Requirements
// ============================================================================

/// GPU demand for a workload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpuRequirements {
    /// Number of GPUs requested.
    pub count: u32,
    /// Requested accelerator model.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub gpu_type: Option<String>,
    /// Requested GPU memory (e.g. `16Gi`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// NPU demand for a workload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NpuRequirements {
    /// Number of NPUs requested.
    pub count: u32,
    /// Requested accelerator model.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub npu_type: Option<String>,
}

/// Network demand for a workload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkRequirements {
    /// Bandwidth requirement (e.g. `10Gbps`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<String>,
    /// Latency requirement (e.g. `5ms`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
}

/// Resource requirements requested by a workload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// CPU cores.
    #[serde(default)]
    pub cpu: u32,
    /// Memory quantity (e.g. `8Gi`).
    #[serde(default)]
    pub memory: String,
    /// Storage quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    /// GPU demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<GpuRequirements>,
    /// NPU demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npu: Option<NpuRequirements>,
    /// Network demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkRequirements>,
}

impl ResourceRequirements {
    /// Returns the requested GPU count, zero when no GPU block is present.
    #[must_use]
    pub fn gpu_count(&self) -> u32 {
        self.gpu.as_ref().map_or(0, |gpu| gpu.count)
    }
}

/// Placement constraints attached to a workload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkloadConstraints {
    /// Maximum acceptable hourly cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_per_hour: Option<f64>,
    /// Clusters preferred for placement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_clusters: Vec<String>,
    /// Clusters that must never host the workload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_clusters: Vec<String>,
    /// Node selector labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selectors: BTreeMap<String, String>,
}

/// Ownership metadata for a workload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkloadMetadata {
    /// Namespace the workload belongs to.
    #[serde(default)]
    pub namespace: String,
    /// Owning principal.
    #[serde(default)]
    pub owner: String,
    /// Owning team.
    #[serde(default)]
    pub team: String,
    /// Project name.
    #[serde(default)]
    pub project: String,
    /// Deployment environment.
    #[serde(default)]
    pub environment: String,
    /// Cost center for chargeback.
    #[serde(default)]
    pub cost_center: String,
}

// ============================================================================
// SECTION: Workload
// ============================================================================

/// Workload record.
///
/// # Invariants
/// - `id` is stable for the lifetime of the workload.
/// - Enforcement only changes `status` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Workload identifier.
    pub id: WorkloadId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Workload category.
    #[serde(rename = "type")]
    pub workload_type: WorkloadType,
    /// Lifecycle status.
    #[serde(default)]
    pub status: WorkloadStatus,
    /// Scheduling priority.
    #[serde(default)]
    pub priority: Priority,
    /// Selector labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Free-form annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Requested resources.
    #[serde(default)]
    pub requirements: ResourceRequirements,
    /// Optional placement constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<WorkloadConstraints>,
    /// Ownership metadata.
    #[serde(default)]
    pub metadata: WorkloadMetadata,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

impl Workload {
    /// Creates a pending workload with default requirements and metadata.
    #[must_use]
    pub fn new(id: impl Into<WorkloadId>, workload_type: WorkloadType) -> Self {
        let now = Timestamp::now();
        Self {
            id: id.into(),
            name: String::new(),
            workload_type,
            status: WorkloadStatus::Pending,
            priority: Priority::NORMAL,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            requirements: ResourceRequirements::default(),
            constraints: None,
            metadata: WorkloadMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the status and stamps the update time.
    pub fn set_status(&mut self, status: WorkloadStatus) {
        self.status = status;
        self.updated_at = Timestamp::now();
    }

    /// Returns true when the workload is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == WorkloadStatus::Running
    }
}

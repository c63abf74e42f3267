// crates/workload-policy-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Storage
// Description: Mutex-guarded entity stores and the storage manager over them.
// Purpose: Provide storage for tests and local embedding.
// Dependencies: crate::{core, interfaces}, async-trait
// ============================================================================

//! ## Overview
//! Each store keeps its records in a `BTreeMap` behind a mutex. Creating an
//! existing key is a conflict; reading, updating, or deleting a missing key
//! is not-found. Records are cloned in and out so callers never hold a lock.
//! Durable backends are outside this crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::Decision;
use crate::core::DecisionId;
use crate::core::EvaluationId;
use crate::core::EvaluationResult;
use crate::core::Policy;
use crate::core::PolicyType;
use crate::core::StorageError;
use crate::core::Timestamp;
use crate::core::Workload;
use crate::core::WorkloadId;
use crate::interfaces::DecisionStore;
use crate::interfaces::EvaluationStore;
use crate::interfaces::PolicyStore;
use crate::interfaces::Storage;
use crate::interfaces::WorkloadStore;

// ============================================================================
// SECTION: Record Table
// ============================================================================

/// Keyed record map shared by the in-memory stores.
#[derive(Debug)]
struct Table<T> {
    /// Entity label used in error messages.
    entity: &'static str,
    /// Records keyed by identifier.
    records: Arc<Mutex<BTreeMap<String, T>>>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            records: Arc::clone(&self.records),
        }
    }
}

impl<T: Clone> Table<T> {
    /// Creates an empty table.
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Runs a closure with the map locked.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, T>) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StorageError::Operation(format!("{} store mutex poisoned", self.entity)))?;
        f(&mut guard)
    }

    /// Inserts a record under a fresh key.
    fn create(&self, key: &str, record: T) -> Result<(), StorageError> {
        self.with(|records| {
            if records.contains_key(key) {
                return Err(StorageError::Conflict(format!("{} {key} already exists", self.entity)));
            }
            records.insert(key.to_string(), record);
            Ok(())
        })
    }

    /// Returns a copy of a record.
    fn get(&self, key: &str) -> Result<T, StorageError> {
        self.with(|records| records.get(key).cloned().ok_or_else(|| self.not_found(key)))
    }

    /// Replaces an existing record.
    fn update(&self, key: &str, record: T) -> Result<(), StorageError> {
        self.with(|records| match records.get_mut(key) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(self.not_found(key)),
        })
    }

    /// Removes an existing record.
    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.with(|records| records.remove(key).map(|_| ()).ok_or_else(|| self.not_found(key)))
    }

    /// Returns copies of the records that pass the filter, in key order.
    fn filter(&self, keep: impl Fn(&T) -> bool) -> Result<Vec<T>, StorageError> {
        self.with(|records| Ok(records.values().filter(|record| keep(record)).cloned().collect()))
    }

    /// Builds the not-found error for a key.
    fn not_found(&self, key: &str) -> StorageError {
        StorageError::NotFound(format!("{} {key}", self.entity))
    }
}

// ============================================================================
// SECTION: Entity Stores
// ============================================================================

/// In-memory policy store keyed by policy name.
#[derive(Debug, Clone)]
pub struct InMemoryPolicyStore {
    /// Policy records.
    table: Table<Policy>,
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self {
            table: Table::new("policy"),
        }
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn create(&self, policy: Policy) -> Result<(), StorageError> {
        let key = policy.name().to_string();
        self.table.create(&key, policy)
    }

    async fn get(&self, name: &str) -> Result<Policy, StorageError> {
        self.table.get(name)
    }

    async fn update(&self, policy: Policy) -> Result<(), StorageError> {
        let key = policy.name().to_string();
        self.table.update(&key, policy)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.table.delete(name)
    }

    async fn list(&self) -> Result<Vec<Policy>, StorageError> {
        self.table.filter(|_| true)
    }

    async fn get_active_policies(&self) -> Result<Vec<Policy>, StorageError> {
        self.table.filter(Policy::is_active)
    }

    async fn get_by_type(&self, policy_type: PolicyType) -> Result<Vec<Policy>, StorageError> {
        self.table.filter(|policy| policy.policy_type() == policy_type)
    }
}

/// In-memory workload store.
#[derive(Debug, Clone)]
pub struct InMemoryWorkloadStore {
    /// Workload records.
    table: Table<Workload>,
}

impl Default for InMemoryWorkloadStore {
    fn default() -> Self {
        Self {
            table: Table::new("workload"),
        }
    }
}

#[async_trait]
impl WorkloadStore for InMemoryWorkloadStore {
    async fn create(&self, workload: Workload) -> Result<(), StorageError> {
        let key = workload.id.as_str().to_string();
        self.table.create(&key, workload)
    }

    async fn get(&self, id: &WorkloadId) -> Result<Workload, StorageError> {
        self.table.get(id.as_str())
    }

    async fn update(&self, mut workload: Workload) -> Result<(), StorageError> {
        workload.updated_at = Timestamp::now();
        let key = workload.id.as_str().to_string();
        self.table.update(&key, workload)
    }

    async fn delete(&self, id: &WorkloadId) -> Result<(), StorageError> {
        self.table.delete(id.as_str())
    }

    async fn list(&self) -> Result<Vec<Workload>, StorageError> {
        self.table.filter(|_| true)
    }
}

/// In-memory decision store.
#[derive(Debug, Clone)]
pub struct InMemoryDecisionStore {
    /// Decision records.
    table: Table<Decision>,
}

impl Default for InMemoryDecisionStore {
    fn default() -> Self {
        Self {
            table: Table::new("decision"),
        }
    }
}

#[async_trait]
impl DecisionStore for InMemoryDecisionStore {
    async fn create(&self, decision: Decision) -> Result<(), StorageError> {
        let key = decision.id.as_str().to_string();
        self.table.create(&key, decision)
    }

    async fn get(&self, id: &DecisionId) -> Result<Decision, StorageError> {
        self.table.get(id.as_str())
    }

    async fn update(&self, mut decision: Decision) -> Result<(), StorageError> {
        decision.updated_at = Timestamp::now();
        let key = decision.id.as_str().to_string();
        self.table.update(&key, decision)
    }

    async fn delete(&self, id: &DecisionId) -> Result<(), StorageError> {
        self.table.delete(id.as_str())
    }

    async fn list_by_workload(
        &self,
        workload_id: &WorkloadId,
    ) -> Result<Vec<Decision>, StorageError> {
        self.table.filter(|decision| &decision.workload_id == workload_id)
    }
}

/// In-memory evaluation result store.
#[derive(Debug, Clone)]
pub struct InMemoryEvaluationStore {
    /// Evaluation records.
    table: Table<EvaluationResult>,
}

impl Default for InMemoryEvaluationStore {
    fn default() -> Self {
        Self {
            table: Table::new("evaluation"),
        }
    }
}

#[async_trait]
impl EvaluationStore for InMemoryEvaluationStore {
    async fn create(&self, result: EvaluationResult) -> Result<(), StorageError> {
        let key = result.id.as_str().to_string();
        self.table.create(&key, result)
    }

    async fn get(&self, id: &EvaluationId) -> Result<EvaluationResult, StorageError> {
        self.table.get(id.as_str())
    }

    async fn list_by_workload(
        &self,
        workload_id: &WorkloadId,
    ) -> Result<Vec<EvaluationResult>, StorageError> {
        let mut results = self.table.filter(|result| &result.workload_id == workload_id)?;
        results.sort_by_key(|result| result.timestamp);
        Ok(results)
    }
}

// ============================================================================
// SECTION: Storage Manager
// ============================================================================

/// Storage manager over the in-memory stores.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    /// Policy store.
    policies: InMemoryPolicyStore,
    /// Workload store.
    workloads: InMemoryWorkloadStore,
    /// Decision store.
    decisions: InMemoryDecisionStore,
    /// Evaluation store.
    evaluations: InMemoryEvaluationStore,
}

impl InMemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn policies(&self) -> &dyn PolicyStore {
        &self.policies
    }

    fn workloads(&self) -> &dyn WorkloadStore {
        &self.workloads
    }

    fn decisions(&self) -> &dyn DecisionStore {
        &self.decisions
    }

    fn evaluations(&self) -> &dyn EvaluationStore {
        &self.evaluations
    }
}

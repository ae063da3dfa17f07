//! In-memory pipeline registry with bounded retention.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

use super::record::{PipelineId, PipelineRecord, SharedRecord};

/// How many records the registry keeps, and for how long.
///
/// Only terminal records are ever evicted. A run that is still in flight
/// stays registered even if that temporarily exceeds `max_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_records: usize,
    /// Terminal records older than this (by `finished_at`) are dropped by
    /// [`PipelineRegistry::sweep_expired`].
    pub ttl: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records: 1000,
            ttl: Some(Duration::from_secs(3600)),
        }
    }
}

/// Thread-safe store of every pipeline record.
///
/// # Design
///
/// - **Shared ownership**: Cloneable via `Arc`; the orchestrator and the
///   metrics view hold clones of the same registry
/// - **Per-record locking**: each record sits behind its own lock, so a run
///   updating its steps never blocks readers of other records
/// - **Lock order**: registry lock, then record lock. Runs only ever take the
///   record lock
#[derive(Clone)]
pub struct PipelineRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

struct RegistryInner {
    records: HashMap<PipelineId, SharedRecord>,
    /// Insertion order, oldest first. Drives capacity eviction.
    order: VecDeque<PipelineId>,
    policy: RetentionPolicy,
}

impl std::fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("PipelineRegistry")
            .field("records", &inner.records.len())
            .field("policy", &inner.policy)
            .finish()
    }
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

impl PipelineRegistry {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                records: HashMap::new(),
                order: VecDeque::new(),
                policy,
            })),
        }
    }

    /// Register a new record and return the shared handle the run mutates.
    ///
    /// # Errors
    ///
    /// Returns error if a record with this id already exists.
    pub fn add(&self, record: PipelineRecord) -> TrustscoreResult<SharedRecord> {
        let mut inner = self.inner.write();

        if inner.records.contains_key(record.id()) {
            return Err(TrustscoreError::Internal(format!(
                "pipeline {} already registered",
                record.id()
            )));
        }

        let id = record.id().clone();
        tracing::debug!(pipeline_id = %id, address = %record.address(), "Registering pipeline");

        let shared = Arc::new(RwLock::new(record));
        inner.records.insert(id.clone(), Arc::clone(&shared));
        inner.order.push_back(id);
        inner.enforce_capacity();

        Ok(shared)
    }

    /// Snapshot of one record.
    pub fn get(&self, id: &PipelineId) -> Option<PipelineRecord> {
        let inner = self.inner.read();
        inner.records.get(id).map(|record| record.read().clone())
    }

    /// Snapshot of every retained record. Order is not meaningful.
    pub fn all_records(&self) -> Vec<PipelineRecord> {
        let inner = self.inner.read();
        inner
            .records
            .values()
            .map(|record| record.read().clone())
            .collect()
    }

    /// Snapshot of records whose run is pending or processing.
    pub fn active_records(&self) -> Vec<PipelineRecord> {
        let inner = self.inner.read();
        inner
            .records
            .values()
            .filter_map(|record| {
                let record = record.read();
                record.is_active().then(|| record.clone())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop terminal records that finished more than `ttl` before `now`.
    ///
    /// Returns the number of records removed. A policy without a TTL removes
    /// nothing.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.write();
        let Some(ttl) = inner.policy.ttl else {
            return 0;
        };
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let cutoff = now - ttl;

        let expired: Vec<PipelineId> = inner
            .records
            .iter()
            .filter(|(_, record)| {
                let record = record.read();
                !record.is_active() && record.finished_at().is_some_and(|at| at < cutoff)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            inner.remove(id);
        }

        if !expired.is_empty() {
            tracing::debug!(removed = expired.len(), "Swept expired pipeline records");
        }
        expired.len()
    }
}

impl RegistryInner {
    fn remove(&mut self, id: &PipelineId) {
        self.records.remove(id);
        self.order.retain(|existing| existing != id);
    }

    /// Evict the oldest terminal records until within capacity.
    fn enforce_capacity(&mut self) {
        let excess = self.records.len().saturating_sub(self.policy.max_records);
        if excess == 0 {
            return;
        }

        let victims: Vec<PipelineId> = self
            .order
            .iter()
            .filter(|id| {
                self.records
                    .get(*id)
                    .is_some_and(|record| !record.read().is_active())
            })
            .take(excess)
            .cloned()
            .collect();

        if victims.len() < excess {
            tracing::warn!(
                retained = self.records.len(),
                max_records = self.policy.max_records,
                "Pipeline registry over capacity with active runs"
            );
        }

        for id in &victims {
            self.remove(id);
        }
    }
}

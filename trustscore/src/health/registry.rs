//! Live status of every external dependency.

use super::probe::{DependencyProbe, HealthCheck, ProbeOutcome};
use super::tcp::TcpCheck;
use crate::options::{DependencyEndpoint, HealthOptions};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Reachability of one dependency as of its last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// Last probe succeeded (or not yet probed).
    Active,
    /// Registered without a probe; never checked.
    Inactive,
    /// Last probe failed or timed out.
    Error,
}

/// Aggregate verdict over all dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Every dependency is active.
    Healthy,
    /// Strictly more than half are active.
    Degraded,
    /// Half or fewer are active.
    Down,
}

impl HealthStatus {
    /// Threshold rule; every dependency weighs the same.
    pub fn evaluate(active: usize, total: usize) -> Self {
        if active == total {
            HealthStatus::Healthy
        } else if active * 2 > total {
            HealthStatus::Degraded
        } else {
            HealthStatus::Down
        }
    }

    pub fn is_healthy(self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    pub status: DependencyStatus,
    pub last_checked_at: DateTime<Utc>,
    /// Latency of the last probe, present only while the dependency is active
    /// and has been probed at least once.
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Dependency {
    fn new(name: String, status: DependencyStatus) -> Self {
        Self {
            name,
            status,
            last_checked_at: Utc::now(),
            response_time_ms: None,
            last_error: None,
        }
    }

    fn apply(&mut self, outcome: ProbeOutcome) {
        self.last_checked_at = outcome.checked_at;
        if outcome.ok {
            self.status = DependencyStatus::Active;
            self.response_time_ms = Some(outcome.elapsed_ms);
            self.last_error = None;
        } else {
            self.status = DependencyStatus::Error;
            self.response_time_ms = None;
            self.last_error = outcome.error;
        }
    }
}

/// Point-in-time view of every dependency plus the aggregate verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub overall: HealthStatus,
    pub dependencies: Vec<Dependency>,
    pub timestamp: DateTime<Utc>,
}

impl HealthSnapshot {
    fn from_dependencies(dependencies: Vec<Dependency>) -> Self {
        let active = dependencies
            .iter()
            .filter(|d| d.status == DependencyStatus::Active)
            .count();
        Self {
            overall: HealthStatus::evaluate(active, dependencies.len()),
            dependencies,
            timestamp: Utc::now(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.count(DependencyStatus::Active)
    }

    pub fn count(&self, status: DependencyStatus) -> usize {
        self.dependencies
            .iter()
            .filter(|d| d.status == status)
            .count()
    }
}

struct Entry {
    dependency: Dependency,
    probe: Option<DependencyProbe>,
}

/// Owns dependency state. The probe cycle is the only writer after
/// registration; snapshots and metrics are readers.
///
/// Share it as `Arc<HealthRegistry>`; the background monitor
/// ([`super::HealthMonitor`]) holds one clone.
pub struct HealthRegistry {
    entries: RwLock<Vec<Entry>>,
    probe_timeout: Duration,
    probe_interval: Duration,
}

impl HealthRegistry {
    pub fn new(options: &HealthOptions) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            probe_timeout: options.probe_timeout(),
            probe_interval: options.probe_interval(),
        }
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    /// Register a probed dependency, optimistically `Active` until its first
    /// probe says otherwise.
    pub fn register(
        &self,
        name: impl Into<String>,
        check: Arc<dyn HealthCheck>,
    ) -> TrustscoreResult<()> {
        let name: String = name.into();
        self.initialize([(name, check)])
    }

    /// Register a dependency that has no probe configured.
    pub fn register_inactive(&self, name: impl Into<String>) -> TrustscoreResult<()> {
        self.insert(name.into(), DependencyStatus::Inactive, None)
    }

    /// Register a batch of probed dependencies, each `Active` with no
    /// response time until probed.
    ///
    /// # Errors
    ///
    /// Returns error, registering nothing, if any name is already registered
    /// or appears twice in the batch.
    pub fn initialize<I, S>(&self, dependencies: I) -> TrustscoreResult<()>
    where
        I: IntoIterator<Item = (S, Arc<dyn HealthCheck>)>,
        S: Into<String>,
    {
        let batch: Vec<(String, Arc<dyn HealthCheck>)> = dependencies
            .into_iter()
            .map(|(name, check)| (name.into(), check))
            .collect();

        let mut entries = self.entries.write();
        for (i, (name, _)) in batch.iter().enumerate() {
            let taken = entries.iter().any(|e| e.dependency.name == *name)
                || batch[..i].iter().any(|(earlier, _)| earlier == name);
            if taken {
                return Err(already_registered(name));
            }
        }

        for (name, check) in batch {
            tracing::debug!(dependency = %name, "Registering dependency");
            let probe = DependencyProbe::new(name.clone(), check, self.probe_timeout);
            entries.push(Entry {
                dependency: Dependency::new(name, DependencyStatus::Active),
                probe: Some(probe),
            });
        }
        Ok(())
    }

    /// Register configured endpoints: a TCP probe for each one with an
    /// address, inactive for the rest.
    pub fn register_endpoints(&self, endpoints: &[DependencyEndpoint]) -> TrustscoreResult<()> {
        let mut probed: Vec<(String, Arc<dyn HealthCheck>)> = Vec::new();
        let mut unprobed = Vec::new();
        for endpoint in endpoints {
            match &endpoint.address {
                Some(address) => {
                    let check: Arc<dyn HealthCheck> = Arc::new(TcpCheck::new(address.clone()));
                    probed.push((endpoint.name.clone(), check));
                }
                None => unprobed.push(endpoint.name.clone()),
            }
        }

        self.initialize(probed)?;
        for name in unprobed {
            self.register_inactive(name)?;
        }
        Ok(())
    }

    fn insert(
        &self,
        name: String,
        status: DependencyStatus,
        probe: Option<DependencyProbe>,
    ) -> TrustscoreResult<()> {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.dependency.name == name) {
            return Err(already_registered(&name));
        }

        tracing::debug!(dependency = %name, status = ?status, "Registering dependency");
        entries.push(Entry {
            dependency: Dependency::new(name, status),
            probe,
        });
        Ok(())
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.entries
            .read()
            .iter()
            .map(|e| e.dependency.clone())
            .collect()
    }

    pub fn dependency(&self, name: &str) -> Option<Dependency> {
        self.entries
            .read()
            .iter()
            .find(|e| e.dependency.name == name)
            .map(|e| e.dependency.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Probe every probed dependency concurrently and record the outcomes.
    ///
    /// A failed or hung probe only marks its own dependency as `Error`; the
    /// cycle itself never fails.
    pub async fn run_probe_cycle(&self) -> HealthSnapshot {
        let probes: Vec<DependencyProbe> = self
            .entries
            .read()
            .iter()
            .filter_map(|e| e.probe.clone())
            .collect();

        let outcomes = join_all(probes.iter().map(|probe| async move {
            (probe.name().to_string(), probe.probe().await)
        }))
        .await;

        {
            let mut entries = self.entries.write();
            for (name, outcome) in outcomes {
                if let Some(entry) = entries.iter_mut().find(|e| e.dependency.name == name) {
                    entry.dependency.apply(outcome);
                }
            }
        }

        let snapshot = self.snapshot();
        tracing::debug!(
            overall = ?snapshot.overall,
            active = snapshot.active_count(),
            total = snapshot.dependencies.len(),
            "Probe cycle completed"
        );
        snapshot
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot::from_dependencies(self.dependencies())
    }
}

fn already_registered(name: &str) -> TrustscoreError {
    TrustscoreError::Config(format!("dependency {} already registered", name))
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("dependencies", &self.len())
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

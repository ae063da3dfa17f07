//! Payloads served to the monitoring dashboard.

use super::counters::RunCountersSnapshot;
use super::system::MemoryUsage;
use crate::health::{DependencyStatus, HealthSnapshot, HealthStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response of the `health` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    pub overall: HealthStatus,
    pub services: Vec<ServiceView>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub name: String,
    pub status: DependencyStatus,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
}

impl From<&HealthSnapshot> for HealthView {
    fn from(snapshot: &HealthSnapshot) -> Self {
        Self {
            overall: snapshot.overall,
            services: snapshot
                .dependencies
                .iter()
                .map(|d| ServiceView {
                    name: d.name.clone(),
                    status: d.status,
                    last_check: d.last_checked_at,
                    response_time: d.response_time_ms,
                })
                .collect(),
            timestamp: snapshot.timestamp,
        }
    }
}

/// Response of the `monitoring` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringView {
    pub system: SystemView,
    pub services: ServicesView,
    pub pipelines: PipelineStats,
    pub performance: PerformanceView,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemView {
    pub status: HealthStatus,
    /// Seconds since the runtime was created.
    pub uptime: u64,
    pub memory: MemoryUsage,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesView {
    pub health: HealthStatus,
    pub count: usize,
    pub active: usize,
    /// Dependencies that are not active.
    pub degraded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    /// Percentage of retained runs that completed, 0 when none are retained.
    pub success_rate: f64,
    /// Mean `totalDurationMs` of completed runs, in milliseconds.
    pub avg_processing_time: f64,
    pub lifetime: RunCountersSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceView {
    /// Mean latency of the dependencies' last successful probes.
    pub avg_response_time: f64,
    pub last_health_check: Option<DateTime<Utc>>,
}

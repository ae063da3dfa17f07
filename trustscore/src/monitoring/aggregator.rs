//! Read-only monitoring statistics.

use super::counters::RunCounters;
use super::system::current_memory;
use super::views::{
    HealthView, MonitoringView, PerformanceView, PipelineStats, ServicesView, SystemView,
};
use crate::health::{Dependency, HealthRegistry};
use crate::registry::{ExecutionStatus, PipelineRecord, PipelineRegistry};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Derives dashboard statistics from the health and pipeline registries.
///
/// Holds no state of its own beyond handles to what it reads.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    health: Arc<HealthRegistry>,
    pipelines: PipelineRegistry,
    counters: Arc<RunCounters>,
    environment: String,
    started: Instant,
}

impl MetricsAggregator {
    pub fn new(
        health: Arc<HealthRegistry>,
        pipelines: PipelineRegistry,
        counters: Arc<RunCounters>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            health,
            pipelines,
            counters,
            environment: environment.into(),
            started: Instant::now(),
        }
    }

    pub fn health(&self) -> HealthView {
        HealthView::from(&self.health.snapshot())
    }

    pub fn monitoring(&self) -> MonitoringView {
        let snapshot = self.health.snapshot();
        let active = snapshot.active_count();
        let count = snapshot.dependencies.len();

        let mut pipelines = pipeline_stats(&self.pipelines.all_records());
        pipelines.lifetime = self.counters.snapshot();

        MonitoringView {
            system: SystemView {
                status: snapshot.overall,
                uptime: self.started.elapsed().as_secs(),
                memory: current_memory(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment: self.environment.clone(),
            },
            services: ServicesView {
                health: snapshot.overall,
                count,
                active,
                degraded: count - active,
            },
            pipelines,
            performance: performance(&snapshot.dependencies),
            timestamp: Utc::now(),
        }
    }
}

/// Counts, success rate and mean duration over `records`.
///
/// Every ratio is 0 rather than NaN when its denominator is empty.
pub fn pipeline_stats(records: &[PipelineRecord]) -> PipelineStats {
    let total = records.len();
    let count = |status: ExecutionStatus| {
        records
            .iter()
            .filter(|r| r.overall_status() == status)
            .count()
    };
    let completed = count(ExecutionStatus::Completed);
    let failed = count(ExecutionStatus::Failed);
    let active = records.iter().filter(|r| r.is_active()).count();

    let durations: Vec<u64> = records
        .iter()
        .filter(|r| r.overall_status() == ExecutionStatus::Completed)
        .filter_map(|r| r.total_duration_ms())
        .collect();

    PipelineStats {
        total,
        active,
        completed,
        failed,
        success_rate: ratio(completed as f64 * 100.0, total),
        avg_processing_time: ratio(durations.iter().sum::<u64>() as f64, durations.len()),
        lifetime: Default::default(),
    }
}

/// Mean probe latency and most recent check over `dependencies`.
pub fn performance(dependencies: &[Dependency]) -> PerformanceView {
    let latencies: Vec<u64> = dependencies
        .iter()
        .filter_map(|d| d.response_time_ms)
        .collect();

    PerformanceView {
        avg_response_time: ratio(latencies.iter().sum::<u64>() as f64, latencies.len()),
        last_health_check: dependencies.iter().map(|d| d.last_checked_at).max(),
    }
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{DependencyStatus, HealthCheck};
    use crate::options::HealthOptions;
    use crate::registry::{RetentionPolicy, StepName};
    use crate::reputation::{Address, StepOutput};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use trustscore_shared::TrustscoreResult;

    const ADDRESS: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

    fn completed() -> PipelineRecord {
        let mut record = PipelineRecord::new(ADDRESS);
        record.start().unwrap();
        for name in StepName::ALL {
            record.begin_step(name).unwrap();
            let output = StepOutput::Address(Address::parse(ADDRESS).unwrap());
            record.complete_step(name, output).unwrap();
        }
        record.finish().unwrap();
        record
    }

    fn failed() -> PipelineRecord {
        let mut record = PipelineRecord::new("not-an-address");
        record.start().unwrap();
        record.begin_step(StepName::ValidateAddress).unwrap();
        record
            .fail_step(StepName::ValidateAddress, "invalid address")
            .unwrap();
        record.finish().unwrap();
        record
    }

    fn running() -> PipelineRecord {
        let mut record = PipelineRecord::new(ADDRESS);
        record.start().unwrap();
        record
    }

    fn dependency(name: &str, response_time_ms: Option<u64>, minute: u32) -> Dependency {
        Dependency {
            name: name.to_string(),
            status: if response_time_ms.is_some() {
                DependencyStatus::Active
            } else {
                DependencyStatus::Error
            },
            last_checked_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap(),
            response_time_ms,
            last_error: None,
        }
    }

    #[test]
    fn test_empty_registry_has_zero_defaults() {
        let stats = pipeline_stats(&[]);
        assert_eq!(stats, PipelineStats::default());
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_processing_time, 0.0);
    }

    #[test]
    fn test_all_completed_is_full_success() {
        let stats = pipeline_stats(&[completed(), completed()]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.success_rate, 100.0);
    }

    #[test]
    fn test_mixed_statuses() {
        let stats = pipeline_stats(&[completed(), failed(), running(), completed()]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[test]
    fn test_avg_processing_time_ignores_unfinished_runs() {
        let stats = pipeline_stats(&[running(), failed()]);
        assert_eq!(stats.avg_processing_time, 0.0);
        assert!(!stats.avg_processing_time.is_nan());
    }

    #[test]
    fn test_performance() {
        let view = performance(&[
            dependency("graph-indexer", Some(10), 1),
            dependency("block-explorer", Some(30), 3),
            dependency("ai-compute", None, 2),
        ]);
        assert_eq!(view.avg_response_time, 20.0);
        assert_eq!(
            view.last_health_check,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 12, 3, 0).unwrap())
        );

        assert_eq!(performance(&[]), PerformanceView::default());
    }

    struct Down;

    #[async_trait]
    impl HealthCheck for Down {
        async fn check(&self) -> TrustscoreResult<()> {
            Err(trustscore_shared::TrustscoreError::DependencyUnavailable(
                "refused".into(),
            ))
        }
    }

    #[tokio::test]
    async fn test_monitoring_view() {
        let health = Arc::new(HealthRegistry::new(&HealthOptions::default()));
        health.register("graph-indexer", Arc::new(Down)).unwrap();
        health.register_inactive("ai-compute").unwrap();
        health.run_probe_cycle().await;

        let pipelines = PipelineRegistry::new(RetentionPolicy::default());
        pipelines.add(completed()).unwrap();
        let counters = Arc::new(RunCounters::new());
        counters.record_started();

        let aggregator = MetricsAggregator::new(health, pipelines, counters, "test");
        let view = aggregator.monitoring();

        assert_eq!(view.services.count, 2);
        assert_eq!(view.services.active, 0);
        assert_eq!(view.services.degraded, 2);
        assert_eq!(view.pipelines.total, 1);
        assert_eq!(view.pipelines.lifetime.started, 1);
        assert_eq!(view.system.environment, "test");
        assert_eq!(view.performance.avg_response_time, 0.0);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json["pipelines"]["successRate"].is_number());
        assert!(json["performance"]["lastHealthCheck"].is_string());
        assert_eq!(json["services"]["health"], "down");
    }

    #[tokio::test]
    async fn test_health_view_omits_missing_response_time() {
        let health = Arc::new(HealthRegistry::new(&HealthOptions::default()));
        health.register("graph-indexer", Arc::new(Down)).unwrap();
        health.run_probe_cycle().await;

        let aggregator = MetricsAggregator::new(
            health,
            PipelineRegistry::default(),
            Arc::new(RunCounters::new()),
            "test",
        );
        let json = serde_json::to_value(aggregator.health()).unwrap();
        let service = &json["services"][0];
        assert_eq!(service["status"], "error");
        assert!(service.get("responseTime").is_none());
        assert!(service["lastCheck"].is_string());
    }
}

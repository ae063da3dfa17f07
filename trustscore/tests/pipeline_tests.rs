//! End-to-end runs through `TrustscoreRuntime` with in-memory sources.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use trustscore::health::{DependencyStatus, HealthCheck, HealthStatus};
use trustscore::options::FetchMode;
use trustscore::registry::{ExecutionStatus, PipelineRecord, StepName};
use trustscore::reputation::{Address, Explanation, ScoreBreakdown, StepOutput};
use trustscore::sources::{ActivitySource, Explainer, Sources};
use trustscore::{TrustscoreError, TrustscoreOptions, TrustscoreResult, TrustscoreRuntime};

const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

enum Behavior {
    Respond(Value),
    Fail,
    Hang,
}

struct FakeSource(Behavior);

#[async_trait]
impl ActivitySource for FakeSource {
    async fn fetch_activity(&self, _address: &Address) -> TrustscoreResult<Value> {
        match &self.0 {
            Behavior::Respond(payload) => Ok(payload.clone()),
            Behavior::Fail => Err(TrustscoreError::DependencyUnavailable(
                "connection refused".into(),
            )),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

struct FakeExplainer {
    fail: bool,
}

#[async_trait]
impl Explainer for FakeExplainer {
    async fn explain(
        &self,
        score: u8,
        breakdown: &ScoreBreakdown,
    ) -> TrustscoreResult<Explanation> {
        if self.fail {
            return Err(TrustscoreError::DependencyUnavailable(
                "ai-compute unavailable".into(),
            ));
        }
        Ok(Explanation {
            text: format!("Score {} from {} transactions", score, breakdown.transaction_count),
            confidence: 0.8,
            reasons: vec!["long-lived account".into()],
            recommendations: vec!["participate in governance".into()],
        })
    }
}

fn indexer() -> Behavior {
    Behavior::Respond(json!({ "protocol_interactions": 50 }))
}

fn explorer() -> Behavior {
    Behavior::Respond(json!({
        "first_seen": "2015-07-30T00:00:00Z",
        "transaction_count": 250
    }))
}

fn governance() -> Behavior {
    Behavior::Respond(json!({ "votes": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10] }))
}

struct Harness {
    options: TrustscoreOptions,
    indexer: Behavior,
    explorer: Behavior,
    governance: Behavior,
    explainer_fails: bool,
}

impl Harness {
    fn new() -> Self {
        Self {
            options: TrustscoreOptions::default(),
            indexer: indexer(),
            explorer: explorer(),
            governance: governance(),
            explainer_fails: false,
        }
    }

    fn build(self) -> TrustscoreRuntime {
        let sources = Sources::new(
            Arc::new(FakeSource(self.indexer)),
            Arc::new(FakeSource(self.explorer)),
            Arc::new(FakeSource(self.governance)),
        );
        let explainer = Arc::new(FakeExplainer {
            fail: self.explainer_fails,
        });
        TrustscoreRuntime::new(self.options, sources, explainer).unwrap()
    }
}

fn statuses(record: &PipelineRecord) -> Vec<ExecutionStatus> {
    record.steps().iter().map(|step| step.status()).collect()
}

/// Steps before `failed` completed with output, `failed` failed with a
/// message, everything after it pending.
fn assert_failed_at(record: &PipelineRecord, failed: StepName) {
    assert_eq!(record.overall_status(), ExecutionStatus::Failed);
    assert!(record.total_duration_ms().is_some());

    for step in record.steps() {
        if step.name().index() < failed.index() {
            assert_eq!(step.status(), ExecutionStatus::Completed, "{}", step.name());
            assert!(step.output().is_some(), "{}", step.name());
        } else if step.name() == failed {
            assert_eq!(step.status(), ExecutionStatus::Failed);
            assert!(!step.error_message().unwrap_or_default().is_empty());
            assert!(step.output().is_none());
        } else {
            assert_eq!(step.status(), ExecutionStatus::Pending, "{}", step.name());
            assert!(step.started_at().is_none());
        }
    }
}

#[tokio::test]
async fn test_successful_run_completes_every_step() {
    let runtime = Harness::new().build();

    let record = runtime.compute_reputation(ADDRESS).await.unwrap();

    assert_eq!(record.steps().len(), 8);
    assert!(
        statuses(&record)
            .iter()
            .all(|s| *s == ExecutionStatus::Completed)
    );
    assert_eq!(record.overall_status(), ExecutionStatus::Completed);
    assert!(record.total_duration_ms().is_some());
    for step in record.steps() {
        assert!(step.output().is_some());
        assert!(step.duration_ms().is_some());
    }

    let report = trustscore::reputation::report_of(&record).unwrap();
    // 30 (age) + 12 (250 tx) + 25 (50 interactions) + 10 (10 votes)
    assert_eq!(report.score, 77);
    assert_eq!(report.address, ADDRESS.to_lowercase());
    assert_eq!(report.pipeline_id, record.id().as_str());
    assert_eq!(report.confidence, 0.8);
    assert_eq!(report.sources.len(), 3);
    assert!(!report.fallback);
}

#[tokio::test]
async fn test_invalid_address_stops_after_validation() {
    let runtime = Harness::new().build();

    let err = runtime.compute_reputation("not-an-address").await.unwrap_err();

    assert!(matches!(err.source, TrustscoreError::InvalidInput(_)));
    assert_failed_at(&err.record, StepName::ValidateAddress);
    assert_eq!(
        statuses(&err.record)
            .iter()
            .filter(|s| **s == ExecutionStatus::Pending)
            .count(),
        7
    );
}

#[tokio::test]
async fn test_fetch_failure_aborts_run() {
    let mut harness = Harness::new();
    harness.explorer = Behavior::Fail;
    let runtime = harness.build();

    let err = runtime.compute_reputation(ADDRESS).await.unwrap_err();

    assert!(err.source.is_dependency_failure());
    assert_failed_at(&err.record, StepName::FetchSourceB);
    assert_eq!(
        err.record.step(StepName::FetchSourceB).error_message(),
        Some("dependency unavailable: connection refused")
    );
}

#[tokio::test]
async fn test_explainer_failure_keeps_score_output() {
    let mut harness = Harness::new();
    harness.explainer_fails = true;
    let runtime = harness.build();

    let err = runtime.compute_reputation(ADDRESS).await.unwrap_err();

    assert_failed_at(&err.record, StepName::Explain);
    let score = err.record.step(StepName::ComputeScore).output().unwrap();
    assert!(matches!(score, StepOutput::Score(card) if card.score == 77));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_fetch_times_out() {
    let mut harness = Harness::new();
    harness.governance = Behavior::Hang;
    harness.options.pipeline.fetch_timeout_ms = 50;
    let runtime = harness.build();

    let err = runtime.compute_reputation(ADDRESS).await.unwrap_err();

    assert!(matches!(err.source, TrustscoreError::Timeout { .. }));
    assert!(err.source.is_dependency_failure());
    assert_failed_at(&err.record, StepName::FetchSourceC);
    assert!(
        err.record
            .step(StepName::FetchSourceC)
            .error_message()
            .unwrap()
            .contains("timed out")
    );
}

#[tokio::test]
async fn test_parallel_fetch_records_each_source() {
    let mut harness = Harness::new();
    harness.options.pipeline.fetch_mode = FetchMode::Parallel;
    let runtime = harness.build();

    let record = runtime.compute_reputation(ADDRESS).await.unwrap();

    for step in [
        StepName::FetchSourceA,
        StepName::FetchSourceB,
        StepName::FetchSourceC,
    ] {
        let step = record.step(step);
        assert_eq!(step.status(), ExecutionStatus::Completed);
        assert!(step.duration_ms().is_some());
    }
    assert_eq!(record.overall_status(), ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_parallel_fetch_failure_settles_siblings() {
    let mut harness = Harness::new();
    harness.options.pipeline.fetch_mode = FetchMode::Parallel;
    harness.indexer = Behavior::Fail;
    let runtime = harness.build();

    let err = runtime.compute_reputation(ADDRESS).await.unwrap_err();

    assert_eq!(err.record.overall_status(), ExecutionStatus::Failed);
    assert_eq!(
        statuses(&err.record),
        vec![
            ExecutionStatus::Completed,
            ExecutionStatus::Failed,
            ExecutionStatus::Completed,
            ExecutionStatus::Completed,
            ExecutionStatus::Pending,
            ExecutionStatus::Pending,
            ExecutionStatus::Pending,
            ExecutionStatus::Pending,
        ]
    );
}

#[tokio::test]
async fn test_repeat_runs_get_distinct_ids() {
    let runtime = Harness::new().build();

    let first = runtime.compute_reputation(ADDRESS).await.unwrap();
    let second = runtime.compute_reputation(ADDRESS).await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(runtime.pipelines().len(), 2);
    assert!(runtime.pipeline(first.id()).is_some());
    assert!(runtime.pipeline(second.id()).is_some());
}

#[tokio::test]
async fn test_concurrent_runs_do_not_interfere() {
    let runtime = Harness::new().build();

    let runs = futures::future::join_all((0..8).map(|i| {
        let runtime = runtime.clone();
        async move {
            if i % 2 == 0 {
                runtime.compute_reputation(ADDRESS).await.is_ok()
            } else {
                runtime.compute_reputation("0x1234").await.is_ok()
            }
        }
    }))
    .await;

    assert_eq!(runs.iter().filter(|ok| **ok).count(), 4);
    let stats = runtime.monitoring().pipelines;
    assert_eq!(stats.total, 8);
    assert_eq!(stats.completed, 4);
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.active, 0);
}

#[tokio::test]
async fn test_monitoring_pipeline_stats() {
    let runtime = Harness::new().build();

    let empty = runtime.monitoring().pipelines;
    assert_eq!(empty.total, 0);
    assert_eq!(empty.success_rate, 0.0);
    assert_eq!(empty.avg_processing_time, 0.0);

    runtime.compute_reputation(ADDRESS).await.unwrap();
    runtime.compute_reputation(ADDRESS).await.unwrap();
    assert_eq!(runtime.monitoring().pipelines.success_rate, 100.0);

    runtime.compute_reputation("").await.unwrap_err();
    let stats = runtime.monitoring().pipelines;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);
    assert!((stats.success_rate - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.lifetime.started, 3);
    assert_eq!(stats.lifetime.completed, 2);
    assert_eq!(stats.lifetime.failed, 1);
}

#[tokio::test]
async fn test_retention_bounds_registry() {
    let mut harness = Harness::new();
    harness.options.retention.max_records = 2;
    let runtime = harness.build();

    let first = runtime.compute_reputation(ADDRESS).await.unwrap();
    for _ in 0..3 {
        runtime.compute_reputation(ADDRESS).await.unwrap();
    }

    assert_eq!(runtime.pipelines().len(), 2);
    assert!(runtime.pipeline(first.id()).is_none());
    assert_eq!(runtime.monitoring().pipelines.lifetime.started, 4);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_run_settles_as_failed() {
    let mut harness = Harness::new();
    harness.indexer = Behavior::Hang;
    harness.options.retention.max_records = 1;
    harness.options.retention.ttl_secs = Some(1);
    let runtime = harness.build();

    let outcome = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        runtime.compute_reputation(ADDRESS),
    )
    .await;
    assert!(outcome.is_err());

    assert!(runtime.pipelines().active_records().is_empty());
    let records = runtime.pipelines().all_records();
    assert_eq!(records.len(), 1);
    assert_failed_at(&records[0], StepName::FetchSourceA);
    assert_eq!(
        records[0].step(StepName::FetchSourceA).error_message(),
        Some("run cancelled")
    );

    let stats = runtime.monitoring().pipelines;
    assert_eq!(stats.active, 0);
    assert_eq!(stats.lifetime.started, 1);
    assert_eq!(stats.lifetime.failed, 1);

    let later = chrono::Utc::now() + chrono::Duration::days(365);
    assert_eq!(runtime.pipelines().sweep_expired(later), 1);
    assert!(runtime.pipelines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_parallel_run_fails_every_in_flight_fetch() {
    let mut harness = Harness::new();
    harness.options.pipeline.fetch_mode = FetchMode::Parallel;
    harness.indexer = Behavior::Hang;
    let runtime = harness.build();

    let outcome = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        runtime.compute_reputation(ADDRESS),
    )
    .await;
    assert!(outcome.is_err());

    let record = runtime.pipelines().all_records().remove(0);
    assert_eq!(record.overall_status(), ExecutionStatus::Failed);
    assert_eq!(
        record.step(StepName::FetchSourceA).error_message(),
        Some("run cancelled")
    );
    assert_eq!(
        record.step(StepName::FetchSourceB).status(),
        ExecutionStatus::Completed
    );
    assert_eq!(
        record.step(StepName::Aggregate).status(),
        ExecutionStatus::Pending
    );
}

#[tokio::test]
async fn test_score_or_fallback() {
    let mut harness = Harness::new();
    harness.explorer = Behavior::Fail;
    let runtime = harness.build();

    let report = runtime.score_or_fallback(ADDRESS).await;
    assert!(report.fallback);
    assert_eq!(report.score, 0);
    assert_eq!(report.confidence, 0.0);
    assert!(report.breakdown.is_none());
    assert!(!report.pipeline_id.is_empty());
    assert!(report.reasons[0].starts_with("fetch_source_b failed"));

    let report = Harness::new().build().score_or_fallback(ADDRESS).await;
    assert!(!report.fallback);
    assert_eq!(report.score, 77);
}

struct Probe(bool);

#[async_trait]
impl HealthCheck for Probe {
    async fn check(&self) -> TrustscoreResult<()> {
        if self.0 {
            Ok(())
        } else {
            Err(TrustscoreError::DependencyUnavailable("probe failed".into()))
        }
    }
}

async fn health_with(results: [bool; 5]) -> HealthStatus {
    let runtime = Harness::new().build();
    let names = trustscore_shared::constants::dependencies::ALL;
    for (name, ok) in names.into_iter().zip(results) {
        runtime
            .health_registry()
            .register(name, Arc::new(Probe(ok)))
            .unwrap();
    }
    runtime.run_probe_cycle().await.overall
}

#[tokio::test]
async fn test_health_thresholds() {
    assert_eq!(health_with([true; 5]).await, HealthStatus::Healthy);
    assert_eq!(
        health_with([true, true, true, true, false]).await,
        HealthStatus::Degraded
    );
    assert_eq!(
        health_with([true, true, false, false, false]).await,
        HealthStatus::Down
    );
}

#[tokio::test]
async fn test_health_view_reflects_probe_results() {
    let runtime = Harness::new().build();
    let health = runtime.health_registry();
    health.register("graph-indexer", Arc::new(Probe(true))).unwrap();
    health.register("ai-compute", Arc::new(Probe(false))).unwrap();

    runtime.run_probe_cycle().await;
    let view = runtime.health();

    assert_eq!(view.overall, HealthStatus::Down);
    let compute = view
        .services
        .iter()
        .find(|s| s.name == "ai-compute")
        .unwrap();
    assert_eq!(compute.status, DependencyStatus::Error);
    assert!(compute.response_time.is_none());

    let monitoring = runtime.monitoring();
    assert_eq!(monitoring.services.count, 2);
    assert_eq!(monitoring.services.active, 1);
    assert!(monitoring.performance.last_health_check.is_some());
}

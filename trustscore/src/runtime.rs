//! Process-wide entry point tying the registries, the orchestrator and the
//! health monitor together.

use crate::health::{HealthMonitor, HealthRegistry};
use crate::monitoring::{HealthView, MetricsAggregator, MonitoringView, RunCounters};
use crate::options::TrustscoreOptions;
use crate::registry::{PipelineId, PipelineRecord, PipelineRegistry, RetentionPolicy};
use crate::reputation::{ReputationPipeline, ReputationReport, RunError, report_of};
use crate::sources::{Explainer, Sources};
use parking_lot::Mutex;
use std::sync::Arc;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Owns every long-lived component. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TrustscoreRuntime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    options: TrustscoreOptions,
    health: Arc<HealthRegistry>,
    pipelines: PipelineRegistry,
    reputation: ReputationPipeline,
    aggregator: MetricsAggregator,
    monitor: Mutex<Option<HealthMonitor>>,
}

impl TrustscoreRuntime {
    /// Validate `options` and build the runtime. Dependencies are registered
    /// separately, either directly on [`Self::health_registry`] or from
    /// configured endpoints via [`Self::register_endpoints`].
    pub fn new(
        options: TrustscoreOptions,
        sources: Sources,
        explainer: Arc<dyn Explainer>,
    ) -> TrustscoreResult<Self> {
        options.sanitize()?;

        let health = Arc::new(HealthRegistry::new(&options.health));
        let pipelines = PipelineRegistry::new(RetentionPolicy::from(&options.retention));
        let counters = Arc::new(RunCounters::new());
        let reputation = ReputationPipeline::new(
            pipelines.clone(),
            sources,
            explainer,
            options.pipeline.clone(),
            Arc::clone(&counters),
        );
        let aggregator = MetricsAggregator::new(
            Arc::clone(&health),
            pipelines.clone(),
            counters,
            options.environment.clone(),
        );

        tracing::debug!(
            environment = %options.environment,
            fetch_mode = ?options.pipeline.fetch_mode,
            max_records = options.retention.max_records,
            "Runtime created"
        );

        Ok(Self {
            inner: Arc::new(RuntimeInner {
                options,
                health,
                pipelines,
                reputation,
                aggregator,
                monitor: Mutex::new(None),
            }),
        })
    }

    pub fn options(&self) -> &TrustscoreOptions {
        &self.inner.options
    }

    pub fn health_registry(&self) -> &Arc<HealthRegistry> {
        &self.inner.health
    }

    pub fn pipelines(&self) -> &PipelineRegistry {
        &self.inner.pipelines
    }

    /// Register the configured dependency endpoints with the health registry.
    pub fn register_endpoints(&self) -> TrustscoreResult<()> {
        self.inner
            .health
            .register_endpoints(&self.inner.options.dependencies)
    }

    /// Run the reputation pipeline for `address`.
    pub async fn compute_reputation(&self, address: &str) -> Result<PipelineRecord, RunError> {
        self.inner.reputation.run(address).await
    }

    /// Run the pipeline and always hand back a report: the formatted one when
    /// the run completed, a zero-confidence fallback naming the failure when
    /// it did not.
    pub async fn score_or_fallback(&self, address: &str) -> ReputationReport {
        match self.compute_reputation(address).await {
            Ok(record) => report_of(&record).unwrap_or_else(|e| {
                ReputationReport::fallback(Some(record.id().as_str()), address, e.to_string())
            }),
            Err(RunError { record, source }) => {
                let reason = match record.failed_step() {
                    Some(step) => format!("{} failed: {}", step.name(), source),
                    None => source.to_string(),
                };
                ReputationReport::fallback(Some(record.id().as_str()), address, reason)
            }
        }
    }

    pub fn pipeline(&self, id: &PipelineId) -> Option<PipelineRecord> {
        self.inner.pipelines.get(id)
    }

    pub fn health(&self) -> HealthView {
        self.inner.aggregator.health()
    }

    pub fn monitoring(&self) -> MonitoringView {
        self.inner.aggregator.monitoring()
    }

    /// Probe every dependency once, outside the background schedule.
    pub async fn run_probe_cycle(&self) -> HealthView {
        HealthView::from(&self.inner.health.run_probe_cycle().await)
    }

    /// Start the periodic probe loop. Fails if it is already running.
    pub fn start_health_monitor(&self) -> TrustscoreResult<()> {
        let mut monitor = self.inner.monitor.lock();
        if monitor.as_ref().is_some_and(HealthMonitor::is_running) {
            return Err(TrustscoreError::Internal(
                "health monitor already running".into(),
            ));
        }

        *monitor = Some(HealthMonitor::spawn(
            Arc::clone(&self.inner.health),
            Some(self.inner.pipelines.clone()),
            self.inner.health.probe_interval(),
        ));
        Ok(())
    }

    pub fn is_health_monitor_running(&self) -> bool {
        self.inner
            .monitor
            .lock()
            .as_ref()
            .is_some_and(HealthMonitor::is_running)
    }

    /// Stop the probe loop and wait for it to exit. No-op when not running.
    pub async fn stop_health_monitor(&self) {
        let monitor = self.inner.monitor.lock().take();
        if let Some(monitor) = monitor {
            monitor.shutdown().await;
        }
    }
}

impl std::fmt::Debug for TrustscoreRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustscoreRuntime")
            .field("environment", &self.inner.options.environment)
            .field("health", &self.inner.health)
            .field("pipelines", &self.inner.pipelines)
            .finish()
    }
}

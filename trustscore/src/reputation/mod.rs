//! Reputation pipeline orchestration.
//!
//! ## Architecture
//!
//! A run is table-driven. Each step records its own transition on the run's
//! [`PipelineRecord`] and a failing step aborts everything after it:
//!
//! ```text
//!   1. validate_address
//!   2. fetch_source_a ─┐
//!   3. fetch_source_b  ├─ sequential by default, one stage
//!   4. fetch_source_c ─┘  (parallel with FetchMode::Parallel)
//!   5. aggregate
//!   6. compute_score
//!   7. explain
//!   8. format_response
//! ```

pub mod address;
pub mod score;
mod tasks;
pub mod types;

pub use address::Address;
pub use score::compute_score;
pub use types::{
    AggregatePayload, Explanation, ReputationReport, ScoreBreakdown, ScoreCard, SourceActivity,
    StepOutput,
};

use crate::monitoring::RunCounters;
use crate::options::PipelineOptions;
use crate::pipeline::{BoxedTask, ExecutionPlan, PipelineBuilder, PipelineExecutor, Stage};
use crate::registry::{
    ExecutionStatus, PipelineId, PipelineRecord, PipelineRegistry, SharedRecord, StepName,
};
use crate::sources::{Explainer, SourceId, Sources};
use std::sync::Arc;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

use tasks::{
    AggregateTask, ExplainTask, FetchTask, FormatTask, RunContext, RunCtx, ScoreTask, ValidateTask,
};

// ============================================================================
// EXECUTION PLAN
// ============================================================================

fn get_execution_plan(options: &PipelineOptions) -> ExecutionPlan<RunCtx> {
    let fetches: Vec<BoxedTask<RunCtx>> = SourceId::ALL
        .into_iter()
        .map(|source| {
            Box::new(FetchTask::new(source, options.fetch_timeout())) as BoxedTask<RunCtx>
        })
        .collect();

    let stages: Vec<Stage<BoxedTask<RunCtx>>> = vec![
        Stage::sequential(vec![Box::new(ValidateTask)]),
        Stage::with_mode(fetches, options.fetch_mode.into()),
        Stage::sequential(vec![Box::new(AggregateTask)]),
        Stage::sequential(vec![Box::new(ScoreTask)]),
        Stage::sequential(vec![Box::new(ExplainTask::new(options.explain_timeout()))]),
        Stage::sequential(vec![Box::new(FormatTask)]),
    ];

    ExecutionPlan::new(stages)
}

/// A run that did not complete, with its record as it stood at the failure.
#[derive(Debug, thiserror::Error)]
#[error("pipeline {id} failed: {source}", id = .record.id())]
pub struct RunError {
    pub record: Box<PipelineRecord>,
    pub source: TrustscoreError,
}

/// Report stored on the `format_response` step of a completed record.
pub fn report_of(record: &PipelineRecord) -> TrustscoreResult<ReputationReport> {
    record
        .output_of(StepName::FormatResponse)?
        .as_report()
        .cloned()
}

/// Settles a registered run if its future is dropped before it finishes.
struct RunGuard {
    pipeline_id: PipelineId,
    record: SharedRecord,
    counters: Arc<RunCounters>,
    armed: bool,
}

impl RunGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut record = self.record.write();
        if !record.is_active() {
            return;
        }
        match record.abandon("run cancelled") {
            Ok(_) => {
                self.counters.record_failed();
                tracing::warn!(
                    pipeline_id = %self.pipeline_id,
                    failed_step = record.failed_step().map(|step| step.name().as_str()),
                    "Pipeline cancelled"
                );
            }
            Err(e) => {
                tracing::error!(
                    pipeline_id = %self.pipeline_id,
                    error = %e,
                    "Failed to settle cancelled pipeline"
                );
            }
        }
    }
}

/// Runs the 8-step computation for one address at a time per call; calls
/// may overlap freely.
pub struct ReputationPipeline {
    registry: PipelineRegistry,
    sources: Sources,
    explainer: Arc<dyn Explainer>,
    options: PipelineOptions,
    counters: Arc<RunCounters>,
}

impl ReputationPipeline {
    pub fn new(
        registry: PipelineRegistry,
        sources: Sources,
        explainer: Arc<dyn Explainer>,
        options: PipelineOptions,
        counters: Arc<RunCounters>,
    ) -> Self {
        Self {
            registry,
            sources,
            explainer,
            options,
            counters,
        }
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Execute one run for `address`.
    ///
    /// Every call registers a fresh record, so repeated calls for the same
    /// address produce distinct ids. On failure the returned error carries
    /// the record with completed steps' outputs intact and later steps still
    /// pending. Dropping the returned future mid-run settles the record as
    /// failed with the in-flight step marked `run cancelled`.
    pub async fn run(&self, address: &str) -> Result<PipelineRecord, RunError> {
        let mut record = PipelineRecord::new(address);
        if let Err(source) = record.start() {
            return Err(RunError {
                record: Box::new(record),
                source,
            });
        }
        let pipeline_id = record.id().clone();
        let shared = self
            .registry
            .add(record.clone())
            .map_err(|source| RunError {
                record: Box::new(record),
                source,
            })?;
        self.counters.record_started();
        let mut guard = RunGuard {
            pipeline_id: pipeline_id.clone(),
            record: Arc::clone(&shared),
            counters: Arc::clone(&self.counters),
            armed: true,
        };

        tracing::debug!(pipeline_id = %pipeline_id, "Pipeline started");

        let ctx: RunCtx = Arc::new(RunContext {
            pipeline_id: pipeline_id.clone(),
            input: address.to_string(),
            record: Arc::clone(&shared),
            sources: self.sources.clone(),
            explainer: Arc::clone(&self.explainer),
        });
        let pipeline = PipelineBuilder::from_plan(get_execution_plan(&self.options));
        let result = PipelineExecutor::execute(pipeline, ctx).await;
        guard.disarm();

        let finished = shared.write().finish();
        let record = shared.read().clone();

        let failure = match (result, finished) {
            (Ok(metrics), Ok(ExecutionStatus::Completed)) => {
                self.counters.record_completed();
                tracing::info!(
                    pipeline_id = %pipeline_id,
                    total_duration_ms = record.total_duration_ms(),
                    steps = %metrics.summary(),
                    "Pipeline completed"
                );
                return Ok(record);
            }
            (Ok(_), Ok(status)) => TrustscoreError::Internal(format!(
                "pipeline settled as {:?} without a step error",
                status
            )),
            (Ok(_), Err(e)) | (Err(e), _) => e,
        };

        self.counters.record_failed();
        tracing::warn!(
            pipeline_id = %pipeline_id,
            failed_step = record.failed_step().map(|step| step.name().as_str()),
            total_duration_ms = record.total_duration_ms(),
            error = %failure,
            "Pipeline failed"
        );

        Err(RunError {
            record: Box::new(record),
            source: failure,
        })
    }
}

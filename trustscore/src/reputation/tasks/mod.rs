//! Reputation pipeline tasks and their shared run context.

mod aggregate;
mod explain;
mod fetch;
mod format;
mod score;
mod validate;

pub use aggregate::AggregateTask;
pub use explain::ExplainTask;
pub use fetch::FetchTask;
pub use format::FormatTask;
pub use score::ScoreTask;
pub use validate::ValidateTask;

use crate::pipeline::StepRecorder;
use crate::registry::{PipelineId, SharedRecord, StepName};
use crate::reputation::types::StepOutput;
use crate::sources::{Explainer, Sources};
use std::sync::Arc;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Everything a run's tasks need. The record is the only mutable part, and
/// only this run writes to it.
pub struct RunContext {
    pub pipeline_id: PipelineId,
    /// Caller-supplied address, unvalidated.
    pub input: String,
    pub record: SharedRecord,
    pub sources: Sources,
    pub explainer: Arc<dyn Explainer>,
}

pub type RunCtx = Arc<RunContext>;

impl RunContext {
    /// Clone a typed view of a completed step's output.
    ///
    /// Fails with an aggregation error if the step has not completed or
    /// produced a different kind of output.
    pub fn output<T, F>(&self, step: StepName, view: F) -> TrustscoreResult<T>
    where
        T: Clone,
        F: FnOnce(&StepOutput) -> TrustscoreResult<&T>,
    {
        let record = self.record.read();
        view(record.output_of(step)?).cloned()
    }
}

impl StepRecorder for RunCtx {
    type Output = StepOutput;

    fn step_started(&self, step: &str) -> TrustscoreResult<()> {
        let name: StepName = step.parse()?;
        self.record.write().begin_step(name)?;
        tracing::debug!(pipeline_id = %self.pipeline_id, step, "Step started");
        Ok(())
    }

    fn step_completed(&self, step: &str, output: StepOutput) -> TrustscoreResult<()> {
        let name: StepName = step.parse()?;
        let mut record = self.record.write();
        record.complete_step(name, output)?;
        tracing::debug!(
            pipeline_id = %self.pipeline_id,
            step,
            duration_ms = record.step(name).duration_ms(),
            "Step completed"
        );
        Ok(())
    }

    fn step_failed(&self, step: &str, error: &TrustscoreError) -> TrustscoreResult<()> {
        let name: StepName = step.parse()?;
        self.record.write().fail_step(name, error.to_string())?;
        tracing::warn!(
            pipeline_id = %self.pipeline_id,
            step,
            kind = error.kind(),
            error = %error,
            "Step failed"
        );
        Ok(())
    }
}

pub(super) fn task_start(ctx: &RunCtx, task_name: &str) {
    tracing::trace!(pipeline_id = %ctx.pipeline_id, task = task_name, "Running task");
}

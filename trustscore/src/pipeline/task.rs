//! Generic task trait for pipeline execution.

use super::recorder::StepRecorder;
use async_trait::async_trait;
use std::time::Duration;
use trustscore_shared::TrustscoreResult;

/// A named unit of work executed as one pipeline step.
///
/// The task returns its output instead of storing it; the executor hands the
/// output to the context's [`StepRecorder`], which is where later tasks read
/// it back from.
#[async_trait]
pub trait PipelineTask<Ctx: StepRecorder>: Send + Sync {
    /// Execute the task with the shared pipeline context.
    async fn run(self: Box<Self>, ctx: Ctx) -> TrustscoreResult<Ctx::Output>;

    /// Step name, recorded on the run and used for logging.
    fn name(&self) -> &str;

    /// Upper bound on how long `run` may take. `None` means unbounded.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;

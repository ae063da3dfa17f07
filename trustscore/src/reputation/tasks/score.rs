//! Task: Score the aggregate.

use super::{RunCtx, task_start};
use crate::pipeline::PipelineTask;
use crate::registry::StepName;
use crate::reputation::score::compute_score;
use crate::reputation::types::StepOutput;
use async_trait::async_trait;
use trustscore_shared::TrustscoreResult;

pub struct ScoreTask;

#[async_trait]
impl PipelineTask<RunCtx> for ScoreTask {
    async fn run(self: Box<Self>, ctx: RunCtx) -> TrustscoreResult<StepOutput> {
        task_start(&ctx, self.name());

        let aggregate = ctx.output(StepName::Aggregate, StepOutput::as_aggregate)?;
        compute_score(&aggregate).map(StepOutput::Score)
    }

    fn name(&self) -> &str {
        StepName::ComputeScore.as_str()
    }
}

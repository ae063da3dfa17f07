//! Task: Combine the three source payloads.

use super::{RunCtx, task_start};
use crate::pipeline::PipelineTask;
use crate::registry::StepName;
use crate::reputation::types::{AggregatePayload, SourceActivity, StepOutput};
use crate::sources::SourceId;
use async_trait::async_trait;
use chrono::Utc;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

pub struct AggregateTask;

#[async_trait]
impl PipelineTask<RunCtx> for AggregateTask {
    async fn run(self: Box<Self>, ctx: RunCtx) -> TrustscoreResult<StepOutput> {
        task_start(&ctx, self.name());

        let address = ctx.output(StepName::ValidateAddress, StepOutput::as_address)?;
        let indexer = activity(&ctx, SourceId::Indexer)?;
        let explorer = activity(&ctx, SourceId::Explorer)?;
        let governance = activity(&ctx, SourceId::Governance)?;

        Ok(StepOutput::Aggregate(AggregatePayload {
            address,
            as_of: Utc::now(),
            indexer: indexer.payload,
            explorer: explorer.payload,
            governance: governance.payload,
        }))
    }

    fn name(&self) -> &str {
        StepName::Aggregate.as_str()
    }
}

fn activity(ctx: &RunCtx, source: SourceId) -> TrustscoreResult<SourceActivity> {
    let activity = ctx.output(source.step(), StepOutput::as_activity)?;
    if activity.source != source {
        return Err(TrustscoreError::Aggregation(format!(
            "step {} produced {} activity, expected {}",
            source.step(),
            activity.source,
            source
        )));
    }
    Ok(activity)
}

//! Task: Validate the subject address.

use super::{RunCtx, task_start};
use crate::pipeline::PipelineTask;
use crate::registry::StepName;
use crate::reputation::address::Address;
use crate::reputation::types::StepOutput;
use async_trait::async_trait;
use trustscore_shared::TrustscoreResult;

pub struct ValidateTask;

#[async_trait]
impl PipelineTask<RunCtx> for ValidateTask {
    async fn run(self: Box<Self>, ctx: RunCtx) -> TrustscoreResult<StepOutput> {
        task_start(&ctx, self.name());
        Address::parse(&ctx.input).map(StepOutput::Address)
    }

    fn name(&self) -> &str {
        StepName::ValidateAddress.as_str()
    }
}

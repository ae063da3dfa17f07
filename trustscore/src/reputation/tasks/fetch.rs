//! Task: Fetch activity for the address from one source.

use super::{RunCtx, task_start};
use crate::pipeline::PipelineTask;
use crate::registry::StepName;
use crate::reputation::types::{SourceActivity, StepOutput};
use crate::sources::SourceId;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use trustscore_shared::TrustscoreResult;

pub struct FetchTask {
    source: SourceId,
    timeout: Duration,
}

impl FetchTask {
    pub fn new(source: SourceId, timeout: Duration) -> Self {
        Self { source, timeout }
    }
}

#[async_trait]
impl PipelineTask<RunCtx> for FetchTask {
    async fn run(self: Box<Self>, ctx: RunCtx) -> TrustscoreResult<StepOutput> {
        task_start(&ctx, self.name());

        let address = ctx.output(StepName::ValidateAddress, StepOutput::as_address)?;
        let payload = ctx
            .sources
            .get(self.source)
            .fetch_activity(&address)
            .await?;

        tracing::debug!(
            pipeline_id = %ctx.pipeline_id,
            source = %self.source,
            address = %address.short(),
            "Fetched source activity"
        );

        Ok(StepOutput::Activity(SourceActivity {
            source: self.source,
            payload,
            fetched_at: Utc::now(),
        }))
    }

    fn name(&self) -> &str {
        self.source.step().as_str()
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}

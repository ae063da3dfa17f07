//! Task: Assemble the externally visible report.

use super::{RunCtx, task_start};
use crate::pipeline::PipelineTask;
use crate::registry::StepName;
use crate::reputation::types::{ReputationReport, StepOutput};
use crate::sources::SourceId;
use async_trait::async_trait;
use chrono::Utc;
use trustscore_shared::TrustscoreResult;

pub struct FormatTask;

#[async_trait]
impl PipelineTask<RunCtx> for FormatTask {
    async fn run(self: Box<Self>, ctx: RunCtx) -> TrustscoreResult<StepOutput> {
        task_start(&ctx, self.name());

        let address = ctx.output(StepName::ValidateAddress, StepOutput::as_address)?;
        let card = ctx.output(StepName::ComputeScore, StepOutput::as_score)?;
        let explanation = ctx.output(StepName::Explain, StepOutput::as_explanation)?;
        let sources = SourceId::ALL
            .into_iter()
            .map(|source| {
                ctx.output(source.step(), StepOutput::as_activity)
                    .map(|activity| activity.source)
            })
            .collect::<TrustscoreResult<Vec<_>>>()?;

        Ok(StepOutput::Report(ReputationReport {
            pipeline_id: ctx.pipeline_id.to_string(),
            address: address.to_string(),
            score: card.score,
            confidence: explanation.confidence,
            breakdown: Some(card.breakdown),
            explanation: explanation.text,
            reasons: explanation.reasons,
            recommendations: explanation.recommendations,
            sources,
            generated_at: Utc::now(),
            fallback: false,
        }))
    }

    fn name(&self) -> &str {
        StepName::FormatResponse.as_str()
    }
}

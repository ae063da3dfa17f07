//! Task: Ask the explainer to describe the score.

use super::{RunCtx, task_start};
use crate::pipeline::PipelineTask;
use crate::registry::StepName;
use crate::reputation::types::StepOutput;
use async_trait::async_trait;
use std::time::Duration;
use trustscore_shared::TrustscoreResult;

pub struct ExplainTask {
    timeout: Duration,
}

impl ExplainTask {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PipelineTask<RunCtx> for ExplainTask {
    async fn run(self: Box<Self>, ctx: RunCtx) -> TrustscoreResult<StepOutput> {
        task_start(&ctx, self.name());

        let card = ctx.output(StepName::ComputeScore, StepOutput::as_score)?;
        let mut explanation = ctx.explainer.explain(card.score, &card.breakdown).await?;

        // Confidence comes from outside; keep it in 0..=1.
        explanation.confidence = if explanation.confidence.is_finite() {
            explanation.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(StepOutput::Explanation(explanation))
    }

    fn name(&self) -> &str {
        StepName::Explain.as_str()
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}

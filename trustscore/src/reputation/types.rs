//! Payloads passed between reputation steps.

use crate::reputation::address::Address;
use crate::sources::SourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Raw payload returned by one activity source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceActivity {
    pub source: SourceId,
    pub payload: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

/// The three source payloads for one address, pinned to a reference time.
///
/// `as_of` is what account age is measured against, so scoring the same
/// aggregate twice yields the same result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePayload {
    pub address: Address,
    pub as_of: DateTime<Utc>,
    pub indexer: serde_json::Value,
    pub explorer: serde_json::Value,
    pub governance: serde_json::Value,
}

/// Named counters behind a score, with the points each one contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub account_age_days: u64,
    pub transaction_count: u64,
    pub protocol_interactions: u64,
    pub governance_votes: u64,
    pub age_points: u8,
    pub activity_points: u8,
    pub protocol_points: u8,
    pub governance_points: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    /// 0..=100
    pub score: u8,
    pub breakdown: ScoreBreakdown,
}

/// Natural-language account of a score, produced by an [`crate::sources::Explainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub text: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Final payload handed back to the scoring request handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationReport {
    pub pipeline_id: String,
    pub address: String,
    pub score: u8,
    pub confidence: f64,
    pub breakdown: Option<ScoreBreakdown>,
    pub explanation: String,
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
    pub sources: Vec<SourceId>,
    pub generated_at: DateTime<Utc>,
    /// Set when the pipeline failed and this report is a stand-in.
    pub fallback: bool,
}

impl ReputationReport {
    /// Zero-score, zero-confidence report for a run that did not complete.
    pub fn fallback(pipeline_id: Option<&str>, address: &str, reason: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.unwrap_or_default().to_string(),
            address: address.to_string(),
            score: 0,
            confidence: 0.0,
            breakdown: None,
            explanation: "Reputation could not be computed for this address.".to_string(),
            reasons: vec![reason.into()],
            recommendations: vec!["Retry the request once data providers recover.".to_string()],
            sources: Vec::new(),
            generated_at: Utc::now(),
            fallback: true,
        }
    }
}

/// Output of one pipeline step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StepOutput {
    Address(Address),
    Activity(SourceActivity),
    Aggregate(AggregatePayload),
    Score(ScoreCard),
    Explanation(Explanation),
    Report(ReputationReport),
}

impl StepOutput {
    fn kind(&self) -> &'static str {
        match self {
            StepOutput::Address(_) => "address",
            StepOutput::Activity(_) => "activity",
            StepOutput::Aggregate(_) => "aggregate",
            StepOutput::Score(_) => "score",
            StepOutput::Explanation(_) => "explanation",
            StepOutput::Report(_) => "report",
        }
    }

    fn mismatch(&self, expected: &str) -> TrustscoreError {
        TrustscoreError::Aggregation(format!(
            "expected {} output, found {}",
            expected,
            self.kind()
        ))
    }

    pub fn as_address(&self) -> TrustscoreResult<&Address> {
        match self {
            StepOutput::Address(address) => Ok(address),
            other => Err(other.mismatch("address")),
        }
    }

    pub fn as_activity(&self) -> TrustscoreResult<&SourceActivity> {
        match self {
            StepOutput::Activity(activity) => Ok(activity),
            other => Err(other.mismatch("activity")),
        }
    }

    pub fn as_aggregate(&self) -> TrustscoreResult<&AggregatePayload> {
        match self {
            StepOutput::Aggregate(aggregate) => Ok(aggregate),
            other => Err(other.mismatch("aggregate")),
        }
    }

    pub fn as_score(&self) -> TrustscoreResult<&ScoreCard> {
        match self {
            StepOutput::Score(card) => Ok(card),
            other => Err(other.mismatch("score")),
        }
    }

    pub fn as_explanation(&self) -> TrustscoreResult<&Explanation> {
        match self {
            StepOutput::Explanation(explanation) => Ok(explanation),
            other => Err(other.mismatch("explanation")),
        }
    }

    pub fn as_report(&self) -> TrustscoreResult<&ReputationReport> {
        match self {
            StepOutput::Report(report) => Ok(report),
            other => Err(other.mismatch("report")),
        }
    }
}

//! Deterministic score derivation.
//!
//! Counters are read from the source payloads by key; a missing key counts as
//! zero, a present key of the wrong type is a [`TrustscoreError::Computation`].
//!
//! | source     | keys (first match wins)                      |
//! |------------|----------------------------------------------|
//! | explorer   | `first_seen` (RFC 3339 or unix seconds)      |
//! | explorer   | `transaction_count`, else `transactions` len |
//! | indexer    | `protocol_interactions`, else `interactions` |
//! | governance | `vote_count`, else `votes` len               |
//!
//! Weights (points are floored, each capped at its maximum):
//!
//! | counter               | saturates at | max points |
//! |-----------------------|--------------|------------|
//! | account age (days)    | 730          | 30         |
//! | transactions          | 500          | 25         |
//! | protocol interactions | 50           | 25         |
//! | governance votes      | 20           | 20         |

use crate::reputation::types::{AggregatePayload, ScoreBreakdown, ScoreCard};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

const AGE_SATURATION_DAYS: u64 = 730;
const AGE_MAX_POINTS: u64 = 30;
const TX_SATURATION: u64 = 500;
const TX_MAX_POINTS: u64 = 25;
const PROTOCOL_SATURATION: u64 = 50;
const PROTOCOL_MAX_POINTS: u64 = 25;
const VOTE_SATURATION: u64 = 20;
const VOTE_MAX_POINTS: u64 = 20;

/// Score an aggregate. Same input, same output.
pub fn compute_score(aggregate: &AggregatePayload) -> TrustscoreResult<ScoreCard> {
    let account_age_days = match first_seen(&aggregate.explorer)? {
        Some(first_seen) if first_seen < aggregate.as_of => {
            (aggregate.as_of - first_seen).num_days().max(0) as u64
        }
        _ => 0,
    };
    let transaction_count = counter(&aggregate.explorer, "transaction_count", "transactions")?;
    let protocol_interactions =
        counter(&aggregate.indexer, "protocol_interactions", "interactions")?;
    let governance_votes = counter(&aggregate.governance, "vote_count", "votes")?;

    let age_points = points(account_age_days, AGE_SATURATION_DAYS, AGE_MAX_POINTS);
    let activity_points = points(transaction_count, TX_SATURATION, TX_MAX_POINTS);
    let protocol_points = points(protocol_interactions, PROTOCOL_SATURATION, PROTOCOL_MAX_POINTS);
    let governance_points = points(governance_votes, VOTE_SATURATION, VOTE_MAX_POINTS);

    let score = age_points + activity_points + protocol_points + governance_points;
    if score > 100 {
        return Err(TrustscoreError::Computation(format!(
            "score {} out of range",
            score
        )));
    }

    Ok(ScoreCard {
        score,
        breakdown: ScoreBreakdown {
            account_age_days,
            transaction_count,
            protocol_interactions,
            governance_votes,
            age_points,
            activity_points,
            protocol_points,
            governance_points,
        },
    })
}

fn points(value: u64, saturation: u64, max_points: u64) -> u8 {
    (value.min(saturation) * max_points / saturation) as u8
}

/// Read `count_key` as an integer, or fall back to the length of the
/// `list_key` array.
fn counter(payload: &Value, count_key: &str, list_key: &str) -> TrustscoreResult<u64> {
    if let Some(value) = payload.get(count_key) {
        return value.as_u64().ok_or_else(|| {
            TrustscoreError::Computation(format!(
                "{} must be a non-negative integer, got {}",
                count_key, value
            ))
        });
    }

    match payload.get(list_key) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Array(items)) => Ok(items.len() as u64),
        Some(other) => Err(TrustscoreError::Computation(format!(
            "{} must be an array, got {}",
            list_key, other
        ))),
    }
}

fn first_seen(explorer: &Value) -> TrustscoreResult<Option<DateTime<Utc>>> {
    match explorer.get("first_seen") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| {
                TrustscoreError::Computation(format!("first_seen is not RFC 3339: {}", e))
            }),
        Some(Value::Number(secs)) => secs
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(Some)
            .ok_or_else(|| {
                TrustscoreError::Computation(format!("first_seen is not a unix timestamp: {}", secs))
            }),
        Some(other) => Err(TrustscoreError::Computation(format!(
            "first_seen has unexpected type: {}",
            other
        ))),
    }
}

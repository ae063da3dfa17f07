//! External collaborators consumed by the reputation pipeline.
//!
//! The clients themselves live outside this crate; the pipeline only needs
//! "fetch activity for address X" per source and an explanation generator.

use crate::registry::StepName;
use crate::reputation::address::Address;
use crate::reputation::types::{Explanation, ScoreBreakdown};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use trustscore_shared::TrustscoreResult;

/// The three activity sources a run fetches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Protocol interaction activity from the graph indexer.
    Indexer,
    /// Transaction history from the block explorer.
    Explorer,
    /// Governance votes.
    Governance,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Indexer, SourceId::Explorer, SourceId::Governance];

    /// The pipeline step that fetches this source.
    pub fn step(self) -> StepName {
        match self {
            SourceId::Indexer => StepName::FetchSourceA,
            SourceId::Explorer => StepName::FetchSourceB,
            SourceId::Governance => StepName::FetchSourceC,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceId::Indexer => "indexer",
            SourceId::Explorer => "explorer",
            SourceId::Governance => "governance",
        };
        f.write_str(name)
    }
}

/// Fetches raw activity data for an address from one provider.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Returns the provider's payload as-is. Network and provider-side
    /// validation failures are errors.
    async fn fetch_activity(&self, address: &Address) -> TrustscoreResult<serde_json::Value>;
}

/// Turns a score and its breakdown into prose.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, score: u8, breakdown: &ScoreBreakdown) -> TrustscoreResult<Explanation>;
}

/// One client per [`SourceId`].
#[derive(Clone)]
pub struct Sources {
    indexer: Arc<dyn ActivitySource>,
    explorer: Arc<dyn ActivitySource>,
    governance: Arc<dyn ActivitySource>,
}

impl Sources {
    pub fn new(
        indexer: Arc<dyn ActivitySource>,
        explorer: Arc<dyn ActivitySource>,
        governance: Arc<dyn ActivitySource>,
    ) -> Self {
        Self {
            indexer,
            explorer,
            governance,
        }
    }

    pub fn get(&self, id: SourceId) -> &Arc<dyn ActivitySource> {
        match id {
            SourceId::Indexer => &self.indexer,
            SourceId::Explorer => &self.explorer,
            SourceId::Governance => &self.governance,
        }
    }
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sources").finish()
    }
}

//! Reputation scoring pipeline with dependency health monitoring.
//!
//! [`TrustscoreRuntime`] is the entry point: it runs the 8-step reputation
//! pipeline per address, keeps a bounded registry of run records, probes
//! external dependencies on a schedule, and derives dashboard views from
//! both.

pub mod health;
pub mod logging;
pub mod monitoring;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod reputation;
pub mod runtime;
pub mod sources;

pub use logging::init_logging;
pub use options::TrustscoreOptions;
pub use reputation::{ReputationReport, RunError};
pub use runtime::TrustscoreRuntime;
pub use trustscore_shared::{TrustscoreError, TrustscoreResult};

//! Step transition sink.

use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Receives the status transitions of every step the executor runs.
///
/// Implemented by the pipeline context. The executor calls `step_started`
/// right before a task runs, then exactly one of `step_completed` or
/// `step_failed` once it settles (including on timeout).
pub trait StepRecorder: Clone + Send + Sync + 'static {
    /// Output produced by a successful step.
    type Output: Send + 'static;

    fn step_started(&self, step: &str) -> TrustscoreResult<()>;

    fn step_completed(&self, step: &str, output: Self::Output) -> TrustscoreResult<()>;

    fn step_failed(&self, step: &str, error: &TrustscoreError) -> TrustscoreResult<()>;
}

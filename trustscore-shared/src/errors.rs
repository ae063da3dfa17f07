//! Error taxonomy for trustscore.

use thiserror::Error;

/// Result alias used throughout trustscore.
pub type TrustscoreResult<T> = Result<T, TrustscoreError>;

#[derive(Debug, Error)]
pub enum TrustscoreError {
    /// Malformed caller input (e.g. an address that fails validation). Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An external dependency failed to answer a fetch or probe.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// A bounded external call ran past its deadline.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Scoring or formatting logic failed on input it should accept.
    #[error("computation error: {0}")]
    Computation(String),

    /// A step read the output of an upstream step that never completed.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrustscoreError {
    /// Whether this error means an external collaborator was unreachable.
    ///
    /// Timeouts count: a hung call is treated like a refused one.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            TrustscoreError::DependencyUnavailable(_) | TrustscoreError::Timeout { .. }
        )
    }

    /// Short machine-readable label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TrustscoreError::InvalidInput(_) => "invalid_input",
            TrustscoreError::DependencyUnavailable(_) => "dependency_unavailable",
            TrustscoreError::Timeout { .. } => "timeout",
            TrustscoreError::Computation(_) => "computation",
            TrustscoreError::Aggregation(_) => "aggregation",
            TrustscoreError::Config(_) => "config",
            TrustscoreError::Internal(_) => "internal",
            TrustscoreError::Io(_) => "io",
        }
    }
}

//! Single bounded health check against one dependency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use trustscore_shared::TrustscoreResult;

/// Reachability check for one external dependency.
///
/// Implementations may fail however they like; [`DependencyProbe`] turns
/// every failure, including a timeout, into a failed [`ProbeOutcome`].
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> TrustscoreResult<()>;
}

/// Result of one probe. Never an error: failures are data.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub ok: bool,
    /// Wall-clock time the check took (up to the timeout).
    pub elapsed_ms: u64,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// A named check with a deadline.
#[derive(Clone)]
pub struct DependencyProbe {
    name: String,
    check: Arc<dyn HealthCheck>,
    timeout: Duration,
}

impl DependencyProbe {
    pub fn new(name: impl Into<String>, check: Arc<dyn HealthCheck>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            check,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn probe(&self) -> ProbeOutcome {
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.check.check()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let error = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "probe timed out after {}ms",
                self.timeout.as_millis()
            )),
        };

        match &error {
            None => tracing::debug!(dependency = %self.name, elapsed_ms, "Probe succeeded"),
            Some(e) => tracing::warn!(dependency = %self.name, elapsed_ms, error = %e, "Probe failed"),
        }

        ProbeOutcome {
            ok: error.is_none(),
            elapsed_ms,
            error,
            checked_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for DependencyProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyProbe")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

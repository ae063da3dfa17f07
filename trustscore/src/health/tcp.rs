//! TCP connect check.

use super::probe::HealthCheck;
use async_trait::async_trait;
use tokio::net::TcpStream;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Treats a dependency as reachable when a TCP connection to `address`
/// (`host:port`) can be opened.
#[derive(Debug, Clone)]
pub struct TcpCheck {
    address: String,
}

impl TcpCheck {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl HealthCheck for TcpCheck {
    async fn check(&self) -> TrustscoreResult<()> {
        TcpStream::connect(&self.address)
            .await
            .map(drop)
            .map_err(|e| {
                TrustscoreError::DependencyUnavailable(format!(
                    "connect to {} failed: {}",
                    self.address, e
                ))
            })
    }
}

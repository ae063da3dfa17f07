//! Account address validation.

use serde::Serialize;
use std::fmt;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Length of a `0x`-prefixed 20-byte hex address.
pub const ADDRESS_LEN: usize = 42;

/// A syntactically valid account address, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Validate `raw` as an address.
    ///
    /// Checks shape only (prefix, length, hex digits); no checksum or
    /// on-chain existence check is made.
    pub fn parse(raw: &str) -> TrustscoreResult<Self> {
        if raw.is_empty() {
            return Err(TrustscoreError::InvalidInput("address is empty".into()));
        }

        let Some(body) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) else {
            return Err(TrustscoreError::InvalidInput(format!(
                "address must start with 0x: {}",
                preview(raw)
            )));
        };

        if raw.len() != ADDRESS_LEN {
            return Err(TrustscoreError::InvalidInput(format!(
                "address must be {} characters, got {}",
                ADDRESS_LEN,
                raw.len()
            )));
        }

        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TrustscoreError::InvalidInput(format!(
                "address contains non-hex characters: {}",
                preview(raw)
            )));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234…abcd` form for log lines.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[ADDRESS_LEN - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First characters of untrusted input, safe to echo into an error.
fn preview(raw: &str) -> String {
    raw.chars().take(16).collect()
}

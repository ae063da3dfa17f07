//! Types shared between the trustscore library and its tooling.

pub mod constants;
pub mod errors;

pub use errors::{TrustscoreError, TrustscoreResult};

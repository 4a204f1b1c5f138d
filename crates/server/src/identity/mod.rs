//! Identity verification against the external token issuer.
//!
//! [`IdentityVerifier`] turns a bearer credential into a
//! [`VerifiedIdentity`]. The production implementation is
//! [`FirebaseVerifier`]; tests plug in their own.

pub mod firebase;

use async_trait::async_trait;
use thiserror::Error;

use volunteer_board_core::VerifiedIdentity;

pub use firebase::FirebaseVerifier;

/// Errors that can occur while verifying a credential.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The issuer rejected the token (expired, forged, wrong audience, ...).
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The issuer could not be reached or answered unexpectedly.
    #[error("identity issuer unavailable: {0}")]
    Unavailable(String),
}

/// Verifies bearer credentials.
///
/// Implementations must not cache verdicts: every call re-verifies.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the identity it asserts.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

//! Verified caller identity.

use serde::{Deserialize, Serialize};

use super::email::Email;

/// The claim produced by the identity issuer after a bearer credential has
/// been verified.
///
/// Every ownership check compares `email` against the owner field of a
/// payload or stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Verified email address of the caller.
    pub email: Email,
    /// Issuer-assigned subject identifier (`sub` claim).
    pub subject_id: String,
}

impl VerifiedIdentity {
    /// Create a new verified identity.
    #[must_use]
    pub fn new(email: Email, subject_id: impl Into<String>) -> Self {
        Self {
            email,
            subject_id: subject_id.into(),
        }
    }

    /// Whether this identity owns a record keyed by `owner`.
    #[must_use]
    pub fn owns(&self, owner: &Email) -> bool {
        &self.email == owner
    }
}

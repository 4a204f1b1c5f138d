//! Ledger error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The verified caller does not match the identity in the payload or
    /// the stored owner. Nothing was written.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// The submission cannot be accepted as given.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The submission duplicates an existing record.
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// Repository/database error.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

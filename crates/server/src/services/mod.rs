//! Business logic services.
//!
//! # Services
//!
//! - `ledger` - Posts, volunteer requests, ownership and capacity rules

pub mod ledger;

pub use ledger::{LedgerError, LedgerService, SubmitReceipt, ensure_claimed_owner};

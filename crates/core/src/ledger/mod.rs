//! Double-entry bookkeeping rules.
//!
//! This module implements the ledger functionality that does not touch storage:
//! - Account types and their normal side
//! - Sign resolution for posting and reversing legs
//! - Leg validation under a configurable policy
//! - Carry-forward of closing balances into a new book
//! - Error types for ledger operations

pub mod balance;
pub mod carry_forward;
pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use balance::{apply_leg, balance_delta, effective_sign, reverse_leg};
pub use carry_forward::{ClosingTitle, OpeningTitle, carry_forward};
pub use error::LedgerError;
pub use types::{AccountTitleId, AccountType, Leg, LegPolicy, LegTotals, NormalSide};
pub use validation::validate_legs;

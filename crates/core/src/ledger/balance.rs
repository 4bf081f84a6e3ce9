//! Sign resolution for posting legs to running balances.
//!
//! A leg moves an account's balance up when it lands on the account's normal
//! side and down otherwise:
//!
//! | leg    | debit-normal | credit-normal |
//! |--------|--------------|---------------|
//! | debit  | +amount      | -amount       |
//! | credit | -amount      | +amount       |
//!
//! Reversing a leg subtracts exactly what applying it added, so
//! `reverse_leg(apply_leg(b, leg), leg) == b` for every representable result.

use super::error::LedgerError;
use super::types::{AccountType, Leg, NormalSide};

/// Returns `+1` when the leg increases the account's balance and `-1` otherwise.
#[must_use]
pub const fn effective_sign(account_type: AccountType, is_debit: bool) -> i64 {
    match (account_type.normal_side(), is_debit) {
        (NormalSide::Debit, true) | (NormalSide::Credit, false) => 1,
        (NormalSide::Debit, false) | (NormalSide::Credit, true) => -1,
    }
}

/// Signed change a leg makes to an account of the given type.
///
/// # Errors
///
/// Returns `LedgerError::BalanceOverflow` if the amount cannot be negated.
pub fn balance_delta(account_type: AccountType, leg: &Leg) -> Result<i64, LedgerError> {
    leg.amount
        .checked_mul(effective_sign(account_type, leg.is_debit))
        .ok_or(LedgerError::BalanceOverflow(leg.account_title_id))
}

/// Balance after posting `leg`.
///
/// # Errors
///
/// Returns `LedgerError::BalanceOverflow` if the new balance is out of range.
pub fn apply_leg(balance: i64, account_type: AccountType, leg: &Leg) -> Result<i64, LedgerError> {
    balance
        .checked_add(balance_delta(account_type, leg)?)
        .ok_or(LedgerError::BalanceOverflow(leg.account_title_id))
}

/// Balance after undoing a previously posted `leg`.
///
/// # Errors
///
/// Returns `LedgerError::BalanceOverflow` if the new balance is out of range.
pub fn reverse_leg(
    balance: i64,
    account_type: AccountType,
    leg: &Leg,
) -> Result<i64, LedgerError> {
    balance
        .checked_sub(balance_delta(account_type, leg)?)
        .ok_or(LedgerError::BalanceOverflow(leg.account_title_id))
}

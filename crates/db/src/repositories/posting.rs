//! Ledger posting engine.
//!
//! The only code path that moves an account title's running balance in
//! response to a leg. Both entry points take a `&DatabaseTransaction`, so a
//! balance can only change inside an open unit of work. The account row is
//! locked before it is read; the new balance is computed with the sign rule
//! from `ledgerbook_core::ledger::balance`.
//!
//! No cross-leg validation happens here. Callers validate legs first.

use sea_orm::{ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait, QuerySelect, Set};
use uuid::Uuid;

use ledgerbook_core::ledger::{AccountType, Leg, LedgerError, apply_leg, reverse_leg};

use crate::entities::account_titles;

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// Ledger rule violation (missing account, overflow).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Apply,
    Reverse,
}

/// Posts `leg` to its account title and returns the new balance.
///
/// # Errors
///
/// Returns `LedgerError::AccountNotFound` if the title does not exist in the
/// book, `LedgerError::BalanceOverflow` if the balance would overflow.
pub async fn apply(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    leg: &Leg,
) -> Result<i64, PostingError> {
    post(txn, book_id, leg, Direction::Apply).await
}

/// Undoes a previously applied `leg` and returns the new balance.
///
/// # Errors
///
/// Same as [`apply`].
pub async fn reverse(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    leg: &Leg,
) -> Result<i64, PostingError> {
    post(txn, book_id, leg, Direction::Reverse).await
}

async fn post(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    leg: &Leg,
    direction: Direction,
) -> Result<i64, PostingError> {
    let title = account_titles::Entity::find_by_id((book_id, leg.account_title_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(LedgerError::AccountNotFound(leg.account_title_id))?;

    let account_type = AccountType::new(title.account_type)?;
    let new_balance = match direction {
        Direction::Apply => apply_leg(title.amount, account_type, leg)?,
        Direction::Reverse => reverse_leg(title.amount, account_type, leg)?,
    };

    let mut active: account_titles::ActiveModel = title.into();
    active.amount = Set(new_balance);
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(txn).await?;

    Ok(new_balance)
}

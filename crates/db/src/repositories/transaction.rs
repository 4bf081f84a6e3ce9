//! Transaction repository: creating, amending, and deleting posted transactions.
//!
//! Every mutation runs in one database transaction: lock the book, reverse
//! old legs, apply new legs, write rows, commit. Any error drops the
//! uncommitted `DatabaseTransaction`, which rolls the whole unit back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use ledgerbook_core::ledger::{AccountTitleId, Leg, LegPolicy, LedgerError, validate_legs};
use ledgerbook_shared::types::Page;

use super::book::{Sequence, lock_book, reserve_ids};
use super::posting::{self, PostingError};
use crate::entities::{account_titles, sub_transactions, transactions};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found in the book.
    #[error("Transaction not found: {0}")]
    NotFound(i64),

    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    /// Ledger rule violation (validation, missing account, overflow).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PostingError> for TransactionError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::Ledger(e) => Self::Ledger(e),
            PostingError::Database(e) => Self::Database(e),
        }
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Description.
    pub description: String,
    /// Business date.
    pub occurred_at: DateTime<Utc>,
    /// Debit and credit legs.
    pub legs: Vec<Leg>,
}

/// Changes to an existing transaction. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New description.
    pub description: Option<String>,
    /// New business date.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Replacement legs. When absent, balances are untouched.
    pub legs: Option<Vec<Leg>>,
}

/// A leg together with the account title it posts to.
#[derive(Debug, Clone)]
pub struct LegDetail {
    /// The leg row.
    pub leg: sub_transactions::Model,
    /// The account title, as of reading.
    pub account_title: account_titles::Model,
}

/// Transaction with its legs.
#[derive(Debug, Clone)]
pub struct TransactionWithLegs {
    /// Transaction header.
    pub transaction: transactions::Model,
    /// Legs in id order.
    pub legs: Vec<LegDetail>,
}

/// A leg together with the transaction it belongs to.
#[derive(Debug, Clone)]
pub struct LegWithTransaction {
    /// The leg row.
    pub leg: sub_transactions::Model,
    /// The owning transaction.
    pub transaction: transactions::Model,
}

/// Transaction repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    policy: LegPolicy,
}

impl TransactionRepository {
    /// Creates a new transaction repository enforcing balanced legs.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            policy: LegPolicy::Strict,
        }
    }

    /// Sets the leg validation policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: LegPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a transaction and posts its legs.
    ///
    /// # Errors
    ///
    /// Returns a `LedgerError` (wrapped) if the legs fail validation or name
    /// an unknown account title; nothing is written in that case.
    pub async fn create(
        &self,
        book_id: Uuid,
        input: CreateTransactionInput,
    ) -> Result<TransactionWithLegs, TransactionError> {
        validate_legs(&input.legs, self.policy)?;

        let txn = self.db.begin().await?;

        let transaction_id = reserve_ids(&txn, book_id, Sequence::Transaction, 1)
            .await?
            .ok_or(TransactionError::BookNotFound(book_id))?;

        let now = Utc::now().into();
        let transaction = transactions::ActiveModel {
            book_id: Set(book_id),
            transaction_id: Set(transaction_id),
            description: Set(input.description),
            occurred_at: Set(input.occurred_at.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let legs = post_legs(&txn, book_id, transaction_id, &input.legs).await?;
        let legs = resolve_titles(&txn, book_id, legs).await?;

        txn.commit().await?;

        info!(
            book_id = %book_id,
            transaction_id,
            legs = legs.len(),
            "Transaction created"
        );
        Ok(TransactionWithLegs { transaction, legs })
    }

    /// Updates a transaction, replacing its legs when new ones are given.
    ///
    /// With new legs, every previous leg is reversed and removed before the
    /// new legs are inserted and applied. Updating to identical legs leaves
    /// every balance unchanged.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::NotFound` if the transaction does not exist.
    pub async fn update(
        &self,
        book_id: Uuid,
        transaction_id: i64,
        input: UpdateTransactionInput,
    ) -> Result<TransactionWithLegs, TransactionError> {
        if let Some(legs) = &input.legs {
            validate_legs(legs, self.policy)?;
        }

        let txn = self.db.begin().await?;
        lock_book(&txn, book_id)
            .await?
            .ok_or(TransactionError::BookNotFound(book_id))?;

        let transaction = transactions::Entity::find_by_id((book_id, transaction_id))
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))?;

        let legs = if let Some(new_legs) = &input.legs {
            unpost_legs(&txn, book_id, transaction_id).await?;
            post_legs(&txn, book_id, transaction_id, new_legs).await?
        } else {
            find_legs(&txn, book_id, transaction_id).await?
        };

        let mut active: transactions::ActiveModel = transaction.into();
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(occurred_at) = input.occurred_at {
            active.occurred_at = Set(occurred_at.into());
        }
        active.updated_at = Set(Utc::now().into());
        let transaction = active.update(&txn).await?;

        let legs = resolve_titles(&txn, book_id, legs).await?;

        txn.commit().await?;

        info!(
            book_id = %book_id,
            transaction_id,
            legs_replaced = input.legs.is_some(),
            "Transaction updated"
        );
        Ok(TransactionWithLegs { transaction, legs })
    }

    /// Deletes a transaction after reversing all of its legs.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::NotFound` if the transaction does not exist.
    pub async fn delete(&self, book_id: Uuid, transaction_id: i64) -> Result<(), TransactionError> {
        let txn = self.db.begin().await?;
        lock_book(&txn, book_id)
            .await?
            .ok_or(TransactionError::BookNotFound(book_id))?;

        transactions::Entity::find_by_id((book_id, transaction_id))
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))?;

        unpost_legs(&txn, book_id, transaction_id).await?;
        transactions::Entity::delete_by_id((book_id, transaction_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(book_id = %book_id, transaction_id, "Transaction deleted");
        Ok(())
    }

    /// Gets a transaction with its legs and their account titles.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(
        &self,
        book_id: Uuid,
        transaction_id: i64,
    ) -> Result<Option<TransactionWithLegs>, TransactionError> {
        let Some(transaction) = transactions::Entity::find_by_id((book_id, transaction_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let legs = find_legs(&self.db, book_id, transaction_id).await?;
        let legs = resolve_titles(&self.db, book_id, legs).await?;
        Ok(Some(TransactionWithLegs { transaction, legs }))
    }

    /// Lists one page of transactions with their legs.
    ///
    /// Ordered by `occurred_at` DESC, then `created_at` DESC, then id DESC,
    /// which is total, so pages never overlap or skip rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        book_id: Uuid,
        page: Page,
    ) -> Result<Vec<TransactionWithLegs>, TransactionError> {
        let headers = transactions::Entity::find()
            .filter(transactions::Column::BookId.eq(book_id))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::TransactionId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = headers.iter().map(|t| t.transaction_id).collect();
        let legs = sub_transactions::Entity::find()
            .filter(sub_transactions::Column::BookId.eq(book_id))
            .filter(sub_transactions::Column::TransactionId.is_in(ids))
            .order_by_asc(sub_transactions::Column::SubTransactionId)
            .all(&self.db)
            .await?;
        let mut legs = resolve_titles(&self.db, book_id, legs).await?;

        let mut by_transaction: HashMap<i64, Vec<LegDetail>> = HashMap::new();
        for detail in legs.drain(..) {
            by_transaction
                .entry(detail.leg.transaction_id)
                .or_default()
                .push(detail);
        }

        Ok(headers
            .into_iter()
            .map(|transaction| TransactionWithLegs {
                legs: by_transaction
                    .remove(&transaction.transaction_id)
                    .unwrap_or_default(),
                transaction,
            })
            .collect())
    }

    /// Counts the transactions of a book.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, book_id: Uuid) -> Result<u64, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::BookId.eq(book_id))
            .count(&self.db)
            .await
    }

    /// Lists one page of legs posted to an account title, each with its transaction.
    ///
    /// Ordered by the transaction's `occurred_at` DESC, then `created_at`
    /// DESC, then leg id DESC.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_legs_for_title(
        &self,
        book_id: Uuid,
        account_title_id: AccountTitleId,
        page: Page,
    ) -> Result<Vec<LegWithTransaction>, TransactionError> {
        let rows = sub_transactions::Entity::find()
            .filter(sub_transactions::Column::BookId.eq(book_id))
            .filter(sub_transactions::Column::AccountTitleId.eq(account_title_id))
            .find_also_related(transactions::Entity)
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(sub_transactions::Column::SubTransactionId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(leg, transaction)| -> Result<LegWithTransaction, TransactionError> {
                let transaction =
                    transaction.ok_or(TransactionError::NotFound(leg.transaction_id))?;
                Ok(LegWithTransaction { leg, transaction })
            })
            .collect()
    }

    /// Counts the legs posted to an account title.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_legs_for_title(
        &self,
        book_id: Uuid,
        account_title_id: AccountTitleId,
    ) -> Result<u64, DbErr> {
        sub_transactions::Entity::find()
            .filter(sub_transactions::Column::BookId.eq(book_id))
            .filter(sub_transactions::Column::AccountTitleId.eq(account_title_id))
            .count(&self.db)
            .await
    }
}

/// Applies `legs` to their account titles and inserts them as leg rows.
///
/// Balances are applied before rows are written, so an unknown account
/// surfaces as `LedgerError::AccountNotFound` rather than a foreign key error.
async fn post_legs(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    transaction_id: i64,
    legs: &[Leg],
) -> Result<Vec<sub_transactions::Model>, TransactionError> {
    for leg in legs {
        let balance = posting::apply(txn, book_id, leg).await?;
        debug!(account_title_id = leg.account_title_id, balance, "Leg applied");
    }

    let first_id = reserve_ids(txn, book_id, Sequence::SubTransaction, legs.len())
        .await?
        .ok_or(TransactionError::BookNotFound(book_id))?;

    let now = Utc::now().into();
    let mut rows = Vec::with_capacity(legs.len());
    for (sub_transaction_id, leg) in (first_id..).zip(legs) {
        let row = sub_transactions::ActiveModel {
            book_id: Set(book_id),
            sub_transaction_id: Set(sub_transaction_id),
            transaction_id: Set(transaction_id),
            account_title_id: Set(leg.account_title_id),
            is_debit: Set(leg.is_debit),
            amount: Set(leg.amount),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reverses every leg of a transaction and deletes the leg rows.
async fn unpost_legs(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    transaction_id: i64,
) -> Result<(), TransactionError> {
    for row in find_legs(txn, book_id, transaction_id).await? {
        let leg = Leg {
            account_title_id: row.account_title_id,
            is_debit: row.is_debit,
            amount: row.amount,
        };
        let balance = posting::reverse(txn, book_id, &leg).await?;
        debug!(account_title_id = leg.account_title_id, balance, "Leg reversed");
    }

    sub_transactions::Entity::delete_many()
        .filter(sub_transactions::Column::BookId.eq(book_id))
        .filter(sub_transactions::Column::TransactionId.eq(transaction_id))
        .exec(txn)
        .await?;
    Ok(())
}

async fn find_legs<C>(
    conn: &C,
    book_id: Uuid,
    transaction_id: i64,
) -> Result<Vec<sub_transactions::Model>, DbErr>
where
    C: ConnectionTrait,
{
    sub_transactions::Entity::find()
        .filter(sub_transactions::Column::BookId.eq(book_id))
        .filter(sub_transactions::Column::TransactionId.eq(transaction_id))
        .order_by_asc(sub_transactions::Column::SubTransactionId)
        .all(conn)
        .await
}

/// Attaches each leg's account title, loading all titles in one query.
async fn resolve_titles<C>(
    conn: &C,
    book_id: Uuid,
    legs: Vec<sub_transactions::Model>,
) -> Result<Vec<LegDetail>, TransactionError>
where
    C: ConnectionTrait,
{
    if legs.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<AccountTitleId> = legs.iter().map(|leg| leg.account_title_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let titles: HashMap<AccountTitleId, account_titles::Model> = account_titles::Entity::find()
        .filter(account_titles::Column::BookId.eq(book_id))
        .filter(account_titles::Column::AccountTitleId.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|title| (title.account_title_id, title))
        .collect();

    legs.into_iter()
        .map(|leg| -> Result<LegDetail, TransactionError> {
            let account_title = titles
                .get(&leg.account_title_id)
                .cloned()
                .ok_or(LedgerError::AccountNotFound(leg.account_title_id))?;
            Ok(LegDetail { leg, account_title })
        })
        .collect()
}

//! Account title repository: the chart of accounts of a book.
//!
//! Balances are never written here except through [`AccountTitleRepository::correct_balance`],
//! the explicit administrative correction. Postings go through the posting engine.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use ledgerbook_core::ledger::{AccountTitleId, AccountType, LedgerError};
use ledgerbook_shared::types::Page;

use super::book::{Sequence, lock_book, reserve_ids};
use crate::entities::{account_titles, sub_transactions};

/// Error types for account title operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountTitleError {
    /// Account title not found in the book.
    #[error("Account title not found: {0}")]
    NotFound(AccountTitleId),

    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    /// Transactions still post to this account title.
    #[error("Account title {0} is referenced by transactions")]
    InUse(AccountTitleId),

    /// Ledger rule violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an account title.
#[derive(Debug, Clone)]
pub struct CreateAccountTitleInput {
    /// Title name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Opening balance; becomes both `amount` and `amount_base`.
    pub opening_amount: i64,
}

/// Fields of an account title that may be edited.
#[derive(Debug, Clone, Default)]
pub struct AccountTitleChanges {
    /// New name.
    pub name: Option<String>,
    /// New account type. Rejected once transactions reference the title.
    pub account_type: Option<AccountType>,
}

/// Account title repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountTitleRepository {
    db: DatabaseConnection,
}

impl AccountTitleRepository {
    /// Creates a new account title repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account title with the next id of the book.
    ///
    /// # Errors
    ///
    /// Returns `AccountTitleError::BookNotFound` if the book does not exist.
    pub async fn create(
        &self,
        book_id: Uuid,
        input: CreateAccountTitleInput,
    ) -> Result<account_titles::Model, AccountTitleError> {
        let txn = self.db.begin().await?;

        let account_title_id = reserve_ids(&txn, book_id, Sequence::AccountTitle, 1)
            .await?
            .ok_or(AccountTitleError::BookNotFound(book_id))?;

        let now = chrono::Utc::now().into();
        let title = account_titles::ActiveModel {
            book_id: Set(book_id),
            account_title_id: Set(account_title_id),
            name: Set(input.name),
            account_type: Set(input.account_type.code()),
            amount: Set(input.opening_amount),
            amount_base: Set(input.opening_amount),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(book_id = %book_id, account_title_id, "Account title created");
        Ok(title)
    }

    /// Finds an account title.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        book_id: Uuid,
        account_title_id: AccountTitleId,
    ) -> Result<Option<account_titles::Model>, DbErr> {
        account_titles::Entity::find_by_id((book_id, account_title_id))
            .one(&self.db)
            .await
    }

    /// Lists every account title of a book, newest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, book_id: Uuid) -> Result<Vec<account_titles::Model>, DbErr> {
        account_titles::Entity::find()
            .filter(account_titles::Column::BookId.eq(book_id))
            .order_by_desc(account_titles::Column::AccountTitleId)
            .all(&self.db)
            .await
    }

    /// Lists one page of account titles, newest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_page(
        &self,
        book_id: Uuid,
        page: Page,
    ) -> Result<Vec<account_titles::Model>, DbErr> {
        account_titles::Entity::find()
            .filter(account_titles::Column::BookId.eq(book_id))
            .order_by_desc(account_titles::Column::AccountTitleId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
    }

    /// Counts the account titles of a book.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, book_id: Uuid) -> Result<u64, DbErr> {
        account_titles::Entity::find()
            .filter(account_titles::Column::BookId.eq(book_id))
            .count(&self.db)
            .await
    }

    /// Updates name and/or type of an account title.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountTypeChangeNotAllowed` (wrapped) when the
    /// type changes while legs reference the title.
    pub async fn update(
        &self,
        book_id: Uuid,
        account_title_id: AccountTitleId,
        changes: AccountTitleChanges,
    ) -> Result<account_titles::Model, AccountTitleError> {
        let txn = self.db.begin().await?;
        let title = locked_title(&txn, book_id, account_title_id).await?;

        let mut active: account_titles::ActiveModel = title.clone().into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(account_type) = changes.account_type {
            if account_type.code() != title.account_type
                && is_referenced(&txn, book_id, account_title_id).await?
            {
                return Err(LedgerError::AccountTypeChangeNotAllowed(account_title_id).into());
            }
            active.account_type = Set(account_type.code());
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let title = active.update(&txn).await?;

        txn.commit().await?;
        Ok(title)
    }

    /// Overwrites the running balance of an account title.
    ///
    /// This is an administrative correction outside the posting engine; the
    /// `amount == amount_base + Σ legs` identity no longer holds afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AccountTitleError::NotFound` if the title does not exist.
    pub async fn correct_balance(
        &self,
        book_id: Uuid,
        account_title_id: AccountTitleId,
        amount: i64,
    ) -> Result<account_titles::Model, AccountTitleError> {
        let txn = self.db.begin().await?;
        let title = locked_title(&txn, book_id, account_title_id).await?;
        let previous = title.amount;

        let mut active: account_titles::ActiveModel = title.into();
        active.amount = Set(amount);
        active.updated_at = Set(chrono::Utc::now().into());
        let title = active.update(&txn).await?;

        txn.commit().await?;

        warn!(
            book_id = %book_id,
            account_title_id,
            previous_amount = previous,
            amount,
            "Account title balance corrected manually"
        );
        Ok(title)
    }

    /// Deletes an account title no transaction references.
    ///
    /// # Errors
    ///
    /// Returns `AccountTitleError::InUse` if legs reference it.
    pub async fn delete(
        &self,
        book_id: Uuid,
        account_title_id: AccountTitleId,
    ) -> Result<(), AccountTitleError> {
        let txn = self.db.begin().await?;
        locked_title(&txn, book_id, account_title_id).await?;

        if is_referenced(&txn, book_id, account_title_id).await? {
            return Err(AccountTitleError::InUse(account_title_id));
        }

        account_titles::Entity::delete_by_id((book_id, account_title_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(book_id = %book_id, account_title_id, "Account title deleted");
        Ok(())
    }
}

/// Locks the book, then the title, inside `txn`.
async fn locked_title(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    account_title_id: AccountTitleId,
) -> Result<account_titles::Model, AccountTitleError> {
    lock_book(txn, book_id)
        .await?
        .ok_or(AccountTitleError::BookNotFound(book_id))?;

    account_titles::Entity::find_by_id((book_id, account_title_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(AccountTitleError::NotFound(account_title_id))
}

async fn is_referenced(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    account_title_id: AccountTitleId,
) -> Result<bool, DbErr> {
    let legs = sub_transactions::Entity::find()
        .filter(sub_transactions::Column::BookId.eq(book_id))
        .filter(sub_transactions::Column::AccountTitleId.eq(account_title_id))
        .count(txn)
        .await?;
    Ok(legs > 0)
}

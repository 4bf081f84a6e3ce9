//! Book repository: lifecycle, carry-forward, and per-book id sequences.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use ledgerbook_core::authz::{AccessError, Capabilities};
use ledgerbook_core::ledger::{AccountType, ClosingTitle, LedgerError, carry_forward};

use crate::entities::{account_titles, book_authorizations, books, sub_transactions, transactions};

/// Error types for book operations.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// Book not found.
    #[error("Book not found: {0}")]
    NotFound(Uuid),

    /// A stored account title failed a ledger rule.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A stored authority string could not be parsed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Fields of a book that may be edited.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    /// New name.
    pub name: Option<String>,
    /// New year.
    pub year: Option<i32>,
}

/// A book created from a previous one, with its carried-forward titles.
#[derive(Debug, Clone)]
pub struct CarriedForwardBook {
    /// The new book.
    pub book: books::Model,
    /// Account titles copied from the previous book.
    pub account_titles: Vec<account_titles::Model>,
}

/// Per-book id sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Account title ids.
    AccountTitle,
    /// Transaction ids.
    Transaction,
    /// Sub-transaction ids.
    SubTransaction,
}

/// Locks the book row for the rest of `txn`.
///
/// Every writer inside a book takes this lock first, which serializes them.
/// Returns `None` if the book does not exist.
pub(crate) async fn lock_book(
    txn: &DatabaseTransaction,
    book_id: Uuid,
) -> Result<Option<books::Model>, DbErr> {
    books::Entity::find_by_id(book_id)
        .lock_exclusive()
        .one(txn)
        .await
}

/// Reserves `count` consecutive ids from a book sequence and returns the first.
///
/// Returns `None` if the book does not exist. Ids are never handed out twice,
/// even after the rows that used them are deleted.
pub(crate) async fn reserve_ids(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    sequence: Sequence,
    count: usize,
) -> Result<Option<i64>, DbErr> {
    let Some(book) = lock_book(txn, book_id).await? else {
        return Ok(None);
    };

    let current = match sequence {
        Sequence::AccountTitle => book.account_title_seq,
        Sequence::Transaction => book.transaction_seq,
        Sequence::SubTransaction => book.sub_transaction_seq,
    };
    let next = i64::try_from(count)
        .ok()
        .and_then(|count| current.checked_add(count))
        .ok_or_else(|| DbErr::Custom(format!("id sequence exhausted for book {book_id}")))?;

    let mut active: books::ActiveModel = book.into();
    match sequence {
        Sequence::AccountTitle => active.account_title_seq = Set(next),
        Sequence::Transaction => active.transaction_seq = Set(next),
        Sequence::SubTransaction => active.sub_transaction_seq = Set(next),
    }
    active.update(txn).await?;

    Ok(Some(current + 1))
}

/// Book repository for lifecycle operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    db: DatabaseConnection,
}

impl BookRepository {
    /// Creates a new book repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a book by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, book_id: Uuid) -> Result<Option<books::Model>, DbErr> {
        books::Entity::find_by_id(book_id).one(&self.db).await
    }

    /// Creates a book and grants its creator full authority, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str, year: i32, admin: Uuid) -> Result<books::Model, BookError> {
        let txn = self.db.begin().await?;
        let book = insert_book(&txn, name, year, admin).await?;
        txn.commit().await?;

        info!(book_id = %book.book_id, admin = %admin, "Book created");
        Ok(book)
    }

    /// Creates a book whose account titles open at the previous book's balances.
    ///
    /// Each title of `previous` is copied with its name and type, and with
    /// `amount = amount_base = previous.amount`. The previous book is only
    /// read. Everything happens in one unit of work.
    ///
    /// # Errors
    ///
    /// Returns `BookError::NotFound` if `previous` does not exist.
    pub async fn create_from_previous(
        &self,
        name: &str,
        year: i32,
        admin: Uuid,
        previous: Uuid,
    ) -> Result<CarriedForwardBook, BookError> {
        let txn = self.db.begin().await?;

        if books::Entity::find_by_id(previous).one(&txn).await?.is_none() {
            return Err(BookError::NotFound(previous));
        }

        let closing = account_titles::Entity::find()
            .filter(account_titles::Column::BookId.eq(previous))
            .order_by_asc(account_titles::Column::AccountTitleId)
            .all(&txn)
            .await?
            .into_iter()
            .map(|title| {
                Ok(ClosingTitle {
                    account_type: AccountType::new(title.account_type)?,
                    name: title.name,
                    amount: title.amount,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let book = insert_book(&txn, name, year, admin).await?;
        let opening = carry_forward(closing);

        let first_id = reserve_ids(&txn, book.book_id, Sequence::AccountTitle, opening.len())
            .await?
            .ok_or(BookError::NotFound(book.book_id))?;

        let now = chrono::Utc::now().into();
        let mut titles = Vec::with_capacity(opening.len());
        for (account_title_id, title) in (first_id..).zip(opening) {
            let model = account_titles::ActiveModel {
                book_id: Set(book.book_id),
                account_title_id: Set(account_title_id),
                name: Set(title.name),
                account_type: Set(title.account_type.code()),
                amount: Set(title.amount),
                amount_base: Set(title.amount_base),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            titles.push(model);
        }

        // Re-read so the returned model carries the advanced sequence.
        let book = books::Entity::find_by_id(book.book_id)
            .one(&txn)
            .await?
            .ok_or(BookError::NotFound(book.book_id))?;

        txn.commit().await?;

        info!(
            book_id = %book.book_id,
            previous_book_id = %previous,
            carried_titles = titles.len(),
            "Book created from previous book"
        );
        Ok(CarriedForwardBook {
            book,
            account_titles: titles,
        })
    }

    /// Updates a book's name and/or year.
    ///
    /// # Errors
    ///
    /// Returns `BookError::NotFound` if the book does not exist.
    pub async fn update(&self, book_id: Uuid, changes: BookChanges) -> Result<books::Model, BookError> {
        let txn = self.db.begin().await?;
        let book = lock_book(&txn, book_id)
            .await?
            .ok_or(BookError::NotFound(book_id))?;

        let mut active: books::ActiveModel = book.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(year) = changes.year {
            active.year = Set(year);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let book = active.update(&txn).await?;

        txn.commit().await?;
        Ok(book)
    }

    /// Deletes a book and everything it owns, atomically.
    ///
    /// # Errors
    ///
    /// Returns `BookError::NotFound` if the book does not exist.
    pub async fn delete(&self, book_id: Uuid) -> Result<(), BookError> {
        let txn = self.db.begin().await?;
        lock_book(&txn, book_id)
            .await?
            .ok_or(BookError::NotFound(book_id))?;

        sub_transactions::Entity::delete_many()
            .filter(sub_transactions::Column::BookId.eq(book_id))
            .exec(&txn)
            .await?;
        transactions::Entity::delete_many()
            .filter(transactions::Column::BookId.eq(book_id))
            .exec(&txn)
            .await?;
        account_titles::Entity::delete_many()
            .filter(account_titles::Column::BookId.eq(book_id))
            .exec(&txn)
            .await?;
        book_authorizations::Entity::delete_many()
            .filter(book_authorizations::Column::BookId.eq(book_id))
            .exec(&txn)
            .await?;
        books::Entity::delete_by_id(book_id).exec(&txn).await?;

        txn.commit().await?;

        info!(book_id = %book_id, "Book deleted");
        Ok(())
    }

    /// Lists the books a user holds a grant on, with that grant's capabilities.
    ///
    /// Ordered by year descending, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored authority is malformed.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(books::Model, Capabilities)>, BookError> {
        let rows = books::Entity::find()
            .find_also_related(book_authorizations::Entity)
            .filter(book_authorizations::Column::UserId.eq(user_id))
            .order_by_desc(books::Column::Year)
            .order_by_asc(books::Column::Name)
            .order_by_asc(books::Column::BookId)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .filter_map(|(book, grant)| grant.map(|grant| (book, grant)))
            .map(|(book, grant)| -> Result<_, BookError> {
                Ok((book, Capabilities::parse(&grant.authority)?))
            })
            .collect()
    }
}

/// Inserts a book row and its creator's full-authority grant.
async fn insert_book(
    txn: &DatabaseTransaction,
    name: &str,
    year: i32,
    admin: Uuid,
) -> Result<books::Model, DbErr> {
    let now = chrono::Utc::now().into();

    let book = books::ActiveModel {
        book_id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
        year: Set(year),
        account_title_seq: Set(0),
        transaction_seq: Set(0),
        sub_transaction_seq: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;

    book_authorizations::ActiveModel {
        book_id: Set(book.book_id),
        user_id: Set(admin),
        authority: Set(Capabilities::FULL.to_authority_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;

    Ok(book)
}

//! Book authorization repository: grant rows and the capability lookup.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use ledgerbook_core::authz::{AccessError, Capabilities, Capability, ensure_admin_remains};

use super::book::lock_book;
use crate::entities::{book_authorizations, users};

/// Error types for authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    /// User has no profile.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// No grant exists for this user on this book.
    #[error("No authorization for user {user_id} on book {book_id}")]
    NotFound {
        /// The book.
        book_id: Uuid,
        /// The user.
        user_id: Uuid,
    },

    /// A grant already exists for this user on this book.
    #[error("User {user_id} is already authorized on book {book_id}")]
    AlreadyExists {
        /// The book.
        book_id: Uuid,
        /// The user.
        user_id: Uuid,
    },

    /// A grant must hold at least one capability.
    #[error("Authorization must include at least one capability")]
    EmptyGrant,

    /// Access rule violation.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A grant joined with the grantee's profile.
#[derive(Debug, Clone)]
pub struct Grant {
    /// The grant row.
    pub authorization: book_authorizations::Model,
    /// Parsed capabilities.
    pub capabilities: Capabilities,
    /// The grantee, if their profile still exists.
    pub user: Option<users::Model>,
}

/// Authorization repository for grant management.
#[derive(Debug, Clone)]
pub struct AuthorizationRepository {
    db: DatabaseConnection,
}

impl AuthorizationRepository {
    /// Creates a new authorization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the capabilities `user_id` holds on `book_id`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::NotAuthorized` (wrapped) when no grant exists.
    pub async fn authority(
        &self,
        book_id: Uuid,
        user_id: Uuid,
    ) -> Result<Capabilities, AuthorizationError> {
        let grant = book_authorizations::Entity::find_by_id((book_id, user_id))
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotAuthorized)?;

        Ok(Capabilities::parse(&grant.authority)?)
    }

    /// Lists every grant on a book.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored authority is malformed.
    pub async fn list(&self, book_id: Uuid) -> Result<Vec<Grant>, AuthorizationError> {
        let rows = book_authorizations::Entity::find()
            .filter(book_authorizations::Column::BookId.eq(book_id))
            .find_also_related(users::Entity)
            .order_by_asc(book_authorizations::Column::CreatedAt)
            .order_by_asc(book_authorizations::Column::UserId)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(authorization, user)| -> Result<Grant, AuthorizationError> {
                Ok(Grant {
                    capabilities: Capabilities::parse(&authorization.authority)?,
                    authorization,
                    user,
                })
            })
            .collect()
    }

    /// Grants `capabilities` on a book to a user who has none yet.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::AlreadyExists` if a grant is present,
    /// `UserNotFound` if the user has no profile.
    pub async fn grant(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        capabilities: Capabilities,
    ) -> Result<book_authorizations::Model, AuthorizationError> {
        if capabilities.is_empty() {
            return Err(AuthorizationError::EmptyGrant);
        }

        let txn = self.db.begin().await?;
        lock_book(&txn, book_id)
            .await?
            .ok_or(AuthorizationError::BookNotFound(book_id))?;

        if users::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
            return Err(AuthorizationError::UserNotFound(user_id));
        }
        if book_authorizations::Entity::find_by_id((book_id, user_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(AuthorizationError::AlreadyExists { book_id, user_id });
        }

        let now = chrono::Utc::now().into();
        let grant = book_authorizations::ActiveModel {
            book_id: Set(book_id),
            user_id: Set(user_id),
            authority: Set(capabilities.to_authority_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(book_id = %book_id, user_id = %user_id, authority = %grant.authority, "Authorization granted");
        Ok(grant)
    }

    /// Replaces the capabilities of an existing grant.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::NotFound` if no grant exists, and
    /// `AccessError::LastAdmin` (wrapped) if this would remove the book's only admin.
    pub async fn update(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        capabilities: Capabilities,
    ) -> Result<book_authorizations::Model, AuthorizationError> {
        if capabilities.is_empty() {
            return Err(AuthorizationError::EmptyGrant);
        }

        let txn = self.db.begin().await?;
        let current = locked_grant(&txn, book_id, user_id).await?;
        let was_admin = Capabilities::parse(&current.authority)?.contains(Capability::Admin);
        let admins = count_admins(&txn, book_id).await?;
        ensure_admin_remains(admins, was_admin, capabilities.contains(Capability::Admin))?;

        let mut active: book_authorizations::ActiveModel = current.into();
        active.authority = Set(capabilities.to_authority_string());
        active.updated_at = Set(chrono::Utc::now().into());
        let grant = active.update(&txn).await?;

        txn.commit().await?;

        info!(book_id = %book_id, user_id = %user_id, authority = %grant.authority, "Authorization updated");
        Ok(grant)
    }

    /// Removes a user's grant on a book.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::NotFound` if no grant exists, and
    /// `AccessError::LastAdmin` (wrapped) if this is the book's only admin.
    pub async fn revoke(&self, book_id: Uuid, user_id: Uuid) -> Result<(), AuthorizationError> {
        let txn = self.db.begin().await?;
        let current = locked_grant(&txn, book_id, user_id).await?;
        let was_admin = Capabilities::parse(&current.authority)?.contains(Capability::Admin);
        let admins = count_admins(&txn, book_id).await?;
        ensure_admin_remains(admins, was_admin, false)?;

        book_authorizations::Entity::delete_by_id((book_id, user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(book_id = %book_id, user_id = %user_id, "Authorization revoked");
        Ok(())
    }
}

/// Locks the book and loads one grant inside `txn`.
async fn locked_grant(
    txn: &DatabaseTransaction,
    book_id: Uuid,
    user_id: Uuid,
) -> Result<book_authorizations::Model, AuthorizationError> {
    lock_book(txn, book_id)
        .await?
        .ok_or(AuthorizationError::BookNotFound(book_id))?;

    book_authorizations::Entity::find_by_id((book_id, user_id))
        .one(txn)
        .await?
        .ok_or(AuthorizationError::NotFound { book_id, user_id })
}

/// Number of grants on a book that include `Admin`.
async fn count_admins(txn: &DatabaseTransaction, book_id: Uuid) -> Result<u64, AuthorizationError> {
    let grants = book_authorizations::Entity::find()
        .filter(book_authorizations::Column::BookId.eq(book_id))
        .all(txn)
        .await?;

    let mut admins = 0;
    for grant in grants {
        if Capabilities::parse(&grant.authority)?.contains(Capability::Admin) {
            admins += 1;
        }
    }
    Ok(admins)
}

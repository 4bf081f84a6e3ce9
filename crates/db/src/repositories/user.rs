//! User profile repository.
//!
//! Identities are issued elsewhere; this table only records the profile a
//! user enrolled with so grants and book listings can refer to them.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Another user already enrolled with this email.
    #[error("Email already in use: {0}")]
    EmailTaken(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// User repository for profile operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Creates or refreshes the profile of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmailTaken` if a different user holds `email`.
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
    ) -> Result<users::Model, UserError> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        let holder = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&txn)
            .await?;
        if holder.is_some_and(|u| u.user_id != user_id) {
            return Err(UserError::EmailTaken(email.to_string()));
        }

        let user = match users::Entity::find_by_id(user_id).one(&txn).await? {
            Some(existing) => {
                let mut active: users::ActiveModel = existing.into();
                active.email = Set(email.to_string());
                active.name = Set(name.to_string());
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                users::ActiveModel {
                    user_id: Set(user_id),
                    email: Set(email.to_string()),
                    name: Set(name.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        Ok(user)
    }
}

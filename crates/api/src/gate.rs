//! The per-book authorization gate.
//!
//! Every book-scoped handler passes through [`authorize`] before touching the
//! ledger. Checks run in a fixed order and the first failure wins:
//! enrolled user, existing book, grant on the book, required capability.

use uuid::Uuid;

use ledgerbook_core::authz::{Capabilities, Capability};
use ledgerbook_db::entities::{books, users};
use ledgerbook_db::{AuthorizationRepository, BookRepository, UserRepository};
use ledgerbook_shared::AppError;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// What a caller was granted on a book, after passing the gate.
#[derive(Debug, Clone)]
pub struct BookAccess {
    /// The enrolled caller.
    pub user: users::Model,
    /// The book.
    pub book: books::Model,
    /// The caller's full capability set on the book.
    pub capabilities: Capabilities,
}

/// Resolves the caller's profile.
///
/// A valid credential without an enrolled profile is treated as unauthenticated.
pub async fn enrolled_user(state: &AppState, auth: AuthUser) -> Result<users::Model, ApiError> {
    UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| {
            ApiError::with_code(
                AppError::Unauthorized("User profile not found".into()),
                "USER_NOT_ENROLLED",
            )
        })
}

/// Runs the gate for `book_id` and requires `capability`.
pub async fn authorize(
    state: &AppState,
    auth: AuthUser,
    book_id: Uuid,
    capability: Capability,
) -> Result<BookAccess, ApiError> {
    let user = enrolled_user(state, auth).await?;

    let book = BookRepository::new((*state.db).clone())
        .find(book_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Book not found: {book_id}")))?;

    let capabilities = AuthorizationRepository::new((*state.db).clone())
        .authority(book_id, user.user_id)
        .await?;
    capabilities.require(capability)?;

    Ok(BookAccess {
        user,
        book,
        capabilities,
    })
}

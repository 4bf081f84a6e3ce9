//! Book routes: lifecycle and carry-forward.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    gate::{authorize, enrolled_user},
    middleware::AuthUser,
};
use ledgerbook_core::authz::{Capabilities, Capability};
use ledgerbook_db::{
    BookRepository,
    entities::books,
    repositories::BookChanges,
};

use super::account_titles::AccountTitleResponse;

/// Creates the book routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{book_id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
}

/// Request body for creating a book.
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    /// Book name.
    pub name: String,
    /// Accounting year.
    pub year: i32,
    /// Book whose closing balances open the new one. The caller must be its admin.
    pub carry_forward_from: Option<Uuid>,
}

/// Request body for updating a book.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    /// New name.
    pub name: Option<String>,
    /// New year.
    pub year: Option<i32>,
}

/// Response for a book.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    /// Book ID.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Accounting year.
    pub year: i32,
    /// The caller's capabilities on this book.
    pub capabilities: Vec<Capability>,
}

impl BookResponse {
    fn new(book: books::Model, capabilities: Capabilities) -> Self {
        Self {
            id: book.book_id,
            name: book.name,
            year: book.year,
            capabilities: capabilities.iter().collect(),
        }
    }
}

/// Response for a newly created book.
#[derive(Debug, Serialize)]
pub struct CreatedBookResponse {
    /// The book.
    #[serde(flatten)]
    pub book: BookResponse,
    /// Account titles carried forward, empty for a fresh book.
    pub account_titles: Vec<AccountTitleResponse>,
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Name must not be empty"));
    }
    Ok(())
}

/// GET `/books` - Books the caller holds a grant on.
async fn list_books(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let user = enrolled_user(&state, auth).await?;
    let books = BookRepository::new((*state.db).clone())
        .list_for_user(user.user_id)
        .await?;

    Ok(Json(
        books
            .into_iter()
            .map(|(book, caps)| BookResponse::new(book, caps))
            .collect(),
    ))
}

/// POST `/books` - Create a book, optionally carrying balances forward.
async fn create_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateBookRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_name(&payload.name)?;
    let repo = BookRepository::new((*state.db).clone());

    let (book, titles) = if let Some(previous) = payload.carry_forward_from {
        let access = authorize(&state, auth, previous, Capability::Admin).await?;
        let carried = repo
            .create_from_previous(&payload.name, payload.year, access.user.user_id, previous)
            .await?;
        (carried.book, carried.account_titles)
    } else {
        let user = enrolled_user(&state, auth).await?;
        let book = repo.create(&payload.name, payload.year, user.user_id).await?;
        (book, Vec::new())
    };

    info!(
        book_id = %book.book_id,
        user_id = %auth.user_id(),
        carried_titles = titles.len(),
        "Book created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedBookResponse {
            book: BookResponse::new(book, Capabilities::FULL),
            account_titles: titles.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// GET `/books/{book_id}` - Book detail.
async fn get_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<BookResponse>> {
    let access = authorize(&state, auth, book_id, Capability::Read).await?;
    Ok(Json(BookResponse::new(access.book, access.capabilities)))
}

/// PATCH `/books/{book_id}` - Rename a book or change its year.
async fn update_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> ApiResult<Json<BookResponse>> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    let access = authorize(&state, auth, book_id, Capability::Update).await?;

    let book = BookRepository::new((*state.db).clone())
        .update(
            book_id,
            BookChanges {
                name: payload.name,
                year: payload.year,
            },
        )
        .await?;

    info!(book_id = %book_id, "Book updated");
    Ok(Json(BookResponse::new(book, access.capabilities)))
}

/// DELETE `/books/{book_id}` - Delete a book and everything in it.
async fn delete_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize(&state, auth, book_id, Capability::Admin).await?;
    BookRepository::new((*state.db).clone())
        .delete(book_id)
        .await?;

    info!(book_id = %book_id, user_id = %auth.user_id(), "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

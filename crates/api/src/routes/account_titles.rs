//! Account title routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::resolve_page;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    gate::authorize,
    middleware::AuthUser,
};
use ledgerbook_core::authz::Capability;
use ledgerbook_core::ledger::{AccountTitleId, AccountType};
use ledgerbook_db::{
    AccountTitleRepository, TransactionRepository,
    entities::account_titles,
    repositories::{AccountTitleChanges, CreateAccountTitleInput, LegWithTransaction},
};
use ledgerbook_shared::types::{PageRequest, PageResponse};

/// Creates the account title routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/books/{book_id}/account-titles",
            get(list_account_titles).post(create_account_title),
        )
        .route(
            "/books/{book_id}/account-titles/{title_id}",
            get(get_account_title)
                .patch(update_account_title)
                .delete(delete_account_title),
        )
        .route(
            "/books/{book_id}/account-titles/{title_id}/balance",
            put(correct_balance),
        )
        .route(
            "/books/{book_id}/account-titles/{title_id}/transactions",
            get(list_title_legs),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an account title.
#[derive(Debug, Deserialize)]
pub struct CreateAccountTitleRequest {
    /// Name.
    pub name: String,
    /// Type code, 0 through 3.
    pub account_type: i32,
    /// Opening balance; also recorded as the title's base amount.
    #[serde(default)]
    pub amount: i64,
}

/// Request body for updating an account title.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountTitleRequest {
    /// New name.
    pub name: Option<String>,
    /// New type code. Rejected once transactions reference the title.
    pub account_type: Option<i32>,
}

/// Request body for a manual balance correction.
#[derive(Debug, Deserialize)]
pub struct CorrectBalanceRequest {
    /// The corrected balance.
    pub amount: i64,
}

/// Response for an account title.
#[derive(Debug, Serialize)]
pub struct AccountTitleResponse {
    /// Account title ID, local to the book.
    pub id: AccountTitleId,
    /// Name.
    pub name: String,
    /// Type code.
    pub account_type: i32,
    /// Current balance.
    pub amount: i64,
    /// Opening balance.
    pub amount_base: i64,
}

impl From<account_titles::Model> for AccountTitleResponse {
    fn from(title: account_titles::Model) -> Self {
        Self {
            id: title.account_title_id,
            name: title.name,
            account_type: title.account_type,
            amount: title.amount,
            amount_base: title.amount_base,
        }
    }
}

/// A leg posted to an account title, with its transaction header.
#[derive(Debug, Serialize)]
pub struct TitleLegResponse {
    /// Sub-transaction ID.
    pub id: i64,
    /// Owning transaction ID.
    pub transaction_id: i64,
    /// Transaction description.
    pub description: String,
    /// When the transaction occurred.
    pub occurred_at: DateTime<FixedOffset>,
    /// Debit or credit.
    pub is_debit: bool,
    /// Amount in minor units.
    pub amount: i64,
}

impl From<LegWithTransaction> for TitleLegResponse {
    fn from(row: LegWithTransaction) -> Self {
        Self {
            id: row.leg.sub_transaction_id,
            transaction_id: row.transaction.transaction_id,
            description: row.transaction.description,
            occurred_at: row.transaction.occurred_at,
            is_debit: row.leg.is_debit,
            amount: row.leg.amount,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/books/{book_id}/account-titles` - One page of account titles.
async fn list_account_titles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    Query(query): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<AccountTitleResponse>>> {
    let page = resolve_page(&state, query)?;
    authorize(&state, auth, book_id, Capability::Read).await?;

    let repo = AccountTitleRepository::new((*state.db).clone());
    let titles = repo.list_page(book_id, page).await?;
    let total = repo.count(book_id).await?;

    Ok(Json(PageResponse::new(
        titles.into_iter().map(Into::into).collect(),
        page,
        total,
    )))
}

/// POST `/books/{book_id}/account-titles` - Create an account title.
async fn create_account_title(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<CreateAccountTitleRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name must not be empty"));
    }
    let account_type = AccountType::new(payload.account_type)?;
    authorize(&state, auth, book_id, Capability::Admin).await?;

    let title = AccountTitleRepository::new((*state.db).clone())
        .create(
            book_id,
            CreateAccountTitleInput {
                name: payload.name,
                account_type,
                opening_amount: payload.amount,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AccountTitleResponse::from(title))))
}

/// GET `/books/{book_id}/account-titles/{title_id}` - Account title detail.
async fn get_account_title(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, title_id)): Path<(Uuid, AccountTitleId)>,
) -> ApiResult<Json<AccountTitleResponse>> {
    authorize(&state, auth, book_id, Capability::Read).await?;
    let title = AccountTitleRepository::new((*state.db).clone())
        .find(book_id, title_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account title not found: {title_id}")))?;

    Ok(Json(title.into()))
}

/// PATCH `/books/{book_id}/account-titles/{title_id}` - Rename or retype.
async fn update_account_title(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, title_id)): Path<(Uuid, AccountTitleId)>,
    Json(payload): Json<UpdateAccountTitleRequest>,
) -> ApiResult<Json<AccountTitleResponse>> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("Name must not be empty"));
    }
    let account_type = payload.account_type.map(AccountType::new).transpose()?;
    authorize(&state, auth, book_id, Capability::Update).await?;

    let title = AccountTitleRepository::new((*state.db).clone())
        .update(
            book_id,
            title_id,
            AccountTitleChanges {
                name: payload.name,
                account_type,
            },
        )
        .await?;

    Ok(Json(title.into()))
}

/// DELETE `/books/{book_id}/account-titles/{title_id}` - Delete an unused title.
async fn delete_account_title(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, title_id)): Path<(Uuid, AccountTitleId)>,
) -> ApiResult<StatusCode> {
    authorize(&state, auth, book_id, Capability::Admin).await?;
    AccountTitleRepository::new((*state.db).clone())
        .delete(book_id, title_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/books/{book_id}/account-titles/{title_id}/balance` - Manual correction.
async fn correct_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, title_id)): Path<(Uuid, AccountTitleId)>,
    Json(payload): Json<CorrectBalanceRequest>,
) -> ApiResult<Json<AccountTitleResponse>> {
    authorize(&state, auth, book_id, Capability::Admin).await?;
    let title = AccountTitleRepository::new((*state.db).clone())
        .correct_balance(book_id, title_id, payload.amount)
        .await?;

    info!(
        book_id = %book_id,
        account_title_id = title_id,
        user_id = %auth.user_id(),
        "Balance correction requested"
    );
    Ok(Json(title.into()))
}

/// GET `/books/{book_id}/account-titles/{title_id}/transactions` - Legs posted to a title.
async fn list_title_legs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, title_id)): Path<(Uuid, AccountTitleId)>,
    Query(query): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<TitleLegResponse>>> {
    let page = resolve_page(&state, query)?;
    authorize(&state, auth, book_id, Capability::Read).await?;

    if AccountTitleRepository::new((*state.db).clone())
        .find(book_id, title_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Account title not found: {title_id}"
        )));
    }

    let repo = TransactionRepository::new((*state.db).clone());
    let legs = repo.list_legs_for_title(book_id, title_id, page).await?;
    let total = repo.count_legs_for_title(book_id, title_id).await?;

    Ok(Json(PageResponse::new(
        legs.into_iter().map(Into::into).collect(),
        page,
        total,
    )))
}

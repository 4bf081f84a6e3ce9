//! Transaction routes.
//!
//! Creating, editing and deleting a transaction re-posts its legs to the
//! affected account titles in the same unit of work.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, Utc};
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
use ledgerbook_core::ledger::{AccountTitleId, Leg, LedgerError, LegPolicy, validate_legs};
use ledgerbook_db::{
    TransactionRepository,
    repositories::{CreateTransactionInput, LegDetail, TransactionWithLegs, UpdateTransactionInput},
};
use ledgerbook_shared::types::{PageRequest, PageResponse};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/books/{book_id}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/books/{book_id}/transactions/{transaction_id}",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Description.
    pub description: String,
    /// When the transaction occurred.
    pub occurred_at: DateTime<Utc>,
    /// Debit and credit legs.
    pub legs: Vec<Leg>,
}

/// Request body for updating a transaction. Supplying `legs` replaces all of them.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New description.
    pub description: Option<String>,
    /// New occurrence time.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Replacement legs.
    pub legs: Option<Vec<Leg>>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID, local to the book.
    pub id: i64,
    /// Description.
    pub description: String,
    /// When the transaction occurred.
    pub occurred_at: DateTime<FixedOffset>,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at timestamp.
    pub updated_at: DateTime<FixedOffset>,
    /// Legs, in posting order.
    pub legs: Vec<LegResponse>,
}

/// Response for a single leg.
#[derive(Debug, Serialize)]
pub struct LegResponse {
    /// Sub-transaction ID.
    pub id: i64,
    /// Account title posted to.
    pub account_title_id: AccountTitleId,
    /// Name of that account title.
    pub account_title_name: String,
    /// Debit or credit.
    pub is_debit: bool,
    /// Amount in minor units.
    pub amount: i64,
}

impl From<LegDetail> for LegResponse {
    fn from(detail: LegDetail) -> Self {
        Self {
            id: detail.leg.sub_transaction_id,
            account_title_id: detail.leg.account_title_id,
            account_title_name: detail.account_title.name,
            is_debit: detail.leg.is_debit,
            amount: detail.leg.amount,
        }
    }
}

impl From<TransactionWithLegs> for TransactionResponse {
    fn from(t: TransactionWithLegs) -> Self {
        Self {
            id: t.transaction.transaction_id,
            description: t.transaction.description,
            occurred_at: t.transaction.occurred_at,
            created_at: t.transaction.created_at,
            updated_at: t.transaction.updated_at,
            legs: t.legs.into_iter().map(Into::into).collect(),
        }
    }
}

const fn policy(state: &AppState) -> LegPolicy {
    LegPolicy::from_require_balanced(state.ledger.require_balanced_legs)
}

fn repository(state: &AppState) -> TransactionRepository {
    TransactionRepository::new((*state.db).clone()).with_policy(policy(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/books/{book_id}/transactions` - One page of transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    Query(query): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<TransactionResponse>>> {
    let page = resolve_page(&state, query)?;
    authorize(&state, auth, book_id, Capability::Read).await?;

    let repo = repository(&state);
    let transactions = repo.list(book_id, page).await?;
    let total = repo.count(book_id).await?;

    Ok(Json(PageResponse::new(
        transactions.into_iter().map(Into::into).collect(),
        page,
        total,
    )))
}

/// POST `/books/{book_id}/transactions` - Record and post a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_legs(&payload.legs, policy(&state))?;
    authorize(&state, auth, book_id, Capability::Write).await?;

    let created = repository(&state)
        .create(
            book_id,
            CreateTransactionInput {
                description: payload.description,
                occurred_at: payload.occurred_at,
                legs: payload.legs,
            },
        )
        .await?;

    info!(
        book_id = %book_id,
        transaction_id = created.transaction.transaction_id,
        user_id = %auth.user_id(),
        "Transaction recorded"
    );
    Ok((StatusCode::CREATED, Json(TransactionResponse::from(created))))
}

/// GET `/books/{book_id}/transactions/{transaction_id}` - Transaction detail.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, transaction_id)): Path<(Uuid, i64)>,
) -> ApiResult<Json<TransactionResponse>> {
    authorize(&state, auth, book_id, Capability::Read).await?;
    let transaction = repository(&state)
        .get(book_id, transaction_id)
        .await?
        .ok_or_else(|| ApiError::from(LedgerError::TransactionNotFound(transaction_id)))?;

    Ok(Json(transaction.into()))
}

/// PATCH `/books/{book_id}/transactions/{transaction_id}` - Edit a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, transaction_id)): Path<(Uuid, i64)>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    if let Some(legs) = &payload.legs {
        validate_legs(legs, policy(&state))?;
    }
    authorize(&state, auth, book_id, Capability::Update).await?;

    let updated = repository(&state)
        .update(
            book_id,
            transaction_id,
            UpdateTransactionInput {
                description: payload.description,
                occurred_at: payload.occurred_at,
                legs: payload.legs,
            },
        )
        .await?;

    info!(
        book_id = %book_id,
        transaction_id,
        user_id = %auth.user_id(),
        "Transaction updated"
    );
    Ok(Json(updated.into()))
}

/// DELETE `/books/{book_id}/transactions/{transaction_id}` - Delete and unpost.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, transaction_id)): Path<(Uuid, i64)>,
) -> ApiResult<StatusCode> {
    authorize(&state, auth, book_id, Capability::Delete).await?;
    repository(&state).delete(book_id, transaction_id).await?;

    info!(
        book_id = %book_id,
        transaction_id,
        user_id = %auth.user_id(),
        "Transaction deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

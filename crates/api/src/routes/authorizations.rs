//! Book authorization routes. Only a book's admins manage its grants.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    gate::authorize,
    middleware::AuthUser,
};
use ledgerbook_core::authz::{Capabilities, Capability};
use ledgerbook_db::{AuthorizationRepository, entities::book_authorizations, repositories::Grant};

/// Creates the authorization routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/books/{book_id}/authorizations",
            get(list_authorizations).post(grant_authorization),
        )
        .route(
            "/books/{book_id}/authorizations/{user_id}",
            patch(update_authorization).delete(revoke_authorization),
        )
}

/// Request body for granting access to a user.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// The grantee. They must have enrolled a profile.
    pub user_id: Uuid,
    /// Capabilities to grant.
    pub capabilities: Vec<Capability>,
}

/// Request body for replacing a grant's capabilities.
#[derive(Debug, Deserialize)]
pub struct UpdateGrantRequest {
    /// The new capability set.
    pub capabilities: Vec<Capability>,
}

/// Response for a grant.
#[derive(Debug, Serialize)]
pub struct AuthorizationResponse {
    /// The grantee.
    pub user_id: Uuid,
    /// Grantee email, when their profile is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Granted capabilities.
    pub capabilities: Vec<Capability>,
}

impl AuthorizationResponse {
    fn from_row(row: &book_authorizations::Model, capabilities: Capabilities) -> Self {
        Self {
            user_id: row.user_id,
            email: None,
            capabilities: capabilities.iter().collect(),
        }
    }
}

impl From<Grant> for AuthorizationResponse {
    fn from(grant: Grant) -> Self {
        Self {
            user_id: grant.authorization.user_id,
            email: grant.user.map(|u| u.email),
            capabilities: grant.capabilities.iter().collect(),
        }
    }
}

fn capability_set(list: &[Capability]) -> Result<Capabilities, ApiError> {
    let caps: Capabilities = list.iter().copied().collect();
    if caps.is_empty() {
        return Err(ApiError::validation(
            "At least one capability is required",
        ));
    }
    Ok(caps)
}

/// GET `/books/{book_id}/authorizations` - Every grant on the book.
async fn list_authorizations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AuthorizationResponse>>> {
    authorize(&state, auth, book_id, Capability::Admin).await?;
    let grants = AuthorizationRepository::new((*state.db).clone())
        .list(book_id)
        .await?;

    Ok(Json(grants.into_iter().map(Into::into).collect()))
}

/// POST `/books/{book_id}/authorizations` - Grant a user access.
async fn grant_authorization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<GrantRequest>,
) -> ApiResult<impl IntoResponse> {
    let caps = capability_set(&payload.capabilities)?;
    authorize(&state, auth, book_id, Capability::Admin).await?;

    let row = AuthorizationRepository::new((*state.db).clone())
        .grant(book_id, payload.user_id, caps)
        .await?;

    info!(
        book_id = %book_id,
        grantee = %payload.user_id,
        granted_by = %auth.user_id(),
        "Authorization granted"
    );
    Ok((
        StatusCode::CREATED,
        Json(AuthorizationResponse::from_row(&row, caps)),
    ))
}

/// PATCH `/books/{book_id}/authorizations/{user_id}` - Replace a grant.
async fn update_authorization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateGrantRequest>,
) -> ApiResult<Json<AuthorizationResponse>> {
    let caps = capability_set(&payload.capabilities)?;
    authorize(&state, auth, book_id, Capability::Admin).await?;

    let row = AuthorizationRepository::new((*state.db).clone())
        .update(book_id, user_id, caps)
        .await?;

    info!(book_id = %book_id, grantee = %user_id, "Authorization updated");
    Ok(Json(AuthorizationResponse::from_row(&row, caps)))
}

/// DELETE `/books/{book_id}/authorizations/{user_id}` - Revoke a grant.
async fn revoke_authorization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    authorize(&state, auth, book_id, Capability::Admin).await?;
    AuthorizationRepository::new((*state.db).clone())
        .revoke(book_id, user_id)
        .await?;

    info!(book_id = %book_id, grantee = %user_id, "Authorization revoked");
    Ok(StatusCode::NO_CONTENT)
}

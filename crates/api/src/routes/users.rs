//! User profile routes.
//!
//! Credentials are issued elsewhere. A caller enrolls a profile once with
//! `POST /users/me` before they can create or be granted books.

use axum::{
    Json, Router,
    extract::State,
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
    gate::enrolled_user,
    middleware::AuthUser,
};
use ledgerbook_db::{UserRepository, entities::users};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).post(enroll_me))
}

/// Request body for enrolling or refreshing a profile.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    /// Contact email, unique across users.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Response for a user profile.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Email.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.user_id,
            email: user.email,
            name: user.name,
        }
    }
}

/// GET `/users/me` - The caller's profile.
async fn get_me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserResponse>> {
    let user = enrolled_user(&state, auth).await?;
    Ok(Json(user.into()))
}

/// POST `/users/me` - Enroll or refresh the caller's profile.
async fn enroll_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<EnrollRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = payload.email.trim();
    let name = payload.name.trim();
    if !email.contains('@') {
        return Err(ApiError::validation("A valid email is required"));
    }
    if name.is_empty() {
        return Err(ApiError::validation("Name must not be empty"));
    }

    let user = UserRepository::new((*state.db).clone())
        .upsert_profile(auth.user_id(), email, name)
        .await?;

    info!(user_id = %user.user_id, "User profile enrolled");
    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{AppState, error::ApiError};
use ledgerbook_shared::{AppError, IdentityError, types::UserId};

/// Name of the cookie a browser client may carry the token in.
pub const TOKEN_COOKIE: &str = "token";

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Finds the request credential: the Authorization header first, then the cookie.
fn extract_credential(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    from_header.or_else(|| {
        CookieJar::from_headers(request.headers())
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// Authentication middleware that resolves the caller's identity.
///
/// The resolved [`AuthUser`] is stored in request extensions. Whether the user
/// has enrolled a profile is checked later, by the gate.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(credential) = extract_credential(&request) else {
        return ApiError::from(IdentityError::Missing).into_response();
    };

    match state.identity.resolve(&credential) {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Rejected credential");
            ApiError::from(e).into_response()
        }
    }
}

/// Extractor for the authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    /// Returns the user ID.
    #[must_use]
    pub const fn user_id(&self) -> uuid::Uuid {
        self.0.into_inner()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| ApiError::new(AppError::Unauthorized("Authentication required".into())))
    }
}

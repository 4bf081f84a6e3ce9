//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, error::ApiError, middleware::auth_middleware};
use ledgerbook_shared::types::{Page, PageRequest};

pub mod account_titles;
pub mod authorizations;
pub mod books;
pub mod health;
pub mod transactions;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(books::routes())
        .merge(authorizations::routes())
        .merge(account_titles::routes())
        .merge(transactions::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Resolves a caller's page request against the configured limits.
pub(crate) fn resolve_page(state: &AppState, request: PageRequest) -> Result<Page, ApiError> {
    request
        .resolve(state.ledger.default_page_size, state.ledger.max_page_size)
        .map_err(ApiError::from)
}

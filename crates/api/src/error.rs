//! Mapping from domain and repository errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use ledgerbook_core::authz::AccessError;
use ledgerbook_core::ledger::LedgerError;
use ledgerbook_db::repositories::{
    AccountTitleError, AuthorizationError, BookError, TransactionError, UserError,
};
use ledgerbook_shared::{AppError, IdentityError};
use sea_orm::DbErr;

/// An error on its way out of a handler.
///
/// Carries the outward [`AppError`] plus the machine-readable code written to
/// the response body. Ledger and access errors keep their own finer codes.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    code: &'static str,
}

impl ApiError {
    /// Wraps an [`AppError`] using its generic code.
    #[must_use]
    pub const fn new(error: AppError) -> Self {
        let code = error.error_code();
        Self { error, code }
    }

    /// Wraps an [`AppError`] with a more specific code.
    #[must_use]
    pub const fn with_code(error: AppError, code: &'static str) -> Self {
        Self { error, code }
    }

    /// The outward error.
    #[must_use]
    pub const fn app_error(&self) -> &AppError {
        &self.error
    }

    /// The code written to the response body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Shorthand for a 404 with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AppError::NotFound(message.into()))
    }

    /// Shorthand for a 400 with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AppError::Validation(message.into()))
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.error.is_server_error() {
            error!(error = %self.error, code = self.code, "Request failed");
            "An error occurred".to_string()
        } else {
            inner_message(&self.error).to_string()
        };

        (
            status,
            Json(json!({
                "error": self.code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn inner_message(error: &AppError) -> &str {
    match error {
        AppError::Unauthorized(m)
        | AppError::Forbidden(m)
        | AppError::NotFound(m)
        | AppError::Validation(m)
        | AppError::BusinessRule(m)
        | AppError::Conflict(m)
        | AppError::Database(m)
        | AppError::Internal(m) => m,
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error)
    }
}

impl From<DbErr> for ApiError {
    fn from(error: DbErr) -> Self {
        Self::new(AppError::Database(error.to_string()))
    }
}

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        let message = error.to_string();
        let app = match error.http_status_code() {
            404 => AppError::NotFound(message),
            422 => AppError::BusinessRule(message),
            _ => AppError::Validation(message),
        };
        Self::with_code(app, error.error_code())
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        let message = error.to_string();
        let app = match error.http_status_code() {
            403 => AppError::Forbidden(message),
            422 => AppError::BusinessRule(message),
            _ => AppError::Validation(message),
        };
        Self::with_code(app, error.error_code())
    }
}

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        let code = match error {
            IdentityError::Missing => "MISSING_TOKEN",
            IdentityError::Expired => "TOKEN_EXPIRED",
            IdentityError::Invalid => "INVALID_TOKEN",
        };
        Self::with_code(AppError::Unauthorized(error.to_string()), code)
    }
}

impl From<UserError> for ApiError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::EmailTaken(_) => Self::new(AppError::Conflict(error.to_string())),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<BookError> for ApiError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::NotFound(_) => Self::not_found(error.to_string()),
            BookError::Ledger(e) => e.into(),
            BookError::Access(e) => e.into(),
            BookError::Database(e) => e.into(),
        }
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(error: AuthorizationError) -> Self {
        match error {
            AuthorizationError::BookNotFound(_)
            | AuthorizationError::UserNotFound(_)
            | AuthorizationError::NotFound { .. } => Self::not_found(error.to_string()),
            AuthorizationError::AlreadyExists { .. } => {
                Self::new(AppError::Conflict(error.to_string()))
            }
            AuthorizationError::EmptyGrant => Self::validation(error.to_string()),
            AuthorizationError::Access(e) => e.into(),
            AuthorizationError::Database(e) => e.into(),
        }
    }
}

impl From<AccountTitleError> for ApiError {
    fn from(error: AccountTitleError) -> Self {
        match error {
            AccountTitleError::NotFound(_) | AccountTitleError::BookNotFound(_) => {
                Self::not_found(error.to_string())
            }
            AccountTitleError::InUse(_) => {
                Self::with_code(AppError::Conflict(error.to_string()), "ACCOUNT_TITLE_IN_USE")
            }
            AccountTitleError::Ledger(e) => e.into(),
            AccountTitleError::Database(e) => e.into(),
        }
    }
}

impl From<TransactionError> for ApiError {
    fn from(error: TransactionError) -> Self {
        match error {
            TransactionError::NotFound(id) => LedgerError::TransactionNotFound(id).into(),
            TransactionError::BookNotFound(_) => Self::not_found(error.to_string()),
            TransactionError::Ledger(e) => e.into(),
            TransactionError::Database(e) => e.into(),
        }
    }
}

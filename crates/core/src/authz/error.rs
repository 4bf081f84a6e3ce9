//! Access control errors.

use thiserror::Error;

use super::capability::Capability;

/// Errors raised by the authorization gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The user holds no grant on the book.
    #[error("not authorized for this book")]
    NotAuthorized,

    /// The user's grant lacks the capability the operation requires.
    #[error("not authorized: {0} capability required")]
    MissingCapability(Capability),

    /// An authority string contains an unknown capability name.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// The change would leave the book without an admin.
    #[error("a book must keep at least one admin")]
    LastAdmin,
}

impl AccessError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotAuthorized | Self::MissingCapability(_) => "NOT_AUTHORIZED",
            Self::UnknownCapability(_) => "UNKNOWN_CAPABILITY",
            Self::LastAdmin => "LAST_ADMIN",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotAuthorized | Self::MissingCapability(_) => 403,
            Self::UnknownCapability(_) => 400,
            Self::LastAdmin => 422,
        }
    }
}

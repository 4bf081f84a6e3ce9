//! Identity resolution: turning a presented credential into a user id.
//!
//! The ledger never issues credentials itself. It only needs to know who is
//! calling, so the HTTP layer depends on [`IdentityResolver`] and the server
//! wires in a concrete implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::UserId;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}

/// Why a credential could not be resolved to a user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No credential was presented.
    #[error("missing credential")]
    Missing,

    /// The credential has expired.
    #[error("credential has expired")]
    Expired,

    /// The credential is malformed or its signature does not verify.
    #[error("invalid credential")]
    Invalid,
}

/// Resolves the acting user from an opaque credential.
pub trait IdentityResolver: Send + Sync {
    /// Returns the user the credential was issued to.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] when the credential cannot be trusted.
    fn resolve(&self, credential: &str) -> Result<UserId, IdentityError>;
}

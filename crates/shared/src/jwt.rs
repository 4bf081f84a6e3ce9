//! JWT token generation and validation.
//!
//! HS256 access tokens whose `sub` claim is the user id. [`JwtService`] is the
//! production [`IdentityResolver`].

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::{Claims, IdentityError, IdentityResolver};
use crate::config::JwtConfig;
use crate::types::UserId;

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    access_token_expiry_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access_token_expiry_secs: i64::try_from(config.access_token_expiry_secs)
                .unwrap_or(i64::MAX)
                .min(TimeDelta::MAX.num_seconds()),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Generates an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails or the
    /// configured lifetime puts the expiry beyond the representable range.
    pub fn generate_access_token(&self, user_id: UserId) -> Result<String, JwtError> {
        let expires_at = TimeDelta::try_seconds(self.access_token_expiry_secs)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| JwtError::EncodingError("token expiry out of range".into()))?;
        let claims = Claims::new(user_id.into_inner(), expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.access_token_expiry_secs
    }
}

impl IdentityResolver for JwtService {
    fn resolve(&self, credential: &str) -> Result<UserId, IdentityError> {
        if credential.is_empty() {
            return Err(IdentityError::Missing);
        }
        match self.validate_token(credential) {
            Ok(claims) => Ok(claims.user_id()),
            Err(JwtError::Expired) => Err(IdentityError::Expired),
            Err(_) => Err(IdentityError::Invalid),
        }
    }
}

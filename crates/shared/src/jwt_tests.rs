//! Unit tests for JWT functionality.

#[cfg(test)]
mod tests {
    use crate::auth::{Claims, IdentityError, IdentityResolver};
    use crate::config::JwtConfig;
    use crate::jwt::{JwtError, JwtService};
    use crate::types::UserId;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-for-testing";

    fn create_test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: SECRET.to_string(),
            access_token_expiry_secs: 900,
        })
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(user_id, expires_at);

        assert_eq!(claims.sub, user_id);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
        assert_eq!(claims.user_id().into_inner(), user_id);
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let service = create_test_service();
        let user_id = UserId::new();

        let token = service.generate_access_token(user_id).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(service.access_token_expires_in(), 900);
    }

    #[test]
    fn test_huge_expiry_is_an_error_not_a_panic() {
        let service = JwtService::new(&JwtConfig {
            secret: SECRET.to_string(),
            access_token_expiry_secs: u64::MAX,
        });

        let result = service.generate_access_token(UserId::new());
        assert!(matches!(result, Err(JwtError::EncodingError(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = create_test_service();
        let claims = Claims::new(Uuid::new_v4(), Utc::now() - Duration::hours(2));
        let token = sign(&claims, SECRET);

        assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
        assert_eq!(service.resolve(&token), Err(IdentityError::Expired));
    }

    #[test]
    fn test_resolve_returns_subject() {
        let service = create_test_service();
        let user_id = UserId::new();
        let token = service.generate_access_token(user_id).unwrap();

        assert_eq!(service.resolve(&token), Ok(user_id));
    }

    #[test]
    fn test_resolve_rejects_foreign_signature() {
        let service = create_test_service();
        let claims = Claims::new(Uuid::new_v4(), Utc::now() + Duration::hours(1));
        let token = sign(&claims, "some-other-secret");

        assert_eq!(service.resolve(&token), Err(IdentityError::Invalid));
    }

    #[test]
    fn test_resolve_rejects_garbage_and_empty() {
        let service = create_test_service();

        assert_eq!(service.resolve("invalid.token.here"), Err(IdentityError::Invalid));
        assert_eq!(service.resolve(""), Err(IdentityError::Missing));
    }

    #[test]
    fn test_debug_hides_keys() {
        let service = create_test_service();
        let debug = format!("{service:?}");
        assert!(debug.contains("[hidden]"));
        assert!(!debug.contains(SECRET));
    }
}

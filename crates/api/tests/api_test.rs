//! HTTP integration tests against an in-memory database.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use ledgerbook_api::{AppState, create_router};
use ledgerbook_db::migration::{Migrator, MigratorTrait};
use ledgerbook_shared::{JwtConfig, JwtService, LedgerConfig, types::UserId};

struct TestApp {
    router: Router,
    jwt: JwtService,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_ledger(LedgerConfig::default()).await
    }

    async fn with_ledger(ledger: LedgerConfig) -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let config = JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            access_token_expiry_secs: 900,
        };

        let state = AppState {
            db: Arc::new(db),
            identity: Arc::new(JwtService::new(&config)),
            ledger,
        };

        Self {
            router: create_router(state),
            jwt: JwtService::new(&config),
        }
    }

    fn token_for(&self, user_id: Uuid) -> String {
        self.jwt
            .generate_access_token(UserId::from_uuid(user_id))
            .unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Enrolls a fresh user and returns their token.
    async fn enroll(&self, email: &str) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = self.token_for(user_id);
        let (status, _) = self
            .send(
                "POST",
                "/api/v1/users/me",
                Some(&token),
                Some(json!({ "email": email, "name": "Tester" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (user_id, token)
    }

    async fn create_book(&self, token: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/books",
                Some(token),
                Some(json!({ "name": "Household", "year": 2026 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_title(&self, token: &str, book: &str, name: &str, kind: i32, amount: i64) -> i64 {
        let (status, body) = self
            .send(
                "POST",
                &format!("/api/v1/books/{book}/account-titles"),
                Some(token),
                Some(json!({ "name": name, "account_type": kind, "amount": amount })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    async fn balance(&self, token: &str, book: &str, title: i64) -> i64 {
        let (status, body) = self
            .send(
                "GET",
                &format!("/api/v1/books/{book}/account-titles/{title}"),
                Some(token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["amount"].as_i64().unwrap()
    }
}

fn sale(cash: i64, revenue: i64, amount: i64) -> Value {
    json!({
        "description": "Sale",
        "occurred_at": "2026-10-05T12:00:00Z",
        "legs": [
            { "account_title_id": cash, "is_debit": true, "amount": amount },
            { "account_title_id": revenue, "is_debit": false, "amount": amount }
        ]
    })
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_missing_and_invalid_tokens() {
    let app = TestApp::new().await;

    let (status, body) = app.send("GET", "/api/v1/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");

    let (status, body) = app.send("GET", "/api/v1/books", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_unenrolled_user_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token_for(Uuid::new_v4());

    let (status, body) = app.send("GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "USER_NOT_ENROLLED");
}

#[tokio::test]
async fn test_enroll_and_read_profile() {
    let app = TestApp::new().await;
    let (user_id, token) = app.enroll("me@example.com").await;

    let (status, body) = app.send("GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["email"], "me@example.com");

    let (_, other) = app.enroll("other@example.com").await;
    let (status, _) = app
        .send(
            "POST",
            "/api/v1/users/me",
            Some(&other),
            Some(json!({ "email": "me@example.com", "name": "Copycat" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cookie_credential() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("cookie@example.com").await;

    let request = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Ledger flow
// ============================================================================

#[tokio::test]
async fn test_post_and_delete_transaction_moves_balances() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;
    let cash = app.create_title(&token, &book, "Cash", 0, 1000).await;
    let revenue = app.create_title(&token, &book, "Sales", 3, 0).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/v1/books/{book}/transactions"),
            Some(&token),
            Some(sale(cash, revenue, 500)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["legs"].as_array().unwrap().len(), 2);
    assert_eq!(body["legs"][0]["account_title_name"], "Cash");
    let transaction_id = body["id"].as_i64().unwrap();

    assert_eq!(app.balance(&token, &book, cash).await, 1500);
    assert_eq!(app.balance(&token, &book, revenue).await, 500);

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/v1/books/{book}/transactions?page=0&page_size=10"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["total_pages"], 1);

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/v1/books/{book}/account-titles/{cash}/transactions"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["transaction_id"], transaction_id);
    assert_eq!(body["data"][0]["is_debit"], true);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/v1/books/{book}/transactions/{transaction_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.balance(&token, &book, cash).await, 1000);
    assert_eq!(app.balance(&token, &book, revenue).await, 0);

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/v1/books/{book}/transactions/{transaction_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TRANSACTION_NOT_FOUND");
}

#[tokio::test]
async fn test_update_replaces_legs() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;
    let cash = app.create_title(&token, &book, "Cash", 0, 0).await;
    let revenue = app.create_title(&token, &book, "Sales", 3, 0).await;

    let (_, body) = app
        .send(
            "POST",
            &format!("/api/v1/books/{book}/transactions"),
            Some(&token),
            Some(sale(cash, revenue, 300)),
        )
        .await;
    let transaction_id = body["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/api/v1/books/{book}/transactions/{transaction_id}"),
            Some(&token),
            Some(json!({
                "description": "Corrected sale",
                "legs": [
                    { "account_title_id": cash, "is_debit": true, "amount": 250 },
                    { "account_title_id": revenue, "is_debit": false, "amount": 250 }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Corrected sale");
    assert_eq!(app.balance(&token, &book, cash).await, 250);
    assert_eq!(app.balance(&token, &book, revenue).await, 250);
}

#[tokio::test]
async fn test_rejected_transactions_leave_balances_alone() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;
    let cash = app.create_title(&token, &book, "Cash", 0, 100).await;
    let revenue = app.create_title(&token, &book, "Sales", 3, 0).await;
    let uri = format!("/api/v1/books/{book}/transactions");

    let unbalanced = json!({
        "description": "Typo",
        "occurred_at": "2026-10-05T12:00:00Z",
        "legs": [
            { "account_title_id": cash, "is_debit": true, "amount": 100 },
            { "account_title_id": revenue, "is_debit": false, "amount": 90 }
        ]
    });
    let (status, body) = app.send("POST", &uri, Some(&token), Some(unbalanced)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UNBALANCED_TRANSACTION");

    let (status, body) = app
        .send("POST", &uri, Some(&token), Some(sale(cash, 999, 50)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ACCOUNT_NOT_FOUND");

    assert_eq!(app.balance(&token, &book, cash).await, 100);
    assert_eq!(app.balance(&token, &book, revenue).await, 0);
}

#[tokio::test]
async fn test_unbalanced_legs_allowed_when_configured() {
    let app = TestApp::with_ledger(LedgerConfig {
        require_balanced_legs: false,
        ..LedgerConfig::default()
    })
    .await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;
    let cash = app.create_title(&token, &book, "Cash", 0, 1000).await;

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/v1/books/{book}/transactions"),
            Some(&token),
            Some(json!({
                "description": "Found money",
                "occurred_at": "2026-10-05T12:00:00Z",
                "legs": [{ "account_title_id": cash, "is_debit": true, "amount": 500 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.balance(&token, &book, cash).await, 1500);
}

#[tokio::test]
async fn test_invalid_page_size() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/v1/books/{book}/transactions?page_size=0"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/v1/books/{book}/account-titles"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total_pages"], 0);
}

#[rstest]
#[case::type_code_four(4)]
#[case::negative_type_code(-1)]
#[tokio::test]
async fn test_unknown_account_type_rejected(#[case] kind: i32) {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/v1/books/{book}/account-titles"),
            Some(&token),
            Some(json!({ "name": "Mystery", "account_type": kind })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_ACCOUNT_TYPE");

    let (_, body) = app
        .send(
            "GET",
            &format!("/api/v1/books/{book}/account-titles"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn test_malformed_requests_fail_before_the_gate() {
    let app = TestApp::new().await;
    let (_, owner) = app.enroll("owner@example.com").await;
    let (_, stranger) = app.enroll("stranger@example.com").await;
    let book = app.create_book(&owner).await;
    let missing = Uuid::new_v4();

    // Without a grant the gate would answer 403, and for a missing book 404.
    for target in [book.clone(), missing.to_string()] {
        let (status, body) = app
            .send(
                "GET",
                &format!("/api/v1/books/{target}/transactions?page_size=0"),
                Some(&stranger),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/books/{target}/transactions"),
                Some(&stranger),
                Some(json!({
                    "description": "Empty",
                    "occurred_at": "2026-10-05T12:00:00Z",
                    "legs": []
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "NO_LEGS");

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/books/{target}/account-titles"),
                Some(&stranger),
                Some(json!({ "name": "  ", "account_type": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, _) = app
            .send(
                "PATCH",
                &format!("/api/v1/books/{target}"),
                Some(&stranger),
                Some(json!({ "name": "" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .send("GET", &format!("/api/v1/books/{book}/transactions"), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Gate
// ============================================================================

#[tokio::test]
async fn test_gate_order_and_outcomes() {
    let app = TestApp::new().await;
    let (_, owner) = app.enroll("owner@example.com").await;
    let (_, stranger) = app.enroll("stranger@example.com").await;
    let book = app.create_book(&owner).await;

    let (status, _) = app
        .send("GET", &format!("/api/v1/books/{}", Uuid::new_v4()), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send("GET", &format!("/api/v1/books/{book}"), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NOT_AUTHORIZED");

    let (status, body) = app
        .send("GET", &format!("/api/v1/books/{book}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["capabilities"],
        json!(["admin", "read", "write", "update", "delete"])
    );
}

#[rstest]
#[case::reader_can_read("GET", &["read"], StatusCode::OK)]
#[case::reader_cannot_write("POST", &["read"], StatusCode::FORBIDDEN)]
#[case::writer_can_write("POST", &["write"], StatusCode::CREATED)]
#[case::writer_cannot_read("GET", &["write"], StatusCode::FORBIDDEN)]
#[case::admin_alone_cannot_read("GET", &["admin"], StatusCode::FORBIDDEN)]
#[tokio::test]
async fn test_capabilities_per_operation(
    #[case] method: &str,
    #[case] granted: &[&str],
    #[case] expected: StatusCode,
) {
    let app = TestApp::new().await;
    let (_, owner) = app.enroll("owner@example.com").await;
    let (member_id, member) = app.enroll("member@example.com").await;
    let book = app.create_book(&owner).await;
    let cash = app.create_title(&owner, &book, "Cash", 0, 0).await;
    let revenue = app.create_title(&owner, &book, "Sales", 3, 0).await;

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/v1/books/{book}/authorizations"),
            Some(&owner),
            Some(json!({ "user_id": member_id, "capabilities": granted })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let body = (method == "POST").then(|| sale(cash, revenue, 10));
    let (status, _) = app
        .send(
            method,
            &format!("/api/v1/books/{book}/transactions"),
            Some(&member),
            body,
        )
        .await;
    assert_eq!(status, expected);
}

#[tokio::test]
async fn test_last_admin_cannot_leave() {
    let app = TestApp::new().await;
    let (owner_id, owner) = app.enroll("owner@example.com").await;
    let book = app.create_book(&owner).await;

    let (status, body) = app
        .send(
            "DELETE",
            &format!("/api/v1/books/{book}/authorizations/{owner_id}"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "LAST_ADMIN");
}

// ============================================================================
// Books
// ============================================================================

#[tokio::test]
async fn test_carry_forward_through_api() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;
    let cash = app.create_title(&token, &book, "Cash", 0, 1000).await;
    let revenue = app.create_title(&token, &book, "Sales", 3, 0).await;
    app.send(
        "POST",
        &format!("/api/v1/books/{book}/transactions"),
        Some(&token),
        Some(sale(cash, revenue, 250)),
    )
    .await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/books",
            Some(&token),
            Some(json!({ "name": "Household 2027", "year": 2027, "carry_forward_from": book })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["year"], 2027);
    assert_eq!(body["account_titles"][0]["name"], "Cash");
    assert_eq!(body["account_titles"][0]["amount"], 1250);
    assert_eq!(body["account_titles"][0]["amount_base"], 1250);

    let (status, body) = app.send("GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["year"], 2027);
}

#[tokio::test]
async fn test_carry_forward_requires_admin_on_source() {
    let app = TestApp::new().await;
    let (_, owner) = app.enroll("owner@example.com").await;
    let (_, stranger) = app.enroll("stranger@example.com").await;
    let book = app.create_book(&owner).await;

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/books",
            Some(&stranger),
            Some(json!({ "name": "Stolen", "year": 2027, "carry_forward_from": book })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.send("GET", "/api/v1/books", Some(&stranger), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_book() {
    let app = TestApp::new().await;
    let (_, token) = app.enroll("owner@example.com").await;
    let book = app.create_book(&token).await;
    app.create_title(&token, &book, "Cash", 0, 10).await;

    let (status, _) = app
        .send("DELETE", &format!("/api/v1/books/{book}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send("GET", &format!("/api/v1/books/{book}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

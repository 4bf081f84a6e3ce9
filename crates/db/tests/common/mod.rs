//! Shared fixtures for database integration tests.
//!
//! Each test gets its own in-memory SQLite database. The pool is pinned to a
//! single connection because every SQLite in-memory connection is a separate
//! database. Tests that need real row locking connect to Postgres through
//! `DATABASE_URL` instead.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use ledgerbook_core::ledger::AccountType;
use ledgerbook_db::migration::{Migrator, MigratorTrait};
use ledgerbook_db::repositories::{
    AccountTitleRepository, BookRepository, CreateAccountTitleInput, UserRepository,
};

/// Connects to a fresh in-memory database with the schema applied.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Connects to the Postgres database named by `DATABASE_URL` with a pool of
/// `connections`, applying the schema. Returns `None` when the variable is unset.
pub async fn setup_postgres(connections: u32) -> Option<DatabaseConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(connections);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to Postgres");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Some(db)
}

/// Enrolls a user profile and returns its id.
pub async fn seed_user(db: &DatabaseConnection, email: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    UserRepository::new(db.clone())
        .upsert_profile(user_id, email, "Test User")
        .await
        .expect("Failed to create user");
    user_id
}

/// Creates an admin user and a book they own.
pub async fn seed_book(db: &DatabaseConnection) -> (Uuid, Uuid) {
    let admin = seed_user(db, &format!("admin-{}@example.com", Uuid::new_v4())).await;
    let book = BookRepository::new(db.clone())
        .create("Household", 2026, admin)
        .await
        .expect("Failed to create book");
    (book.book_id, admin)
}

/// Creates an account title and returns its id.
pub async fn seed_title(
    db: &DatabaseConnection,
    book_id: Uuid,
    name: &str,
    account_type: i32,
    opening_amount: i64,
) -> i64 {
    AccountTitleRepository::new(db.clone())
        .create(
            book_id,
            CreateAccountTitleInput {
                name: name.to_string(),
                account_type: AccountType::new(account_type).unwrap(),
                opening_amount,
            },
        )
        .await
        .expect("Failed to create account title")
        .account_title_id
}

/// Current balance of an account title.
pub async fn balance(db: &DatabaseConnection, book_id: Uuid, account_title_id: i64) -> i64 {
    AccountTitleRepository::new(db.clone())
        .find(book_id, account_title_id)
        .await
        .unwrap()
        .expect("Account title missing")
        .amount
}

/// Noon UTC on the given day of October 2026.
pub fn on_day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
}

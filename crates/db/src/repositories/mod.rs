//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account_title;
pub mod authorization;
pub mod book;
pub mod posting;
pub mod transaction;
pub mod user;

pub use account_title::{
    AccountTitleChanges, AccountTitleError, AccountTitleRepository, CreateAccountTitleInput,
};
pub use authorization::{AuthorizationError, AuthorizationRepository, Grant};
pub use book::{BookChanges, BookError, BookRepository, CarriedForwardBook};
pub use posting::PostingError;
pub use transaction::{
    CreateTransactionInput, LegDetail, LegWithTransaction, TransactionError,
    TransactionRepository, TransactionWithLegs, UpdateTransactionInput,
};
pub use user::{UserError, UserRepository};

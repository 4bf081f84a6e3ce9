//! `SeaORM` entity definitions.
//!
//! Account titles, transactions, and sub-transactions are keyed by
//! `(book_id, local id)`; local ids come from per-book sequences on `books`.

pub mod account_titles;
pub mod book_authorizations;
pub mod books;
pub mod sub_transactions;
pub mod transactions;
pub mod users;

pub mod prelude {
    //! Entity re-exports.

    pub use super::account_titles::Entity as AccountTitles;
    pub use super::book_authorizations::Entity as BookAuthorizations;
    pub use super::books::Entity as Books;
    pub use super::sub_transactions::Entity as SubTransactions;
    pub use super::transactions::Entity as Transactions;
    pub use super::users::Entity as Users;
}

//! Ledger error types for validation and posting errors.

use thiserror::Error;

use super::types::AccountTitleId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transaction must have at least one leg.
    #[error("Transaction must have at least one leg")]
    NoLegs,

    /// Leg amount must be strictly positive.
    #[error("Leg amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// A balanced transaction needs at least one debit leg.
    #[error("Transaction has no debit leg")]
    MissingDebit,

    /// A balanced transaction needs at least one credit leg.
    #[error("Transaction has no credit leg")]
    MissingCredit,

    /// Transaction is not balanced (debits != credits).
    #[error("Transaction is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedTransaction {
        /// Total debit amount.
        debit: i64,
        /// Total credit amount.
        credit: i64,
    },

    /// Leg totals exceed the representable range.
    #[error("Leg totals overflow")]
    AmountOverflow,

    /// Account type code outside 0..=3.
    #[error("Invalid account type {0}, expected 0..=3")]
    InvalidAccountType(i32),

    // ========== Account Errors ==========
    /// Account title not found in the book.
    #[error("Account title not found: {0}")]
    AccountNotFound(AccountTitleId),

    /// Account type cannot be changed because legs reference the account.
    #[error("Cannot change type of account title {0} because transactions reference it")]
    AccountTypeChangeNotAllowed(AccountTitleId),

    /// Applying or reversing a leg would overflow the running balance.
    #[error("Balance of account title {0} would overflow")]
    BalanceOverflow(AccountTitleId),

    // ========== Transaction Errors ==========
    /// Transaction not found in the book.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoLegs => "NO_LEGS",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::MissingDebit => "MISSING_DEBIT",
            Self::MissingCredit => "MISSING_CREDIT",
            Self::UnbalancedTransaction { .. } => "UNBALANCED_TRANSACTION",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::InvalidAccountType(_) => "INVALID_ACCOUNT_TYPE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountTypeChangeNotAllowed(_) => "ACCOUNT_TYPE_CHANGE_NOT_ALLOWED",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NoLegs
            | Self::NonPositiveAmount(_)
            | Self::MissingDebit
            | Self::MissingCredit
            | Self::UnbalancedTransaction { .. }
            | Self::AmountOverflow
            | Self::InvalidAccountType(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => 404,

            // 422 Unprocessable - the request is valid but the ledger state forbids it
            Self::AccountTypeChangeNotAllowed(_) | Self::BalanceOverflow(_) => 422,
        }
    }
}

//! Carry-forward of closing balances into a new book.
//!
//! A new period's book starts with one account title per title of the previous
//! book. Each copy keeps the name and type, and opens at the previous closing
//! balance, which also becomes its `amount_base`.

use serde::Serialize;

use super::types::AccountType;

/// An account title of the previous book, as read at carry-forward time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingTitle {
    /// Title name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Current running balance.
    pub amount: i64,
}

/// An account title to be created in the new book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpeningTitle {
    /// Title name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Opening running balance.
    pub amount: i64,
    /// Opening base balance, equal to `amount`.
    pub amount_base: i64,
}

/// Builds the opening titles of a new book from the previous book's titles.
///
/// Order is preserved so ids in the new book follow the previous book's order.
#[must_use]
pub fn carry_forward<I>(closing: I) -> Vec<OpeningTitle>
where
    I: IntoIterator<Item = ClosingTitle>,
{
    closing
        .into_iter()
        .map(|title| OpeningTitle {
            name: title.name,
            account_type: title.account_type,
            amount: title.amount,
            amount_base: title.amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_balance_becomes_opening_and_base() {
        let closing = vec![
            ClosingTitle {
                name: "Cash".into(),
                account_type: AccountType::new(0).unwrap(),
                amount: 1500,
            },
            ClosingTitle {
                name: "Payable".into(),
                account_type: AccountType::new(1).unwrap(),
                amount: -20,
            },
        ];

        let opening = carry_forward(closing);

        assert_eq!(opening.len(), 2);
        assert_eq!(opening[0].name, "Cash");
        assert_eq!(opening[0].amount, 1500);
        assert_eq!(opening[0].amount_base, 1500);
        assert_eq!(opening[1].account_type.code(), 1);
        assert_eq!(opening[1].amount, -20);
        assert_eq!(opening[1].amount_base, -20);
    }

    #[test]
    fn test_empty_book_carries_nothing() {
        assert!(carry_forward(Vec::new()).is_empty());
    }
}

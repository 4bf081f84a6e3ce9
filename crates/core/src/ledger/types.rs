//! Domain types for posting legs against account titles.

use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Book-local account title identifier.
pub type AccountTitleId = i64;

/// The side on which an account's balance grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    /// Balance increases on debit, decreases on credit.
    Debit,
    /// Balance increases on credit, decreases on debit.
    Credit,
}

/// Account type code in `0..=3`.
///
/// Even codes are debit-normal and odd codes are credit-normal. The ledger
/// attaches no other meaning to the code; naming the categories is left to
/// the book's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AccountType(u8);

impl AccountType {
    /// Largest valid type code.
    pub const MAX: i32 = 3;

    /// Validates a raw type code.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAccountType` if `code` is outside `0..=3`.
    pub fn new(code: i32) -> Result<Self, LedgerError> {
        match u8::try_from(code) {
            Ok(value) if code <= Self::MAX => Ok(Self(value)),
            _ => Err(LedgerError::InvalidAccountType(code)),
        }
    }

    /// Returns the raw type code.
    #[must_use]
    pub fn code(self) -> i32 {
        i32::from(self.0)
    }

    /// Returns the side on which this account's balance grows.
    #[must_use]
    pub const fn normal_side(self) -> NormalSide {
        if self.0 % 2 == 0 {
            NormalSide::Debit
        } else {
            NormalSide::Credit
        }
    }
}

impl TryFrom<i32> for AccountType {
    type Error = LedgerError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<AccountType> for i32 {
    fn from(value: AccountType) -> Self {
        value.code()
    }
}

/// One debit or credit line of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// The account title this leg posts to.
    pub account_title_id: AccountTitleId,
    /// True for a debit, false for a credit.
    pub is_debit: bool,
    /// Amount in the smallest currency unit. Must be positive.
    pub amount: i64,
}

impl Leg {
    /// Creates a debit leg.
    #[must_use]
    pub const fn debit(account_title_id: AccountTitleId, amount: i64) -> Self {
        Self {
            account_title_id,
            is_debit: true,
            amount,
        }
    }

    /// Creates a credit leg.
    #[must_use]
    pub const fn credit(account_title_id: AccountTitleId, amount: i64) -> Self {
        Self {
            account_title_id,
            is_debit: false,
            amount,
        }
    }
}

/// Debit and credit totals of a set of legs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LegTotals {
    /// Sum of debit leg amounts.
    pub debit: i64,
    /// Sum of credit leg amounts.
    pub credit: i64,
    /// Number of debit legs.
    pub debit_count: usize,
    /// Number of credit legs.
    pub credit_count: usize,
}

impl LegTotals {
    /// Returns true when debits equal credits.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

/// How strictly a transaction's legs are checked before posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegPolicy {
    /// At least one debit and one credit, and Σdebit == Σcredit.
    #[default]
    Strict,
    /// Only non-empty legs with positive amounts.
    Permissive,
}

impl LegPolicy {
    /// Maps the `require_balanced_legs` switch to a policy.
    #[must_use]
    pub const fn from_require_balanced(require_balanced: bool) -> Self {
        if require_balanced {
            Self::Strict
        } else {
            Self::Permissive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, NormalSide::Debit)]
    #[case(1, NormalSide::Credit)]
    #[case(2, NormalSide::Debit)]
    #[case(3, NormalSide::Credit)]
    fn test_normal_side_by_parity(#[case] code: i32, #[case] side: NormalSide) {
        assert_eq!(AccountType::new(code).unwrap().normal_side(), side);
    }

    #[rstest]
    #[case(-1)]
    #[case(4)]
    #[case(i32::MAX)]
    fn test_out_of_range_type_rejected(#[case] code: i32) {
        assert_eq!(
            AccountType::new(code),
            Err(LedgerError::InvalidAccountType(code))
        );
    }

    #[test]
    fn test_account_type_serde_as_integer() {
        let ty: AccountType = serde_json::from_str("2").unwrap();
        assert_eq!(ty.code(), 2);
        assert_eq!(serde_json::to_string(&ty).unwrap(), "2");
        assert!(serde_json::from_str::<AccountType>("9").is_err());
    }

    #[test]
    fn test_policy_from_switch() {
        assert_eq!(LegPolicy::from_require_balanced(true), LegPolicy::Strict);
        assert_eq!(
            LegPolicy::from_require_balanced(false),
            LegPolicy::Permissive
        );
        assert_eq!(LegPolicy::default(), LegPolicy::Strict);
    }
}

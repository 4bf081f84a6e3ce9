//! Business rule validation for transaction legs.

use super::error::LedgerError;
use super::types::{Leg, LegPolicy, LegTotals};

/// Validates a set of legs under `policy` and returns their totals.
///
/// Both policies require at least one leg and strictly positive amounts.
/// `LegPolicy::Strict` additionally requires a debit leg, a credit leg, and
/// equal debit and credit totals.
///
/// # Errors
///
/// Returns the first rule the legs violate.
pub fn validate_legs(legs: &[Leg], policy: LegPolicy) -> Result<LegTotals, LedgerError> {
    if legs.is_empty() {
        return Err(LedgerError::NoLegs);
    }

    let mut totals = LegTotals::default();
    for leg in legs {
        if leg.amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(leg.amount));
        }

        if leg.is_debit {
            totals.debit = totals
                .debit
                .checked_add(leg.amount)
                .ok_or(LedgerError::AmountOverflow)?;
            totals.debit_count += 1;
        } else {
            totals.credit = totals
                .credit
                .checked_add(leg.amount)
                .ok_or(LedgerError::AmountOverflow)?;
            totals.credit_count += 1;
        }
    }

    if policy == LegPolicy::Permissive {
        return Ok(totals);
    }

    if totals.debit_count == 0 {
        return Err(LedgerError::MissingDebit);
    }
    if totals.credit_count == 0 {
        return Err(LedgerError::MissingCredit);
    }
    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedTransaction {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_legs_pass_strict() {
        let legs = [Leg::debit(1, 500), Leg::credit(2, 300), Leg::credit(3, 200)];
        let totals = validate_legs(&legs, LegPolicy::Strict).unwrap();
        assert_eq!(totals.debit, 500);
        assert_eq!(totals.credit, 500);
        assert_eq!(totals.debit_count, 1);
        assert_eq!(totals.credit_count, 2);
    }

    #[test]
    fn test_empty_legs_rejected_by_both_policies() {
        assert_eq!(validate_legs(&[], LegPolicy::Strict), Err(LedgerError::NoLegs));
        assert_eq!(
            validate_legs(&[], LegPolicy::Permissive),
            Err(LedgerError::NoLegs)
        );
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let legs = [Leg::debit(1, 0)];
        assert_eq!(
            validate_legs(&legs, LegPolicy::Permissive),
            Err(LedgerError::NonPositiveAmount(0))
        );

        let legs = [Leg::debit(1, 100), Leg::credit(2, -100)];
        assert_eq!(
            validate_legs(&legs, LegPolicy::Strict),
            Err(LedgerError::NonPositiveAmount(-100))
        );
    }

    #[test]
    fn test_single_sided_rejected_when_strict() {
        assert_eq!(
            validate_legs(&[Leg::credit(1, 100)], LegPolicy::Strict),
            Err(LedgerError::MissingDebit)
        );
        assert_eq!(
            validate_legs(&[Leg::debit(1, 100)], LegPolicy::Strict),
            Err(LedgerError::MissingCredit)
        );
    }

    #[test]
    fn test_single_leg_allowed_when_permissive() {
        let totals = validate_legs(&[Leg::debit(1, 500)], LegPolicy::Permissive).unwrap();
        assert_eq!(totals.debit, 500);
        assert!(!totals.is_balanced());
    }

    #[test]
    fn test_unbalanced_rejected_when_strict() {
        let legs = [Leg::debit(1, 500), Leg::credit(2, 200)];
        assert_eq!(
            validate_legs(&legs, LegPolicy::Strict),
            Err(LedgerError::UnbalancedTransaction {
                debit: 500,
                credit: 200,
            })
        );
        assert!(validate_legs(&legs, LegPolicy::Permissive).is_ok());
    }

    #[test]
    fn test_total_overflow_rejected() {
        let legs = [Leg::debit(1, i64::MAX), Leg::debit(2, 1)];
        assert_eq!(
            validate_legs(&legs, LegPolicy::Permissive),
            Err(LedgerError::AmountOverflow)
        );
    }
}

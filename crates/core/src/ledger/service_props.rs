//! Property-based tests for posting whole transactions.
//!
//! Balances are simulated in memory with the same sign rule the repository
//! applies under row locks.

use std::collections::HashMap;

use proptest::prelude::*;

use super::balance::{apply_leg, reverse_leg};
use super::types::{AccountTitleId, AccountType, Leg, LegPolicy, NormalSide};
use super::validation::validate_legs;

/// A tiny chart of accounts: ids 1..=4 with types 0..=3.
fn chart() -> HashMap<AccountTitleId, AccountType> {
    (0..=3)
        .map(|code| (i64::from(code) + 1, AccountType::new(code).unwrap()))
        .collect()
}

fn post(
    balances: &mut HashMap<AccountTitleId, i64>,
    chart: &HashMap<AccountTitleId, AccountType>,
    legs: &[Leg],
) {
    for leg in legs {
        let ty = chart[&leg.account_title_id];
        let entry = balances.entry(leg.account_title_id).or_insert(0);
        *entry = apply_leg(*entry, ty, leg).unwrap();
    }
}

fn unpost(
    balances: &mut HashMap<AccountTitleId, i64>,
    chart: &HashMap<AccountTitleId, AccountType>,
    legs: &[Leg],
) {
    for leg in legs {
        let ty = chart[&leg.account_title_id];
        let entry = balances.entry(leg.account_title_id).or_insert(0);
        *entry = reverse_leg(*entry, ty, leg).unwrap();
    }
}

/// Σ debit-normal balances minus Σ credit-normal balances.
fn weighted_sum(
    balances: &HashMap<AccountTitleId, i64>,
    chart: &HashMap<AccountTitleId, AccountType>,
) -> i64 {
    balances
        .iter()
        .map(|(id, amount)| match chart[id].normal_side() {
            NormalSide::Debit => *amount,
            NormalSide::Credit => -*amount,
        })
        .sum()
}

/// Strategy for a balanced transaction: debits split an amount, credits split the same amount.
fn balanced_legs() -> impl Strategy<Value = Vec<Leg>> {
    (
        prop::collection::vec((1i64..=4, 1i64..100_000), 1..4),
        prop::collection::vec(1i64..=4, 1..4),
    )
        .prop_map(|(debits, credit_accounts)| {
            let total: i64 = debits.iter().map(|(_, amount)| amount).sum();
            let mut legs: Vec<Leg> = debits
                .iter()
                .map(|(account, amount)| Leg::debit(*account, *amount))
                .collect();

            // Spread `total` over the credit accounts, remainder on the last one.
            let count = i64::try_from(credit_accounts.len()).unwrap();
            let share = total / count;
            let mut remaining = total;
            for (index, account) in credit_accounts.iter().enumerate() {
                let amount = if index + 1 == credit_accounts.len() {
                    remaining
                } else {
                    share
                };
                remaining -= amount;
                if amount > 0 {
                    legs.push(Leg::credit(*account, amount));
                }
            }
            legs
        })
}

fn any_legs() -> impl Strategy<Value = Vec<Leg>> {
    prop::collection::vec(
        (1i64..=4, any::<bool>(), 1i64..100_000).prop_map(|(account, is_debit, amount)| Leg {
            account_title_id: account,
            is_debit,
            amount,
        }),
        1..6,
    )
}

fn opening_balances() -> impl Strategy<Value = HashMap<AccountTitleId, i64>> {
    prop::collection::vec(-1_000_000i64..1_000_000, 4).prop_map(|amounts| {
        amounts
            .into_iter()
            .zip(1i64..)
            .map(|(amount, id)| (id, amount))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Posting balanced legs keeps Σ debit-normal - Σ credit-normal unchanged.
    #[test]
    fn prop_balanced_posting_conserves_weighted_sum(
        opening in opening_balances(),
        legs in balanced_legs(),
    ) {
        let chart = chart();
        prop_assert!(validate_legs(&legs, LegPolicy::Strict).is_ok());

        let mut balances = opening.clone();
        post(&mut balances, &chart, &legs);

        prop_assert_eq!(weighted_sum(&balances, &chart), weighted_sum(&opening, &chart));
    }

    /// Posting and then reversing any legs restores every balance.
    #[test]
    fn prop_post_then_reverse_is_identity(
        opening in opening_balances(),
        legs in any_legs(),
    ) {
        let chart = chart();
        let mut balances = opening.clone();
        post(&mut balances, &chart, &legs);
        unpost(&mut balances, &chart, &legs);

        prop_assert_eq!(balances, opening);
    }

    /// Updating a transaction to the same legs (reverse old, apply new) is a no-op.
    #[test]
    fn prop_update_with_same_legs_is_noop(
        opening in opening_balances(),
        legs in any_legs(),
    ) {
        let chart = chart();
        let mut balances = opening.clone();
        post(&mut balances, &chart, &legs);
        let after_create = balances.clone();

        unpost(&mut balances, &chart, &legs);
        post(&mut balances, &chart, &legs);

        prop_assert_eq!(balances, after_create);
    }

    /// Updating from legs A to legs B ends where posting only B would.
    #[test]
    fn prop_update_equals_direct_posting(
        opening in opening_balances(),
        old_legs in any_legs(),
        new_legs in any_legs(),
    ) {
        let chart = chart();

        let mut updated = opening.clone();
        post(&mut updated, &chart, &old_legs);
        unpost(&mut updated, &chart, &old_legs);
        post(&mut updated, &chart, &new_legs);

        let mut direct = opening.clone();
        post(&mut direct, &chart, &new_legs);

        prop_assert_eq!(updated, direct);
    }
}

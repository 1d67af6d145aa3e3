//! Admission selection and settlement math.
//!
//! Pure functions over a snapshot of registration state, kept separate from
//! the state-mutating commit step so the admission policy is unit-testable
//! without ledger side effects. Ordering is explicit: invited registrants
//! occupy slots first, remaining capacity fills by descending deposit, and
//! ties break by earlier registration order. Nothing here depends on the
//! iteration order of any unordered structure.

use crate::types::{AccountId, Money};
use std::cmp::Reverse;

/// One active registrant as seen by the admission algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrantSnapshot {
    /// Registrant identity
    pub account: AccountId,
    /// Custodied deposit
    pub deposit: Money,
    /// Position in registration order (earlier wins ties)
    pub order: usize,
    /// Whether the owner pre-approved this identity
    pub invited: bool,
}

/// Outcome of the admission algorithm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Identities awarded a slot, invited first then by descending deposit
    pub approved: Vec<AccountId>,
    /// Active identities left without a slot
    pub rejected: Vec<AccountId>,
    /// Sum of approved deposits, consumed by settlement
    pub gross: Money,
}

/// Selects at most `capacity` approved registrants from the snapshot.
///
/// Invited identities are approved first regardless of deposit size; the
/// remaining capacity fills from the non-invited registrants sorted by
/// deposit descending, ties broken by registration order.
#[must_use]
pub fn select_approved(snapshot: &[RegistrantSnapshot], capacity: usize) -> SelectionOutcome {
    let mut invited: Vec<&RegistrantSnapshot> = Vec::new();
    let mut others: Vec<&RegistrantSnapshot> = Vec::new();
    for registrant in snapshot {
        if registrant.invited {
            invited.push(registrant);
        } else {
            others.push(registrant);
        }
    }

    invited.sort_by_key(|r| r.order);
    others.sort_by_key(|r| (Reverse(r.deposit), r.order));

    let mut approved = Vec::with_capacity(capacity.min(snapshot.len()));
    let mut rejected = Vec::new();
    let mut gross = Money::ZERO;

    for registrant in invited.iter().chain(others.iter()) {
        if approved.len() < capacity {
            approved.push(registrant.account);
            gross = gross.add(registrant.deposit);
        } else {
            rejected.push(registrant.account);
        }
    }

    SelectionOutcome {
        approved,
        rejected,
        gross,
    }
}

/// A settlement amount split between the paid party and the owner fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    /// Amount retained by the settled party (99% by integer division)
    pub net: Money,
    /// Owner's fee share (1% by integer division)
    pub fee: Money,
}

/// Splits `amount` into the owner's 1% fee and the remaining net.
///
/// The fee is `amount / 100` and the net is the exact remainder, so
/// `net + fee == amount` always holds and settlement conserves custody
/// under integer division.
#[must_use]
pub const fn fee_split(amount: Money) -> FeeSplit {
    let fee = Money::from_units(amount.units() / 100);
    FeeSplit {
        net: Money::from_units(amount.units() - fee.units()),
        fee,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(AccountId, u64, bool)]) -> Vec<RegistrantSnapshot> {
        entries
            .iter()
            .enumerate()
            .map(|(order, &(account, deposit, invited))| RegistrantSnapshot {
                account,
                deposit: Money::from_units(deposit),
                order,
                invited,
            })
            .collect()
    }

    #[test]
    fn test_highest_deposits_win() {
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());
        let outcome = select_approved(&snapshot(&[(a, 1, false), (b, 2, false), (c, 3, false)]), 2);

        assert_eq!(outcome.approved, vec![c, b]);
        assert_eq!(outcome.rejected, vec![a]);
        assert_eq!(outcome.gross, Money::from_units(5));
    }

    #[test]
    fn test_invited_displace_lowest_bid() {
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());
        let outcome = select_approved(&snapshot(&[(a, 1, true), (b, 2, false), (c, 3, false)]), 2);

        assert_eq!(outcome.approved, vec![a, c]);
        assert_eq!(outcome.rejected, vec![b]);
        assert_eq!(outcome.gross, Money::from_units(4));
    }

    #[test]
    fn test_ties_break_by_registration_order() {
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());
        let outcome = select_approved(&snapshot(&[(a, 2, false), (b, 2, false), (c, 2, false)]), 2);

        assert_eq!(outcome.approved, vec![a, b]);
        assert_eq!(outcome.rejected, vec![c]);
    }

    #[test]
    fn test_under_capacity_approves_everyone() {
        let (a, b) = (AccountId::new(), AccountId::new());
        let outcome = select_approved(&snapshot(&[(a, 5, false), (b, 7, false)]), 4);

        assert_eq!(outcome.approved.len(), 2);
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.gross, Money::from_units(12));
    }

    #[test]
    fn test_empty_snapshot() {
        let outcome = select_approved(&[], 3);
        assert!(outcome.approved.is_empty());
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.gross, Money::ZERO);
    }

    #[test]
    fn test_fee_split_conserves_amount() {
        let split = fee_split(Money::from_units(50_000_000));
        assert_eq!(split.fee, Money::from_units(500_000));
        assert_eq!(split.net, Money::from_units(49_500_000));

        // Amounts not divisible by 100 still conserve exactly.
        let odd = fee_split(Money::from_units(101));
        assert_eq!(odd.fee, Money::from_units(1));
        assert_eq!(odd.net, Money::from_units(100));
        assert_eq!(odd.net.add(odd.fee), Money::from_units(101));

        let tiny = fee_split(Money::from_units(99));
        assert_eq!(tiny.fee, Money::ZERO);
        assert_eq!(tiny.net, Money::from_units(99));
    }
}

//! Deterministic clock and ledger doubles.

use chrono::{DateTime, Duration, Utc};
use eventeth_core::environment::{Clock, Ledger, LedgerError, Payout};
use eventeth_core::types::{AccountId, Money};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Manually driven clock for deterministic phase gating.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jumps the clock to `instant`
    pub fn set(&self, instant: DateTime<Utc>) {
        *lock_unpoisoned(&self.now) = instant;
    }

    /// Moves the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = lock_unpoisoned(&self.now);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock_unpoisoned(&self.now)
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    balances: HashMap<AccountId, Money>,
    rejecting: HashSet<AccountId>,
    transfers: Vec<Payout>,
}

/// In-memory ledger that records every outgoing payout.
///
/// Recipients can be marked as rejecting to exercise rollback paths; batch
/// application checks every recipient before crediting any of them, per the
/// [`Ledger::transfer_batch`] all-or-nothing contract.
#[derive(Clone, Debug, Default)]
pub struct RecordingLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl RecordingLedger {
    /// Creates an empty ledger accepting all recipients
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `account` as rejecting any incoming transfer
    pub fn reject(&self, account: AccountId) {
        lock_unpoisoned(&self.inner).rejecting.insert(account);
    }

    /// Clears a rejection mark
    pub fn accept(&self, account: AccountId) {
        lock_unpoisoned(&self.inner).rejecting.remove(&account);
    }

    /// Total amount credited to `account` so far
    #[must_use]
    pub fn balance_of(&self, account: AccountId) -> Money {
        lock_unpoisoned(&self.inner)
            .balances
            .get(&account)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// Every payout applied, in order
    #[must_use]
    pub fn transfers(&self) -> Vec<Payout> {
        lock_unpoisoned(&self.inner).transfers.clone()
    }

    /// Sum of all payouts applied
    #[must_use]
    pub fn total_paid(&self) -> Money {
        lock_unpoisoned(&self.inner)
            .transfers
            .iter()
            .fold(Money::ZERO, |sum, payout| sum.add(payout.amount))
    }
}

impl Ledger for RecordingLedger {
    fn transfer(&self, to: AccountId, amount: Money) -> Result<(), LedgerError> {
        self.transfer_batch(&[Payout { to, amount }])
    }

    fn transfer_batch(&self, payouts: &[Payout]) -> Result<(), LedgerError> {
        let mut guard = lock_unpoisoned(&self.inner);
        let inner = &mut *guard;
        // Validate every recipient before crediting any of them.
        for payout in payouts {
            if inner.rejecting.contains(&payout.to) {
                return Err(LedgerError::TransferRejected {
                    recipient: payout.to,
                });
            }
        }
        for payout in payouts {
            let balance = inner.balances.entry(payout.to).or_insert(Money::ZERO);
            *balance = balance.add(payout.amount);
            inner.transfers.push(*payout);
        }
        Ok(())
    }
}

/// A poisoned mutex only means another test thread panicked mid-assertion;
/// the guarded data is still usable here.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::hours(3));
        assert_eq!(clock.now(), start + Duration::hours(3));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_ledger_records_and_sums() {
        let ledger = RecordingLedger::new();
        let account = AccountId::new();

        ledger.transfer(account, Money::from_units(30)).unwrap();
        ledger.transfer(account, Money::from_units(12)).unwrap();

        assert_eq!(ledger.balance_of(account), Money::from_units(42));
        assert_eq!(ledger.total_paid(), Money::from_units(42));
        assert_eq!(ledger.transfers().len(), 2);
    }

    #[test]
    fn test_rejected_batch_credits_nobody() {
        let ledger = RecordingLedger::new();
        let good = AccountId::new();
        let bad = AccountId::new();
        ledger.reject(bad);

        let result = ledger.transfer_batch(&[
            Payout {
                to: good,
                amount: Money::from_units(99),
            },
            Payout {
                to: bad,
                amount: Money::from_units(1),
            },
        ]);

        assert_eq!(
            result,
            Err(LedgerError::TransferRejected { recipient: bad })
        );
        assert_eq!(ledger.balance_of(good), Money::ZERO);
        assert!(ledger.transfers().is_empty());

        ledger.accept(bad);
        ledger.transfer(bad, Money::from_units(1)).unwrap();
        assert_eq!(ledger.balance_of(bad), Money::from_units(1));
    }
}

//! Contract fixture with standard accounts and a two-day window.
//!
//! Mirrors the setup of the original event scenarios: the clock starts in
//! the middle of the registration window, the minimum guarantee is one
//! deposit unit, and deposits are expressed as multiples of that unit.

use crate::mocks::{ManualClock, RecordingLedger};
use chrono::{Duration, Utc};
use eventeth_core::environment::Environment;
use eventeth_core::error::EventethError;
use eventeth_core::event::EventContract;
use eventeth_core::types::{AccountId, EventParams, Money, RegistrationWindow};
use std::sync::Arc;

/// One deposit unit, in smallest settlement units.
///
/// Divisible by 100 so the 99%/1% settlement split is exact in scenarios.
pub const DEPOSIT_UNIT: u64 = 10_000_000_000_000_000;

/// A contract under test, wired to a manual clock and a recording ledger.
pub struct EventFixture {
    /// Clock shared with the contract, frozen mid-window
    pub clock: ManualClock,
    /// Ledger shared with the contract
    pub ledger: RecordingLedger,
    /// Organizer of the event
    pub organizer: AccountId,
    /// Fee-recipient owner of the event
    pub owner: AccountId,
    /// The contract itself
    pub contract: EventContract,
}

impl EventFixture {
    /// Builds a fixture with the given capacity; the registration window
    /// spans one day either side of the current clock.
    ///
    /// # Panics
    ///
    /// Panics if the standard parameters fail validation, which would be a
    /// bug in the fixture itself.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_capacity(capacity: usize) -> Self {
        let now = Utc::now();
        let clock = ManualClock::new(now);
        let ledger = RecordingLedger::new();
        let organizer = AccountId::new();
        let owner = AccountId::new();

        let params = EventParams {
            organizer,
            owner,
            name: "test".to_string(),
            window: RegistrationWindow::new(now - Duration::days(1), now + Duration::days(1)),
            minimum_guarantee: Money::from_units(DEPOSIT_UNIT),
            capacity,
        };
        let env = Environment::new(Arc::new(clock.clone()), Arc::new(ledger.clone()));
        let contract = EventContract::new(params, env).expect("fixture params are valid");

        Self {
            clock,
            ledger,
            organizer,
            owner,
            contract,
        }
    }

    /// The original scenarios' default: capacity 2
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(2)
    }

    /// Registers `account` with a deposit of `units` deposit units.
    ///
    /// # Errors
    ///
    /// Propagates whatever the contract rejects the registration with.
    pub fn register(
        &mut self,
        account: AccountId,
        name: &str,
        units: u64,
    ) -> Result<(), EventethError> {
        self.contract
            .register(account, name, Money::from_units(units * DEPOSIT_UNIT))
    }

    /// Advances the clock just past the end of the registration window
    pub fn close_registration(&self) {
        self.clock.advance(Duration::days(1) + Duration::seconds(1));
    }

    /// Closes registration and runs the reveal.
    ///
    /// # Errors
    ///
    /// Propagates whatever the contract rejects the reveal with.
    pub fn reveal(&mut self) -> Result<(), EventethError> {
        self.close_registration();
        self.contract.reveal_approved()
    }

    /// Convenience: `units` deposit units as [`Money`]
    #[must_use]
    pub const fn units(units: u64) -> Money {
        Money::from_units(units * DEPOSIT_UNIT)
    }
}

impl Default for EventFixture {
    fn default() -> Self {
        Self::new()
    }
}

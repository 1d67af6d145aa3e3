//! The event contract state machine.
//!
//! One [`EventContract`] custodies deposits for a single event, runs the
//! one-shot admission reveal, settles the approved deposits to the organizer
//! and owner, operates the secondary slot market, and keeps the pull-refund
//! ledger. Every mutating method performs all precondition checks and all
//! outgoing ledger transfers *before* the first state write, so a rejected
//! call or a failed transfer leaves state and custody untouched.
//!
//! Registrations live in an arena in registration order with an identity
//! side index, so admission ordering is deterministic and independent of
//! hash iteration.

use crate::environment::{Environment, Payout, PayoutBatch};
use crate::error::EventethError;
use crate::selection::{fee_split, select_approved, RegistrantSnapshot};
use crate::types::{AccountId, EventParams, Money, Registration};
use std::collections::HashMap;

/// One arena slot: the registrant identity plus their record.
#[derive(Clone, Debug)]
struct Entry {
    account: AccountId,
    registration: Registration,
}

/// Registration/escrow contract for a single event.
pub struct EventContract {
    params: EventParams,
    env: Environment,
    canceled: bool,
    revealed: bool,
    /// Identities pre-approved by the owner, in invitation order,
    /// never longer than `params.capacity`
    invited: Vec<AccountId>,
    /// Registrations in registration order
    entries: Vec<Entry>,
    /// Identity to arena slot
    index: HashMap<AccountId, usize>,
    /// Total value currently custodied by the contract
    custody: Money,
}

impl EventContract {
    /// Creates a new event contract.
    ///
    /// # Errors
    ///
    /// Returns [`EventethError::InvalidParams`] if the registration window
    /// is empty or inverted, or if the capacity is zero.
    pub fn new(params: EventParams, env: Environment) -> Result<Self, EventethError> {
        params.validate()?;
        Ok(Self {
            params,
            env,
            canceled: false,
            revealed: false,
            invited: Vec::new(),
            entries: Vec::new(),
            index: HashMap::new(),
            custody: Money::ZERO,
        })
    }

    // ========================================================================
    // Constructor accessors
    // ========================================================================

    /// The organizer identity
    #[must_use]
    pub const fn organizer(&self) -> AccountId {
        self.params.organizer
    }

    /// The fee-recipient owner identity
    #[must_use]
    pub const fn owner(&self) -> AccountId {
        self.params.owner
    }

    /// The event name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Minimum deposit accepted per registration
    #[must_use]
    pub const fn minimum_guarantee(&self) -> Money {
        self.params.minimum_guarantee
    }

    /// Maximum number of approved slots
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.params.capacity
    }

    /// Whether the organizer canceled the event
    #[must_use]
    pub const fn canceled(&self) -> bool {
        self.canceled
    }

    /// Whether the approval reveal has run
    #[must_use]
    pub const fn revealed(&self) -> bool {
        self.revealed
    }

    /// Total value currently custodied by the contract
    #[must_use]
    pub const fn custody(&self) -> Money {
        self.custody
    }

    // ========================================================================
    // Registration phase
    // ========================================================================

    /// Registers the caller with the attached `amount` as deposit.
    ///
    /// Re-registering replaces the prior registration: the old deposit is
    /// refunded through the ledger before the new amount is recorded, and the
    /// entry keeps its original registration order.
    ///
    /// # Errors
    ///
    /// [`EventethError::Canceled`] once the event is canceled,
    /// [`EventethError::RegistrationClosed`] outside the registration window,
    /// [`EventethError::InsufficientDeposit`] below the minimum guarantee,
    /// [`EventethError::CustodyOverflow`] if accepting the amount would
    /// overflow the custody accounting,
    /// and any ledger failure from refunding a replaced deposit.
    pub fn register(
        &mut self,
        caller: AccountId,
        name: &str,
        amount: Money,
    ) -> Result<(), EventethError> {
        if self.canceled {
            return Err(EventethError::Canceled);
        }
        let now = self.env.clock.now();
        if !self.params.window.contains(now) {
            return Err(EventethError::RegistrationClosed);
        }
        if amount < self.params.minimum_guarantee {
            return Err(EventethError::InsufficientDeposit {
                minimum: self.params.minimum_guarantee,
                offered: amount,
            });
        }

        // Any replaced deposit leaves custody before the new amount enters;
        // the resulting custody must fit before anything is written or paid.
        let replaced = self.index.get(&caller).map_or(Money::ZERO, |&slot| {
            let registration = &self.entries[slot].registration;
            if registration.active {
                registration.deposit
            } else {
                Money::ZERO
            }
        });
        let custody = self
            .custody
            .sub(replaced)
            .checked_add(amount)
            .ok_or(EventethError::CustodyOverflow)?;

        if let Some(&slot) = self.index.get(&caller) {
            // Replace semantics: push the old deposit back first.
            if !replaced.is_zero() {
                self.env.ledger.transfer(caller, replaced)?;
            }
            let registration = &mut self.entries[slot].registration;
            registration.name = name.to_string();
            registration.deposit = amount;
            registration.active = true;
            registration.approved = false;
            registration.transferring = false;
        } else {
            self.index.insert(caller, self.entries.len());
            self.entries.push(Entry {
                account: caller,
                registration: Registration::new(name.to_string(), amount),
            });
        }
        self.custody = custody;

        tracing::info!(account = %caller, amount = %amount, "registration recorded");
        self.debug_check_conservation();
        Ok(())
    }

    /// Deregisters the caller and pushes the full deposit back immediately.
    ///
    /// # Errors
    ///
    /// [`EventethError::Canceled`] once the event is canceled,
    /// [`EventethError::AlreadyRevealed`] after the reveal,
    /// [`EventethError::NotRegistered`] without an active registration,
    /// and any ledger failure from the refund.
    pub fn deregister(&mut self, caller: AccountId) -> Result<(), EventethError> {
        if self.canceled {
            return Err(EventethError::Canceled);
        }
        if self.revealed {
            return Err(EventethError::AlreadyRevealed);
        }
        let Some(&slot) = self.index.get(&caller) else {
            return Err(EventethError::NotRegistered);
        };
        if !self.entries[slot].registration.active {
            return Err(EventethError::NotRegistered);
        }

        let deposit = self.entries[slot].registration.deposit;
        self.env.ledger.transfer(caller, deposit)?;

        self.custody = self.custody.sub(deposit);
        let registration = &mut self.entries[slot].registration;
        registration.deposit = Money::ZERO;
        registration.active = false;

        tracing::info!(account = %caller, amount = %deposit, "registration withdrawn");
        self.debug_check_conservation();
        Ok(())
    }

    /// Whether `who` currently holds an active registration
    #[must_use]
    pub fn check_registered(&self, who: AccountId) -> bool {
        self.registration(who).is_some_and(|r| r.active)
    }

    // ========================================================================
    // Reveal / admission
    // ========================================================================

    /// Adds identities to the invited set, bypassing deposit ranking.
    ///
    /// Identities already invited, and duplicates within the batch, are
    /// ignored rather than counted twice.
    ///
    /// # Errors
    ///
    /// [`EventethError::Unauthorized`] unless the caller is the owner,
    /// [`EventethError::AlreadyRevealed`] after the reveal, and
    /// [`EventethError::CapacityExceeded`] if the batch would push the
    /// invited set past capacity.
    pub fn invitation_by_owner(
        &mut self,
        caller: AccountId,
        accounts: &[AccountId],
    ) -> Result<(), EventethError> {
        if caller != self.params.owner {
            return Err(EventethError::Unauthorized);
        }
        if self.revealed {
            return Err(EventethError::AlreadyRevealed);
        }

        let mut additions: Vec<AccountId> = Vec::new();
        for account in accounts {
            if !self.invited.contains(account) && !additions.contains(account) {
                additions.push(*account);
            }
        }
        if self.invited.len() + additions.len() > self.params.capacity {
            return Err(EventethError::CapacityExceeded {
                capacity: self.params.capacity,
            });
        }

        tracing::info!(count = additions.len(), "invitations added");
        self.invited.extend(additions);
        Ok(())
    }

    /// Runs the one-shot admission reveal and settles the approved deposits.
    ///
    /// Callable by anyone once the registration window has closed. Selection
    /// is pure: invited registrants first, then descending deposit with ties
    /// broken by registration order. The gross of the approved deposits is
    /// paid out atomically (1% fee to the owner, the remainder to the
    /// organizer) before any state is committed; rejected registrants get
    /// their deposit moved to the pull-refund ledger, fee-free.
    ///
    /// # Errors
    ///
    /// [`EventethError::Canceled`] once the event is canceled,
    /// [`EventethError::AlreadyRevealed`] on a second call,
    /// [`EventethError::TooEarly`] before the window closes, and any ledger
    /// failure from the settlement payouts (in which case nothing is
    /// revealed).
    pub fn reveal_approved(&mut self) -> Result<(), EventethError> {
        if self.canceled {
            return Err(EventethError::Canceled);
        }
        if self.revealed {
            return Err(EventethError::AlreadyRevealed);
        }
        let now = self.env.clock.now();
        if !self.params.window.closed(now) {
            return Err(EventethError::TooEarly);
        }

        let snapshot: Vec<RegistrantSnapshot> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.registration.active)
            .map(|(order, entry)| RegistrantSnapshot {
                account: entry.account,
                deposit: entry.registration.deposit,
                order,
                invited: self.invited.contains(&entry.account),
            })
            .collect();
        let outcome = select_approved(&snapshot, self.params.capacity);
        let split = fee_split(outcome.gross);

        let mut payouts = PayoutBatch::new();
        if !split.net.is_zero() {
            payouts.push(Payout {
                to: self.params.organizer,
                amount: split.net,
            });
        }
        if !split.fee.is_zero() {
            payouts.push(Payout {
                to: self.params.owner,
                amount: split.fee,
            });
        }
        self.env.ledger.transfer_batch(&payouts)?;

        for account in &outcome.approved {
            if let Some(&slot) = self.index.get(account) {
                let registration = &mut self.entries[slot].registration;
                registration.approved = true;
                // The deposit becomes the admission price: settled out of
                // custody, retained as the slot's resale price record.
                registration.admission_price = registration.deposit;
                self.custody = self.custody.sub(registration.deposit);
                registration.deposit = Money::ZERO;
            }
        }
        for account in &outcome.rejected {
            if let Some(&slot) = self.index.get(account) {
                let registration = &mut self.entries[slot].registration;
                // Refunds only accrue at the one-shot reveal or at
                // cancellation, and a canceled event never reveals, so the
                // balance here is still zero.
                registration.refundable = registration.deposit;
                registration.deposit = Money::ZERO;
            }
        }
        self.revealed = true;

        tracing::info!(
            approved = outcome.approved.len(),
            rejected = outcome.rejected.len(),
            gross = %outcome.gross,
            organizer_share = %split.net,
            owner_share = %split.fee,
            "approvals revealed and settled"
        );
        self.debug_check_conservation();
        Ok(())
    }

    /// Whether `who` holds an approved slot. Always false before the reveal
    /// and always false once the event is canceled.
    #[must_use]
    pub fn registration_approved(&self, who: AccountId) -> bool {
        !self.canceled && self.registration(who).is_some_and(|r| r.approved)
    }

    // ========================================================================
    // Transfer delegation
    // ========================================================================

    /// Offers the caller's approved slot for delegation.
    ///
    /// The slot is provisionally un-approved while offered; the caller keeps
    /// their claim until the slot is acquired or the offer is canceled.
    ///
    /// # Errors
    ///
    /// [`EventethError::Canceled`] once the event is canceled,
    /// [`EventethError::AlreadyTransferring`] if the slot is already offered,
    /// and [`EventethError::NotApproved`] without an approved slot.
    pub fn request_registration_transfer(
        &mut self,
        caller: AccountId,
    ) -> Result<(), EventethError> {
        if self.canceled {
            return Err(EventethError::Canceled);
        }
        let Some(&slot) = self.index.get(&caller) else {
            return Err(EventethError::NotApproved);
        };
        let registration = &mut self.entries[slot].registration;
        if registration.transferring {
            return Err(EventethError::AlreadyTransferring);
        }
        if !registration.approved {
            return Err(EventethError::NotApproved);
        }

        registration.approved = false;
        registration.transferring = true;
        tracing::info!(account = %caller, "registration transfer requested");
        Ok(())
    }

    /// Acquires an offered slot at its recorded admission price.
    ///
    /// The caller attaches `amount`, which must equal the slot's admission
    /// price; `name` double-checks the record against acquiring the wrong
    /// slot. On success the original registrant is paid 99% of the amount,
    /// the owner 1%, atomically, the original registration is settled, and
    /// the caller holds the approved slot.
    ///
    /// # Errors
    ///
    /// [`EventethError::Canceled`] once the event is canceled,
    /// [`EventethError::NotTransferring`] if the slot is not offered,
    /// [`EventethError::NameMismatch`] / [`EventethError::AmountMismatch`]
    /// on a record mismatch, and any ledger failure from the payout (in
    /// which case nothing changes hands).
    pub fn acquire_registration_transfer(
        &mut self,
        caller: AccountId,
        original: AccountId,
        name: &str,
        amount: Money,
    ) -> Result<(), EventethError> {
        if self.canceled {
            return Err(EventethError::Canceled);
        }
        let Some(&original_slot) = self.index.get(&original) else {
            return Err(EventethError::NotTransferring);
        };
        {
            let record = &self.entries[original_slot].registration;
            if !record.transferring {
                return Err(EventethError::NotTransferring);
            }
            if record.name != name {
                return Err(EventethError::NameMismatch);
            }
            if record.admission_price != amount {
                return Err(EventethError::AmountMismatch {
                    expected: record.admission_price,
                    offered: amount,
                });
            }
        }

        // The attached amount enters custody and leaves it in full within
        // this call, so custody is unchanged on success.
        let split = fee_split(amount);
        let mut payouts = PayoutBatch::new();
        if !split.net.is_zero() {
            payouts.push(Payout {
                to: original,
                amount: split.net,
            });
        }
        if !split.fee.is_zero() {
            payouts.push(Payout {
                to: self.params.owner,
                amount: split.fee,
            });
        }
        self.env.ledger.transfer_batch(&payouts)?;

        {
            let record = &mut self.entries[original_slot].registration;
            record.transferring = false;
            record.active = record.has_claim();
        }
        if let Some(slot) = self.index.get(&caller).copied() {
            let registration = &mut self.entries[slot].registration;
            registration.name = name.to_string();
            registration.approved = true;
            registration.transferring = false;
            registration.admission_price = amount;
            registration.active = true;
        } else {
            let mut registration = Registration::new(name.to_string(), Money::ZERO);
            registration.approved = true;
            registration.admission_price = amount;
            self.index.insert(caller, self.entries.len());
            self.entries.push(Entry {
                account: caller,
                registration,
            });
        }

        tracing::info!(
            from = %original,
            to = %caller,
            amount = %amount,
            "registration transfer acquired"
        );
        self.debug_check_conservation();
        Ok(())
    }

    /// Withdraws the caller's transfer offer, restoring the approved slot.
    ///
    /// # Errors
    ///
    /// [`EventethError::NotTransferring`] if the caller has no offer open,
    /// including on a second cancellation.
    pub fn cancel_registration_transfer(
        &mut self,
        caller: AccountId,
    ) -> Result<(), EventethError> {
        let slot = self
            .index
            .get(&caller)
            .copied()
            .filter(|&slot| self.entries[slot].registration.transferring)
            .ok_or(EventethError::NotTransferring)?;

        let registration = &mut self.entries[slot].registration;
        registration.transferring = false;
        registration.approved = true;
        tracing::info!(account = %caller, "registration transfer canceled");
        Ok(())
    }

    /// Whether `who` currently offers their slot for delegation
    #[must_use]
    pub fn check_registration_transferring(&self, who: AccountId) -> bool {
        self.registration(who).is_some_and(|r| r.transferring)
    }

    // ========================================================================
    // Cancellation & refunds
    // ========================================================================

    /// Cancels the event. Every active deposit becomes fully refundable,
    /// fee-free, via pull-withdrawal; no settlement occurs.
    ///
    /// Cancellation is a pre-reveal alternative to settlement: once the
    /// approved deposits have been paid out there is nothing left to hand
    /// back, so a revealed event can no longer be canceled.
    ///
    /// # Errors
    ///
    /// [`EventethError::Unauthorized`] unless the caller is the organizer,
    /// [`EventethError::Canceled`] if already canceled,
    /// [`EventethError::AlreadyRevealed`] after the reveal has settled.
    pub fn cancel_event(&mut self, caller: AccountId) -> Result<(), EventethError> {
        if caller != self.params.organizer {
            return Err(EventethError::Unauthorized);
        }
        if self.canceled {
            return Err(EventethError::Canceled);
        }
        if self.revealed {
            return Err(EventethError::AlreadyRevealed);
        }

        self.canceled = true;
        for entry in &mut self.entries {
            let registration = &mut entry.registration;
            if registration.active && !registration.deposit.is_zero() {
                // Pre-reveal, so no refund balance has accrued yet.
                registration.refundable = registration.deposit;
                registration.deposit = Money::ZERO;
            }
        }

        tracing::info!(event = %self.params.name, "event canceled");
        self.debug_check_conservation();
        Ok(())
    }

    /// Current refundable balance owed to `who` (zero if none)
    #[must_use]
    pub fn check_refund(&self, who: AccountId) -> Money {
        self.registration(who)
            .map_or(Money::ZERO, |r| r.refundable)
    }

    /// Pays out the caller's refundable balance and resets it to zero.
    ///
    /// A second call finds nothing left to refund, so a payout can never be
    /// claimed twice.
    ///
    /// # Errors
    ///
    /// [`EventethError::NothingToRefund`] on a zero balance, and any ledger
    /// failure from the payout (the balance then remains claimable).
    pub fn withdrawal_refund(&mut self, caller: AccountId) -> Result<(), EventethError> {
        let Some(&slot) = self.index.get(&caller) else {
            return Err(EventethError::NothingToRefund);
        };
        let amount = self.entries[slot].registration.refundable;
        if amount.is_zero() {
            return Err(EventethError::NothingToRefund);
        }

        self.env.ledger.transfer(caller, amount)?;

        self.custody = self.custody.sub(amount);
        let registration = &mut self.entries[slot].registration;
        registration.refundable = Money::ZERO;
        registration.active = registration.has_claim();

        tracing::info!(account = %caller, amount = %amount, "refund withdrawn");
        self.debug_check_conservation();
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn registration(&self, who: AccountId) -> Option<&Registration> {
        self.index
            .get(&who)
            .map(|&slot| &self.entries[slot].registration)
    }

    /// Custody conservation: everything the contract holds is attributed to
    /// a live deposit or a pending refund.
    fn debug_check_conservation(&self) {
        if cfg!(debug_assertions) {
            let attributed = self.entries.iter().fold(Money::ZERO, |sum, entry| {
                sum.add(entry.registration.deposit)
                    .add(entry.registration.refundable)
            });
            debug_assert_eq!(self.custody, attributed, "custody conservation violated");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    // Import the contract types through `eventeth_testing`'s re-export so
    // they unify with the separately compiled `eventeth-core` lib that the
    // fixture links against (the `cfg(test)` build is a distinct crate).
    use eventeth_testing::eventeth_core::error::EventethError;
    use eventeth_testing::eventeth_core::types::{AccountId, Money};
    use eventeth_testing::{EventFixture, DEPOSIT_UNIT};

    #[test]
    fn test_constructor_accessors() {
        let fixture = EventFixture::new();
        assert_eq!(fixture.contract.organizer(), fixture.organizer);
        assert_eq!(fixture.contract.owner(), fixture.owner);
        assert_eq!(fixture.contract.name(), "test");
        assert_eq!(
            fixture.contract.minimum_guarantee(),
            Money::from_units(DEPOSIT_UNIT)
        );
        assert_eq!(fixture.contract.capacity(), 2);
        assert!(!fixture.contract.canceled());
        assert!(!fixture.contract.revealed());
        assert_eq!(fixture.contract.custody(), Money::ZERO);
    }

    #[test]
    fn test_register_below_minimum_rejected() {
        let mut fixture = EventFixture::new();
        let account = AccountId::new();

        let result =
            fixture
                .contract
                .register(account, "alice", Money::from_units(DEPOSIT_UNIT - 1));
        assert!(matches!(
            result,
            Err(EventethError::InsufficientDeposit { .. })
        ));
        assert!(!fixture.contract.check_registered(account));
    }

    #[test]
    fn test_register_outside_window_rejected() {
        let mut fixture = EventFixture::new();
        let account = AccountId::new();

        fixture.close_registration();
        assert_eq!(
            fixture.register(account, "alice", 1),
            Err(EventethError::RegistrationClosed)
        );
    }

    #[test]
    fn test_reregistration_refunds_prior_deposit() {
        let mut fixture = EventFixture::new();
        let account = AccountId::new();

        fixture.register(account, "alice", 1).unwrap();
        fixture.register(account, "alice-again", 10).unwrap();

        assert!(fixture.contract.check_registered(account));
        // Old deposit went back through the ledger; only the latest is held.
        assert_eq!(fixture.ledger.balance_of(account), EventFixture::units(1));
        assert_eq!(fixture.contract.custody(), EventFixture::units(10));
    }

    #[test]
    fn test_register_rejects_custody_overflow() {
        let mut fixture = EventFixture::new();
        let (a, b) = (AccountId::new(), AccountId::new());

        fixture
            .contract
            .register(a, "whale", Money::from_units(u64::MAX))
            .unwrap();
        assert_eq!(fixture.contract.custody(), Money::from_units(u64::MAX));

        // A second deposit cannot fit; the call errors cleanly with the
        // first registration and custody untouched.
        assert_eq!(
            fixture.register(b, "minnow", 1),
            Err(EventethError::CustodyOverflow)
        );
        assert!(fixture.contract.check_registered(a));
        assert!(!fixture.contract.check_registered(b));
        assert_eq!(fixture.contract.custody(), Money::from_units(u64::MAX));

        // Replacing the oversized deposit frees the headroom again.
        fixture.register(a, "whale", 1).unwrap();
        assert_eq!(fixture.ledger.balance_of(a), Money::from_units(u64::MAX));
        fixture.register(b, "minnow", 1).unwrap();
        assert_eq!(fixture.contract.custody(), EventFixture::units(2));
    }

    #[test]
    fn test_deregister_requires_active_registration() {
        let mut fixture = EventFixture::new();
        let account = AccountId::new();

        assert_eq!(
            fixture.contract.deregister(account),
            Err(EventethError::NotRegistered)
        );

        fixture.register(account, "alice", 1).unwrap();
        fixture.contract.deregister(account).unwrap();
        assert!(!fixture.contract.check_registered(account));
        assert_eq!(fixture.ledger.balance_of(account), EventFixture::units(1));
        assert_eq!(fixture.contract.custody(), Money::ZERO);

        // A second deregistration finds nothing.
        assert_eq!(
            fixture.contract.deregister(account),
            Err(EventethError::NotRegistered)
        );
    }

    #[test]
    fn test_deregister_blocked_after_reveal() {
        let mut fixture = EventFixture::new();
        let account = AccountId::new();

        fixture.register(account, "alice", 1).unwrap();
        fixture.reveal().unwrap();
        assert_eq!(
            fixture.contract.deregister(account),
            Err(EventethError::AlreadyRevealed)
        );
    }

    #[test]
    fn test_reveal_too_early_and_only_once() {
        let mut fixture = EventFixture::new();
        assert_eq!(
            fixture.contract.reveal_approved(),
            Err(EventethError::TooEarly)
        );

        fixture.close_registration();
        fixture.contract.reveal_approved().unwrap();
        assert!(fixture.contract.revealed());
        assert_eq!(
            fixture.contract.reveal_approved(),
            Err(EventethError::AlreadyRevealed)
        );
    }

    #[test]
    fn test_reveal_settles_and_refunds() {
        let mut fixture = EventFixture::new();
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());

        fixture.register(a, "test1", 1).unwrap();
        fixture.register(b, "test2", 2).unwrap();
        fixture.register(c, "test3", 3).unwrap();
        fixture.reveal().unwrap();

        assert!(!fixture.contract.registration_approved(a));
        assert!(fixture.contract.registration_approved(b));
        assert!(fixture.contract.registration_approved(c));

        // gross = 5 units; 1% to owner, remainder to organizer.
        let gross = EventFixture::units(5);
        let fee = Money::from_units(gross.units() / 100);
        assert_eq!(fixture.ledger.balance_of(fixture.owner), fee);
        assert_eq!(
            fixture.ledger.balance_of(fixture.organizer),
            gross.sub(fee)
        );

        // The rejected deposit is claimable, nothing else is custodied.
        assert_eq!(fixture.contract.check_refund(a), EventFixture::units(1));
        assert_eq!(fixture.contract.custody(), EventFixture::units(1));
    }

    #[test]
    fn test_reveal_rolls_back_when_settlement_fails() {
        let mut fixture = EventFixture::new();
        let account = AccountId::new();

        fixture.register(account, "alice", 2).unwrap();
        fixture.ledger.reject(fixture.organizer);

        assert!(matches!(
            fixture.reveal(),
            Err(EventethError::Ledger(_))
        ));
        assert!(!fixture.contract.revealed());
        assert_eq!(fixture.contract.custody(), EventFixture::units(2));
        assert_eq!(fixture.ledger.balance_of(fixture.owner), Money::ZERO);

        // Once the organizer accepts funds again the reveal goes through.
        fixture.ledger.accept(fixture.organizer);
        fixture.contract.reveal_approved().unwrap();
        assert!(fixture.contract.registration_approved(account));
    }

    #[test]
    fn test_invitations_owner_only_and_capped() {
        let mut fixture = EventFixture::new();
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());

        assert_eq!(
            fixture.contract.invitation_by_owner(fixture.organizer, &[a]),
            Err(EventethError::Unauthorized)
        );

        let owner = fixture.owner;
        fixture.contract.invitation_by_owner(owner, &[a, a]).unwrap();
        fixture.contract.invitation_by_owner(owner, &[a, b]).unwrap();
        assert_eq!(
            fixture.contract.invitation_by_owner(owner, &[c]),
            Err(EventethError::CapacityExceeded { capacity: 2 })
        );

        fixture.close_registration();
        fixture.contract.reveal_approved().unwrap();
        assert_eq!(
            fixture.contract.invitation_by_owner(owner, &[c]),
            Err(EventethError::AlreadyRevealed)
        );
    }

    #[test]
    fn test_invited_displace_lowest_deposit() {
        let mut fixture = EventFixture::new();
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());

        fixture.register(a, "test1", 1).unwrap();
        fixture.register(b, "test2", 2).unwrap();
        fixture.register(c, "test3", 3).unwrap();
        let owner = fixture.owner;
        fixture.contract.invitation_by_owner(owner, &[a]).unwrap();
        fixture.reveal().unwrap();

        assert!(fixture.contract.registration_approved(a));
        assert!(!fixture.contract.registration_approved(b));
        assert!(fixture.contract.registration_approved(c));
    }

    #[test]
    fn test_transfer_request_preconditions() {
        let mut fixture = EventFixture::new();
        let (a, b) = (AccountId::new(), AccountId::new());

        fixture.register(a, "test1", 1).unwrap();
        fixture.register(b, "test2", 2).unwrap();

        // Not approved before reveal.
        assert_eq!(
            fixture.contract.request_registration_transfer(a),
            Err(EventethError::NotApproved)
        );

        fixture.reveal().unwrap();
        fixture.contract.request_registration_transfer(a).unwrap();
        assert!(!fixture.contract.registration_approved(a));
        assert!(fixture.contract.check_registration_transferring(a));

        assert_eq!(
            fixture.contract.request_registration_transfer(a),
            Err(EventethError::AlreadyTransferring)
        );
    }

    #[test]
    fn test_acquire_validates_the_record() {
        let mut fixture = EventFixture::new();
        let (a, buyer) = (AccountId::new(), AccountId::new());

        fixture.register(a, "test1", 1).unwrap();
        fixture.reveal().unwrap();

        let price = EventFixture::units(1);
        assert_eq!(
            fixture
                .contract
                .acquire_registration_transfer(buyer, a, "test1", price),
            Err(EventethError::NotTransferring)
        );

        fixture.contract.request_registration_transfer(a).unwrap();
        assert_eq!(
            fixture
                .contract
                .acquire_registration_transfer(buyer, a, "wrong", price),
            Err(EventethError::NameMismatch)
        );
        assert_eq!(
            fixture.contract.acquire_registration_transfer(
                buyer,
                a,
                "test1",
                EventFixture::units(2)
            ),
            Err(EventethError::AmountMismatch {
                expected: price,
                offered: EventFixture::units(2)
            })
        );

        fixture
            .contract
            .acquire_registration_transfer(buyer, a, "test1", price)
            .unwrap();
        assert!(fixture.contract.registration_approved(buyer));
        assert!(!fixture.contract.registration_approved(a));
        assert!(!fixture.contract.check_registration_transferring(a));
    }

    #[test]
    fn test_acquire_pays_original_minus_fee() {
        let mut fixture = EventFixture::new();
        let (a, buyer) = (AccountId::new(), AccountId::new());

        fixture.register(a, "test1", 1).unwrap();
        fixture.reveal().unwrap();
        let owner_before = fixture.ledger.balance_of(fixture.owner);

        fixture.contract.request_registration_transfer(a).unwrap();
        let price = EventFixture::units(1);
        fixture
            .contract
            .acquire_registration_transfer(buyer, a, "test1", price)
            .unwrap();

        let fee = Money::from_units(price.units() / 100);
        assert_eq!(fixture.ledger.balance_of(a), price.sub(fee));
        assert_eq!(
            fixture.ledger.balance_of(fixture.owner),
            owner_before.add(fee)
        );
        // Attached amount passed straight through; custody is unchanged.
        assert_eq!(fixture.contract.custody(), Money::ZERO);
    }

    #[test]
    fn test_acquire_rolls_back_when_payout_fails() {
        let mut fixture = EventFixture::new();
        let (a, buyer) = (AccountId::new(), AccountId::new());

        fixture.register(a, "test1", 1).unwrap();
        fixture.reveal().unwrap();
        fixture.contract.request_registration_transfer(a).unwrap();

        fixture.ledger.reject(a);
        let custody_before = fixture.contract.custody();
        let owner_before = fixture.ledger.balance_of(fixture.owner);
        let price = EventFixture::units(1);
        assert!(matches!(
            fixture
                .contract
                .acquire_registration_transfer(buyer, a, "test1", price),
            Err(EventethError::Ledger(_))
        ));

        // The offer is still open and nothing changed hands.
        assert!(fixture.contract.check_registration_transferring(a));
        assert!(!fixture.contract.registration_approved(buyer));
        assert_eq!(fixture.contract.custody(), custody_before);
        assert_eq!(fixture.ledger.balance_of(a), Money::ZERO);
        assert_eq!(fixture.ledger.balance_of(fixture.owner), owner_before);

        fixture.ledger.accept(a);
        fixture
            .contract
            .acquire_registration_transfer(buyer, a, "test1", price)
            .unwrap();
        assert!(fixture.contract.registration_approved(buyer));
    }

    #[test]
    fn test_cancel_transfer_restores_approval_once() {
        let mut fixture = EventFixture::new();
        let a = AccountId::new();

        fixture.register(a, "test1", 1).unwrap();
        fixture.reveal().unwrap();
        fixture.contract.request_registration_transfer(a).unwrap();

        fixture.contract.cancel_registration_transfer(a).unwrap();
        assert!(fixture.contract.registration_approved(a));
        assert!(!fixture.contract.check_registration_transferring(a));

        assert_eq!(
            fixture.contract.cancel_registration_transfer(a),
            Err(EventethError::NotTransferring)
        );
    }

    #[test]
    fn test_cancel_event_gates_and_refunds() {
        let mut fixture = EventFixture::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        fixture.register(a, "test1", 1).unwrap();

        assert_eq!(
            fixture.contract.cancel_event(fixture.owner),
            Err(EventethError::Unauthorized)
        );

        let organizer = fixture.organizer;
        fixture.contract.cancel_event(organizer).unwrap();
        assert!(fixture.contract.canceled());
        assert_eq!(
            fixture.contract.cancel_event(organizer),
            Err(EventethError::Canceled)
        );

        assert_eq!(
            fixture.register(b, "test2", 2),
            Err(EventethError::Canceled)
        );
        assert_eq!(fixture.contract.check_refund(a), EventFixture::units(1));
        assert!(!fixture.contract.registration_approved(a));
    }

    #[test]
    fn test_cancel_event_blocked_after_reveal() {
        let mut fixture = EventFixture::new();
        let a = AccountId::new();

        fixture.register(a, "test1", 1).unwrap();
        fixture.reveal().unwrap();
        assert!(fixture.contract.registration_approved(a));

        // Settlement already paid the organizer; there is nothing left to
        // hand back, so cancellation is off the table.
        let organizer = fixture.organizer;
        assert_eq!(
            fixture.contract.cancel_event(organizer),
            Err(EventethError::AlreadyRevealed)
        );
        assert!(!fixture.contract.canceled());
        assert!(fixture.contract.registration_approved(a));
    }

    #[test]
    fn test_withdrawal_refund_is_single_shot() {
        let mut fixture = EventFixture::new();
        let a = AccountId::new();
        fixture.register(a, "test1", 1).unwrap();
        let organizer = fixture.organizer;
        fixture.contract.cancel_event(organizer).unwrap();

        fixture.contract.withdrawal_refund(a).unwrap();
        assert_eq!(fixture.ledger.balance_of(a), EventFixture::units(1));
        assert_eq!(fixture.contract.check_refund(a), Money::ZERO);
        assert_eq!(fixture.contract.custody(), Money::ZERO);

        assert_eq!(
            fixture.contract.withdrawal_refund(a),
            Err(EventethError::NothingToRefund)
        );
    }

    #[test]
    fn test_withdrawal_survives_ledger_failure() {
        let mut fixture = EventFixture::new();
        let a = AccountId::new();
        fixture.register(a, "test1", 1).unwrap();
        let organizer = fixture.organizer;
        fixture.contract.cancel_event(organizer).unwrap();

        fixture.ledger.reject(a);
        assert!(matches!(
            fixture.contract.withdrawal_refund(a),
            Err(EventethError::Ledger(_))
        ));
        // The obligation is still on the books.
        assert_eq!(fixture.contract.check_refund(a), EventFixture::units(1));

        fixture.ledger.accept(a);
        fixture.contract.withdrawal_refund(a).unwrap();
        assert_eq!(fixture.ledger.balance_of(a), EventFixture::units(1));
    }
}

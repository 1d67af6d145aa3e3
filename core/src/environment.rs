//! Dependency-injection seams for the event contract.
//!
//! The contract never talks to the host environment directly: time comes
//! from a [`Clock`], value leaves custody through a [`Ledger`], and caller
//! identity arrives as an argument authenticated by the hosting layer.
//! Production wires real implementations; tests inject deterministic ones.

use crate::types::{AccountId, Money};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

/// Clock trait - abstracts time operations for testability
///
/// Phase gates are pure comparisons against `now()` at call time; the
/// contract never polls or sleeps.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Errors raised by ledger implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The recipient rejected the funds
    #[error("recipient {recipient} rejected the transfer")]
    TransferRejected {
        /// The rejecting recipient
        recipient: AccountId,
    },

    /// Transport or host-side failure
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// One outgoing payment from contract custody.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    /// Recipient identity
    pub to: AccountId,
    /// Amount to move out of custody
    pub amount: Money,
}

/// Batch of payouts performed by a single settlement step.
///
/// Settlements pay at most two parties (organizer/original plus the owner
/// fee), so batches stay inline.
pub type PayoutBatch = SmallVec<[Payout; 2]>;

/// Ledger trait - moves value out of contract custody.
///
/// Deposits arrive implicitly with value-carrying calls; the contract only
/// ever initiates outgoing transfers. Transfers are the one operation with
/// failure risk, and a failed transfer must leave nothing debited.
pub trait Ledger: Send + Sync {
    /// Transfer `amount` from contract custody to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient rejects the funds or the ledger is
    /// unavailable; no value moves on error.
    fn transfer(&self, to: AccountId, amount: Money) -> Result<(), LedgerError>;

    /// Apply a batch of payouts, all-or-nothing.
    ///
    /// Implementations must credit every payout or none of them: a
    /// settlement that pays the organizer but not the owner must never be
    /// observable.
    ///
    /// # Errors
    ///
    /// Returns an error if any payout cannot be applied; no value moves on
    /// error.
    fn transfer_batch(&self, payouts: &[Payout]) -> Result<(), LedgerError>;
}

/// Environment dependencies injected into every event contract
#[derive(Clone)]
pub struct Environment {
    /// Clock for phase gating
    pub clock: Arc<dyn Clock>,
    /// Ledger for settlement payouts and refunds
    pub ledger: Arc<dyn Ledger>,
}

impl Environment {
    /// Creates a new `Environment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ledger: Arc<dyn Ledger>) -> Self {
        Self { clock, ledger }
    }
}

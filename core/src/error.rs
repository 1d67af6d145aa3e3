//! Error types for the Eventeth contracts.
//!
//! Errors are categorical: they report an invalid phase, a missing
//! authorization, or a stale-state precondition, not transient failures.
//! Every rejected call leaves contract state and custody exactly as before.

use crate::environment::LedgerError;
use crate::types::Money;
use thiserror::Error;

/// Errors returned by the event contract and the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventethError {
    /// Constructor parameters failed validation
    #[error("invalid event parameters: {reason}")]
    InvalidParams {
        /// What was wrong with the parameters
        reason: String,
    },

    /// Registration attempted outside the registration window
    #[error("registration is closed")]
    RegistrationClosed,

    /// Reveal attempted before the registration window ended
    #[error("registration has not ended yet")]
    TooEarly,

    /// One-shot reveal already ran, or a pre-reveal operation arrived late
    #[error("approvals have already been revealed")]
    AlreadyRevealed,

    /// The event was canceled by the organizer
    #[error("event has been canceled")]
    Canceled,

    /// Deposit below the minimum guarantee
    #[error("deposit {offered} is below the minimum guarantee {minimum}")]
    InsufficientDeposit {
        /// Minimum deposit accepted per registration
        minimum: Money,
        /// Amount the caller offered
        offered: Money,
    },

    /// Accepting the amount would overflow the custody accounting
    #[error("amount would overflow contract custody")]
    CustodyOverflow,

    /// Caller lacks the required role (organizer-only or owner-only)
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    /// Caller has no active registration
    #[error("caller has no active registration")]
    NotRegistered,

    /// Caller's registration is not approved
    #[error("registration is not approved")]
    NotApproved,

    /// Slot is already offered for delegation
    #[error("registration transfer already requested")]
    AlreadyTransferring,

    /// Slot is not offered for delegation
    #[error("registration is not being transferred")]
    NotTransferring,

    /// Supplied name does not match the record on the offered slot
    #[error("registrant name does not match the record")]
    NameMismatch,

    /// Supplied amount does not match the slot's admission price
    #[error("amount {offered} does not match the admission price {expected}")]
    AmountMismatch {
        /// Recorded admission price of the offered slot
        expected: Money,
        /// Amount the caller offered
        offered: Money,
    },

    /// Withdrawal requested with a zero refundable balance
    #[error("no refundable balance to withdraw")]
    NothingToRefund,

    /// Invitation batch would push the invited list past capacity
    #[error("invitations would exceed the event capacity of {capacity}")]
    CapacityExceeded {
        /// Maximum number of approved slots
        capacity: usize,
    },

    /// An outgoing ledger transfer was rejected; the call rolled back
    #[error("ledger transfer failed: {0}")]
    Ledger(#[from] LedgerError),
}

//! Domain types for the Eventeth contracts.
//!
//! Value objects and entities shared by the event contract and the registry:
//! identifiers, money in the smallest settlement unit, the immutable
//! constructor parameters of an event, and the per-registrant record.

use crate::error::EventethError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Authenticated identity of a participant (organizer, owner, or registrant).
///
/// The hosting environment authenticates callers; the contracts only ever
/// compare identities, they never verify them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random `AccountId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AccountId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique handle for one event contract instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (smallest settlement unit, integer-only)
// ============================================================================

/// Value in the smallest settlement unit.
///
/// All amounts in the system are non-negative integers; arithmetic is
/// checked so custody accounting can never silently wrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// The zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from smallest settlement units
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Returns the amount in smallest settlement units
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two amounts
    ///
    /// # Panics
    ///
    /// Panics if the addition would overflow.
    /// Use `checked_add` for non-panicking addition.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn add(self, other: Self) -> Self {
        match self.checked_add(other) {
            Some(result) => result,
            None => panic!("Money::add overflow"),
        }
    }

    /// Subtracts two amounts (returns None if result would be negative)
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        if self.0 >= other.0 {
            Some(Self(self.0 - other.0))
        } else {
            None
        }
    }

    /// Subtracts two amounts
    ///
    /// # Panics
    ///
    /// Panics if the result would be negative.
    /// Use `checked_sub` for non-panicking subtraction.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn sub(self, other: Self) -> Self {
        match self.checked_sub(other) {
            Some(result) => result,
            None => panic!("Money::sub underflow"),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event parameters
// ============================================================================

/// Registration window of an event, half-open: `[started, ended)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationWindow {
    /// When registration opens (inclusive)
    pub started: DateTime<Utc>,
    /// When registration closes (exclusive)
    pub ended: DateTime<Utc>,
}

impl RegistrationWindow {
    /// Creates a new window
    #[must_use]
    pub const fn new(started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        Self { started, ended }
    }

    /// Whether `now` falls inside the window
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.started && now < self.ended
    }

    /// Whether the window has closed at `now`
    #[must_use]
    pub fn closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.ended
    }
}

/// Immutable constructor parameters of one event contract
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventParams {
    /// Receives settlement payouts and may cancel the event
    pub organizer: AccountId,
    /// Receives the fee share of settlement and transfer payments,
    /// and may invite registrants
    pub owner: AccountId,
    /// Descriptive event name
    pub name: String,
    /// Registration window
    pub window: RegistrationWindow,
    /// Minimum deposit accepted per registration
    pub minimum_guarantee: Money,
    /// Maximum number of approved slots
    pub capacity: usize,
}

impl EventParams {
    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EventethError::InvalidParams`] if the registration window is
    /// empty or inverted, or if the capacity is zero.
    pub fn validate(&self) -> Result<(), EventethError> {
        if self.window.started >= self.window.ended {
            return Err(EventethError::InvalidParams {
                reason: "registration must start before it ends".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(EventethError::InvalidParams {
                reason: "capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Registration record
// ============================================================================

/// Per-registrant record held by an event contract.
///
/// At most one record exists per identity. A record stays around after it is
/// deactivated so the refund ledger and the recorded admission price remain
/// queryable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Caller-supplied label, double-checked on slot acquisition
    pub name: String,
    /// Deposit currently custodied for this identity
    pub deposit: Money,
    /// Admission price recorded at reveal; zero until the slot is approved.
    /// A price record, not custodied value: settlement consumes the deposit.
    pub admission_price: Money,
    /// Accumulated amount owed, paid out via pull-withdrawal
    pub refundable: Money,
    /// Whether the identity currently holds an unsettled claim
    pub active: bool,
    /// Whether the slot is approved; meaningful only after reveal
    pub approved: bool,
    /// Whether the slot is currently offered for delegation
    pub transferring: bool,
}

impl Registration {
    /// Creates a fresh active registration holding `deposit`
    #[must_use]
    pub const fn new(name: String, deposit: Money) -> Self {
        Self {
            name,
            deposit,
            admission_price: Money::ZERO,
            refundable: Money::ZERO,
            active: true,
            approved: false,
            transferring: false,
        }
    }

    /// Whether any claim remains: custodied value, a pending refund, or an
    /// approved/offered slot
    #[must_use]
    pub const fn has_claim(&self) -> bool {
        !self.deposit.is_zero() || !self.refundable.is_zero() || self.approved || self.transferring
    }
}

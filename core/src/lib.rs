//! # Eventeth Core
//!
//! Registration/escrow contracts for capacity-constrained events.
//!
//! One [`event::EventContract`] custodies deposits from prospective
//! attendees of a single event, runs a one-shot capacity-constrained
//! admission reveal, settles the approved deposits to the organizer and the
//! fee-recipient owner, operates a secondary market for approved slots, and
//! returns value to everyone else through a pull-based refund ledger. The
//! [`registry::EventRegistry`] instantiates one contract per event and
//! indexes them by organizer.
//!
//! ## Architecture Principles
//!
//! - Host concerns stay behind environment traits: time comes from a
//!   [`environment::Clock`], value moves through a [`environment::Ledger`],
//!   and caller identity arrives pre-authenticated.
//! - Admission and settlement math are pure functions over a snapshot
//!   ([`selection`]), separate from the state-mutating commit.
//! - Every mutation commits fully or fails with state untouched; payouts to
//!   multiple parties are atomic ledger batches.
//! - Each contract instance is a single logical actor; the registry hands
//!   out mutex-guarded handles.
//!
//! ## Example
//!
//! ```ignore
//! use eventeth_core::prelude::*;
//! use std::sync::Arc;
//!
//! let env = Environment::new(Arc::new(SystemClock), ledger);
//! let mut registry = EventRegistry::new(env);
//! let event_id = registry.create_event(params)?;
//!
//! let handle = registry.event(event_id).unwrap();
//! let mut event = handle.lock().unwrap();
//! event.register(attendee, "alice", Money::from_units(10_000))?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod environment;
pub mod error;
pub mod event;
pub mod registry;
pub mod selection;
pub mod types;

/// Convenience re-exports of the crate's surface
pub mod prelude {
    pub use crate::environment::{Clock, Environment, Ledger, LedgerError, Payout, SystemClock};
    pub use crate::error::EventethError;
    pub use crate::event::EventContract;
    pub use crate::registry::{EventCreated, EventHandle, EventRegistry};
    pub use crate::types::{
        AccountId, EventId, EventParams, Money, Registration, RegistrationWindow,
    };
}

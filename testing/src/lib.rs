//! # Eventeth Testing
//!
//! Test doubles and fixtures for the Eventeth contracts: a manually driven
//! clock, a recording in-memory ledger that can simulate recipients
//! rejecting funds, and a fixture that wires both into a contract
//! mid-registration-window with standard test accounts.

pub mod fixture;
pub mod mocks;

pub use eventeth_core;

pub use fixture::{EventFixture, DEPOSIT_UNIT};
pub use mocks::{ManualClock, RecordingLedger};

/// Initializes a tracing subscriber for test output.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Application layer orchestrating the subscription lifecycle.
//!
//! `ReconciliationService` is the only writer to the subscription store and
//! owns the checkout-intent table; `AccessGate` is the read-only facade the
//! presentation layer asks for entitlement decisions.

pub mod access_gate;
pub mod reconciliation;

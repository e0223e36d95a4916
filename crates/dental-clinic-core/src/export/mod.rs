//! Export functionality for billing.

mod billing;

pub use billing::*;

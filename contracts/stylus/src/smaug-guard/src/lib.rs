//! Smaug: a Safe transaction guard that enforces per-asset spending budgets.
//!
//! Every protected asset carries four limits (per transaction, per block, per rolling day, and
//! lifetime). Limit and TTL changes go through a TTL-delayed schedule, and the admin can
//! pre-approve a specific Safe transaction hash so that, once matured, it bypasses the limits.

#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
extern crate alloc;

pub mod access;
pub mod approvals;
pub mod balances;
pub mod errors;
pub mod hook;
pub mod policy_store;
pub mod safe;
pub mod schedule;
pub mod smaug;
pub mod store;
pub mod usage;

pub use smaug::SmaugGuard;

//! Shared types for the Smaug spending guard.
//!
//! Used by the Stylus contract and by the off-chain encoder, so everything here stays `no_std`.

#![cfg_attr(not(test), no_std)]

pub mod balances;
pub mod policy;

pub use balances::{BalanceError, BalanceSource};
pub use policy::{BudgetScope, Policy, PolicyTuple, DAY_SECONDS};

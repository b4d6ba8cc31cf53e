//! Balance sources for the guarded Safe.

pub mod fixed;
pub mod onchain;

pub use smaug_guard_types::{BalanceError, BalanceSource};

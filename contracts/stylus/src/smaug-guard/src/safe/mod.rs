//! Safe (Gnosis Safe) transaction-guard compatibility shims.
//!
//! Keeps the Stylus contract ABI-aligned with Safe's `ITransactionGuard` expectations while the
//! budget logic stays elsewhere.

pub mod constants;
pub mod interfaces;

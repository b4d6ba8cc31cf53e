//! Off-chain helpers for operating a Smaug guard: setup payloads, admin calldata, and Safe
//! transaction hashes to pre-approve.

pub mod encoder;
pub mod types;

#[cfg(test)]
mod tests;

use alloy_primitives::{Address, U256};

/// Errors while reading a holder's balance of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceError {
    /// The underlying call failed or reverted.
    CallFailed,
    /// Return data was too short to hold a `uint256`.
    MalformedReturn,
    /// The provider has no balance for this (asset, holder) pair.
    Unknown,
}

/// Balance source abstraction, implemented differently on-chain vs off-chain.
///
/// The guard only ever compares two readings of the same source taken within one guarded
/// transaction, so implementations must be consistent between calls but need not be cheap.
pub trait BalanceSource {
    fn balance_of(&self, asset: Address, holder: Address) -> Result<U256, BalanceError>;
}

impl<T: BalanceSource + ?Sized> BalanceSource for &T {
    fn balance_of(&self, asset: Address, holder: Address) -> Result<U256, BalanceError> {
        (**self).balance_of(asset, holder)
    }
}

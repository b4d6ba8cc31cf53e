use alloc::collections::BTreeMap;

use alloy_sol_types::SolCall;
use stylus_sdk::{
    alloy_primitives::{Address, U256},
    stylus_core::{calls::context::Call, Host},
};

use crate::{errors::BalanceError, safe::interfaces::IERC20};
use smaug_guard_types::BalanceSource;

/// Gas cap for one `balanceOf` staticcall.
pub const BALANCE_OF_GAS_CAP: u64 = 100_000;

/// Reads ERC-20 balances with a gas-capped `staticcall` to `balanceOf(address)`.
pub struct Erc20Balances<'a> {
    host: &'a dyn Host,
    pub gas_cap: u64,
}

impl<'a> Erc20Balances<'a> {
    pub fn new(host: &'a dyn Host) -> Self {
        Self::with_gas_cap(host, BALANCE_OF_GAS_CAP)
    }

    pub fn with_gas_cap(host: &'a dyn Host, gas_cap: u64) -> Self {
        Self { host, gas_cap }
    }

    /// Read `holder`'s balance of every asset now. The readings stay valid after the host
    /// borrow ends, so the guard can hand them to logic that mutably borrows its storage.
    pub fn snapshot<I>(&self, holder: Address, assets: I) -> BalanceSnapshot
    where
        I: IntoIterator<Item = Address>,
    {
        let readings = assets
            .into_iter()
            .map(|asset| (asset, self.balance_of(asset, holder)))
            .collect();
        BalanceSnapshot { holder, readings }
    }
}

impl BalanceSource for Erc20Balances<'_> {
    fn balance_of(&self, asset: Address, holder: Address) -> Result<U256, BalanceError> {
        let data = IERC20::balanceOfCall { account: holder }.abi_encode();
        let context = Call::new().gas(self.gas_cap);
        let out = self
            .host
            .static_call(&context, asset, &data)
            .map_err(|_| BalanceError::CallFailed)?;
        IERC20::balanceOfCall::abi_decode_returns(&out, true)
            .map(|ret| ret._0)
            .map_err(|_| BalanceError::MalformedReturn)
    }
}

/// Balances of one holder, read up front. Failed reads are kept and replayed.
#[derive(Clone, Debug, Default)]
pub struct BalanceSnapshot {
    holder: Address,
    readings: BTreeMap<Address, Result<U256, BalanceError>>,
}

impl BalanceSource for BalanceSnapshot {
    fn balance_of(&self, asset: Address, holder: Address) -> Result<U256, BalanceError> {
        if holder != self.holder {
            return Err(BalanceError::Unknown);
        }
        self.readings
            .get(&asset)
            .copied()
            .unwrap_or(Err(BalanceError::Unknown))
    }
}

use alloc::collections::BTreeMap;

use stylus_sdk::alloy_primitives::{Address, U256};

use crate::errors::BalanceError;
use smaug_guard_types::BalanceSource;

/// Off-chain balance table for simulating guarded transactions.
#[derive(Clone, Debug, Default)]
pub struct FixedBalances {
    balances: BTreeMap<(Address, Address), U256>,
}

impl FixedBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, asset: Address, holder: Address, amount: U256) {
        self.balances.insert((asset, holder), amount);
    }

    /// Move `amount` out of `holder`'s balance, as a transfer executed by the Safe would.
    pub fn withdraw(&mut self, asset: Address, holder: Address, amount: U256) {
        let entry = self.balances.entry((asset, holder)).or_insert(U256::ZERO);
        *entry = entry.saturating_sub(amount);
    }

    pub fn deposit(&mut self, asset: Address, holder: Address, amount: U256) {
        let entry = self.balances.entry((asset, holder)).or_insert(U256::ZERO);
        *entry = entry.saturating_add(amount);
    }
}

impl BalanceSource for FixedBalances {
    fn balance_of(&self, asset: Address, holder: Address) -> Result<U256, BalanceError> {
        self.balances
            .get(&(asset, holder))
            .copied()
            .ok_or(BalanceError::Unknown)
    }
}

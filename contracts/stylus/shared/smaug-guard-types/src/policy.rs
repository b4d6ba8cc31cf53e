use alloy_primitives::U256;

/// Length of the rolling day window, in seconds.
pub const DAY_SECONDS: u64 = 86_400;

/// ABI shape of a policy: `(inDay, inBlock, inTX, inTotal)`.
///
/// This is the tuple order the factory encodes in its setup payload, so it is kept on the wire
/// even though [`Policy`] names the fields by scope.
pub type PolicyTuple = (U256, U256, U256, U256);

/// Budget scopes, listed in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BudgetScope {
    Transaction,
    Block,
    Day,
    Total,
}

impl BudgetScope {
    /// Evaluation order. The first breached scope is the one reported.
    pub const ORDERED: [BudgetScope; 4] = [
        BudgetScope::Transaction,
        BudgetScope::Block,
        BudgetScope::Day,
        BudgetScope::Total,
    ];
}

/// Spending limits for one protected asset, in the asset's smallest unit.
///
/// A scope is breached when the projected amount is strictly greater than its limit.
/// A zero limit therefore forbids any outflow; `U256::MAX` disables the scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    pub max_per_tx: U256,
    pub max_per_block: U256,
    pub max_per_day: U256,
    pub max_total: U256,
}

impl Policy {
    pub const fn new(
        max_per_tx: U256,
        max_per_block: U256,
        max_per_day: U256,
        max_total: U256,
    ) -> Self {
        Self {
            max_per_tx,
            max_per_block,
            max_per_day,
            max_total,
        }
    }

    pub fn limit(&self, scope: BudgetScope) -> U256 {
        match scope {
            BudgetScope::Transaction => self.max_per_tx,
            BudgetScope::Block => self.max_per_block,
            BudgetScope::Day => self.max_per_day,
            BudgetScope::Total => self.max_total,
        }
    }

    pub fn from_abi(tuple: PolicyTuple) -> Self {
        let (in_day, in_block, in_tx, in_total) = tuple;
        Self::new(in_tx, in_block, in_day, in_total)
    }

    pub fn to_abi(&self) -> PolicyTuple {
        (self.max_per_day, self.max_per_block, self.max_per_tx, self.max_total)
    }
}

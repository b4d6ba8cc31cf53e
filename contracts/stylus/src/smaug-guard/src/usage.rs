//! Usage tracker: turns observed outflows into budget consumption.
//!
//! Windows are reset lazily. A stored window marker (block number, day start) that no longer
//! matches the current block/time means the stored running total belongs to an older window.

use stylus_sdk::alloy_primitives::U256;

use smaug_guard_types::{BudgetScope, Policy, DAY_SECONDS};

use crate::errors::LimitBreach;

/// Per-asset policy plus running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetState {
    pub policy: Policy,
    pub spent_this_block: U256,
    pub block_of_window: u64,
    pub spent_today: U256,
    pub day_window_start: u64,
    /// Lifetime outflow. Never decreases.
    pub spent_total: U256,
    /// Balance captured by the pre-check. Only meaningful while a check is open.
    pub balance_before_call: U256,
}

/// Window counters as they stand at a given block/time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageView {
    pub spent_this_block: U256,
    pub spent_today: U256,
    pub spent_total: U256,
}

impl AssetState {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    fn block_window_current(&self, block: u64) -> bool {
        self.block_of_window == block
    }

    fn day_window_current(&self, now: u64) -> bool {
        now < self.day_window_start.saturating_add(DAY_SECONDS)
    }

    /// Charge `amount` against all four scopes.
    ///
    /// Scopes are evaluated in [`BudgetScope::ORDERED`] order and the first breach is returned.
    /// Counters are only written when every scope passes.
    pub fn record_usage(&mut self, amount: U256, block: u64, now: u64) -> Result<(), LimitBreach> {
        if amount.is_zero() {
            return Ok(());
        }

        let block_current = self.block_window_current(block);
        let day_current = self.day_window_current(now);

        let block_total = if block_current {
            self.spent_this_block.saturating_add(amount)
        } else {
            amount
        };
        let day_total = if day_current {
            self.spent_today.saturating_add(amount)
        } else {
            amount
        };
        let total = self.spent_total.saturating_add(amount);

        for scope in BudgetScope::ORDERED {
            let attempted = match scope {
                BudgetScope::Transaction => amount,
                BudgetScope::Block => block_total,
                BudgetScope::Day => day_total,
                BudgetScope::Total => total,
            };
            let limit = self.policy.limit(scope);
            if attempted > limit {
                return Err(LimitBreach {
                    scope,
                    attempted,
                    limit,
                });
            }
        }

        self.spent_this_block = block_total;
        self.block_of_window = block;
        self.spent_today = day_total;
        if !day_current {
            self.day_window_start = now;
        }
        self.spent_total = total;
        Ok(())
    }

    /// Add a limit-exempt outflow to the lifetime counter only.
    pub fn accrue_total(&mut self, amount: U256) {
        self.spent_total = self.spent_total.saturating_add(amount);
    }

    /// Counters with stale windows read as zero. Does not mutate.
    pub fn effective_usage(&self, block: u64, now: u64) -> UsageView {
        UsageView {
            spent_this_block: if self.block_window_current(block) {
                self.spent_this_block
            } else {
                U256::ZERO
            },
            spent_today: if self.day_window_current(now) {
                self.spent_today
            } else {
                U256::ZERO
            },
            spent_total: self.spent_total,
        }
    }
}

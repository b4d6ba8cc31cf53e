//! Guard hook: the two-phase check the Safe runs around every transaction.
//!
//! Pre-check: authorise the caller, reject delegate calls, apply matured updates, snapshot
//! balances. Post-check: apply matured updates again, turn balance drops into outflows, and
//! either charge them against the budgets or, for a matured pre-approval, accrue the lifetime
//! total only.

use alloc::vec::Vec;

use stylus_sdk::alloy_primitives::{Address, FixedBytes, U256};

use smaug_guard_types::{BalanceSource, Policy};

use crate::{
    access::{authorize, Role},
    approvals,
    errors::GuardError,
    policy_store::insert_asset,
    safe::constants::Operation,
    schedule::{apply_matured, AppliedUpdates},
    store::GuardStore,
};

/// Host context of one guard call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallEnv {
    pub caller: Address,
    pub block_number: u64,
    pub timestamp: u64,
}

/// One-time configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    pub admin: Address,
    pub safe: Address,
    pub ttl: u64,
    pub assets: Vec<(Address, Policy)>,
}

/// What a post-check did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    pub applied: AppliedUpdates,
    /// Per-asset outflow observed across the transaction.
    pub outflows: Vec<(Address, U256)>,
    /// True when a matured pre-approval exempted the outflows from the limits.
    pub bypassed: bool,
}

pub fn setup<S: GuardStore + ?Sized>(
    store: &mut S,
    config: &GuardConfig,
) -> Result<(), GuardError> {
    if store.is_initialized() {
        return Err(GuardError::AlreadyInitialized);
    }
    if config.admin == Address::ZERO || config.safe == Address::ZERO {
        return Err(GuardError::InvalidConfiguration);
    }

    store.initialize(config.admin, config.safe, config.ttl);
    for (asset, policy) in &config.assets {
        insert_asset(store, *asset, *policy)?;
    }
    Ok(())
}

pub fn check_transaction<S, B>(
    store: &mut S,
    balances: &B,
    env: &CallEnv,
    operation: u8,
) -> Result<AppliedUpdates, GuardError>
where
    S: GuardStore + ?Sized,
    B: BalanceSource + ?Sized,
{
    authorize(store, env.caller, Role::Safe)?;
    match Operation::try_from(operation) {
        Ok(Operation::Call) => {}
        Ok(Operation::DelegateCall) => return Err(GuardError::DelegatecallNotAllowed),
        Err(other) => return Err(GuardError::UnsupportedOperation(other)),
    }
    if store.check_open() {
        return Err(GuardError::GuardReentered);
    }

    let applied = apply_matured(store, env.timestamp);

    let safe = store.safe();
    let mut snapshots = Vec::new();
    for asset in store.protected_assets() {
        let balance = balances
            .balance_of(asset, safe)
            .map_err(|reason| GuardError::BalanceUnavailable { asset, reason })?;
        snapshots.push((asset, balance));
    }
    for (asset, balance) in snapshots {
        if let Some(mut state) = store.asset_state(asset) {
            state.balance_before_call = balance;
            store.put_asset_state(asset, state);
        }
    }

    store.set_check_open(true);
    Ok(applied)
}

pub fn check_after_execution<S, B>(
    store: &mut S,
    balances: &B,
    env: &CallEnv,
    tx_hash: FixedBytes<32>,
    success: bool,
) -> Result<Settlement, GuardError>
where
    S: GuardStore + ?Sized,
    B: BalanceSource + ?Sized,
{
    authorize(store, env.caller, Role::Safe)?;

    let mut settlement = Settlement {
        applied: apply_matured(store, env.timestamp),
        ..Settlement::default()
    };

    if !store.check_open() {
        return Ok(settlement);
    }
    store.set_check_open(false);
    if !success {
        return Ok(settlement);
    }

    let matured = approvals::is_matured(store, tx_hash, env.timestamp);
    let safe = store.safe();

    // Work out every asset's new state before writing any of them.
    let mut updates = Vec::new();
    for asset in store.protected_assets() {
        let Some(mut state) = store.asset_state(asset) else {
            continue;
        };
        let current = balances
            .balance_of(asset, safe)
            .map_err(|reason| GuardError::BalanceUnavailable { asset, reason })?;
        let amount_out = state.balance_before_call.saturating_sub(current);
        if amount_out.is_zero() {
            continue;
        }

        if matured {
            state.accrue_total(amount_out);
        } else {
            state
                .record_usage(amount_out, env.block_number, env.timestamp)
                .map_err(|breach| GuardError::BudgetExceeded { asset, breach })?;
        }
        settlement.outflows.push((asset, amount_out));
        updates.push((asset, state));
    }

    for (asset, state) in updates {
        store.put_asset_state(asset, state);
    }
    if matured && !settlement.outflows.is_empty() {
        approvals::consume(store, tx_hash);
        settlement.bypassed = true;
    }

    Ok(settlement)
}

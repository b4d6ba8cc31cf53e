//! Scheduled update manager.
//!
//! Each governed parameter (the TTL, and each asset's policy) owns one [`UpdateSlot`]. A change
//! is scheduled with a delay equal to the TTL in force *when it is scheduled*, and is applied by
//! the first guard call that observes `now >= activation_time`. There is no keeper.

use alloc::vec::Vec;

use stylus_sdk::alloy_primitives::Address;

use smaug_guard_types::Policy;

use crate::{
    access::{authorize, Role},
    errors::GuardError,
    store::GuardStore,
};

/// Idle/Pending state machine for one governed parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateSlot<T> {
    Idle,
    Pending { value: T, activation_time: u64 },
}

impl<T> Default for UpdateSlot<T> {
    fn default() -> Self {
        UpdateSlot::Idle
    }
}

impl<T> UpdateSlot<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, UpdateSlot::Pending { .. })
    }

    pub fn activation_time(&self) -> Option<u64> {
        match self {
            UpdateSlot::Pending { activation_time, .. } => Some(*activation_time),
            UpdateSlot::Idle => None,
        }
    }

    /// Move to `Pending`, activating `current_ttl` seconds from `now`.
    pub fn schedule(&mut self, value: T, now: u64, current_ttl: u64) -> Result<u64, GuardError> {
        if self.is_pending() {
            return Err(GuardError::UpdateAlreadyScheduled);
        }
        let activation_time = now.saturating_add(current_ttl);
        *self = UpdateSlot::Pending {
            value,
            activation_time,
        };
        Ok(activation_time)
    }

    /// Return the pending value and go back to `Idle` if it has matured.
    pub fn take_matured(&mut self, now: u64) -> Option<T> {
        match self.activation_time() {
            Some(at) if at <= now => match core::mem::replace(self, UpdateSlot::Idle) {
                UpdateSlot::Pending { value, .. } => Some(value),
                UpdateSlot::Idle => None,
            },
            _ => None,
        }
    }
}

/// A TTL change that has just been scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTtl {
    pub old_ttl: u64,
    pub new_ttl: u64,
    pub activation_time: u64,
}

/// Scheduled updates applied by one guard call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedUpdates {
    /// `(old, new)` TTL.
    pub ttl: Option<(u64, u64)>,
    pub policies: Vec<(Address, Policy)>,
}

impl AppliedUpdates {
    pub fn is_empty(&self) -> bool {
        self.ttl.is_none() && self.policies.is_empty()
    }
}

pub fn schedule_ttl_update<S: GuardStore + ?Sized>(
    store: &mut S,
    caller: Address,
    new_ttl: u64,
    now: u64,
) -> Result<ScheduledTtl, GuardError> {
    authorize(store, caller, Role::Admin)?;

    let old_ttl = store.ttl();
    let mut slot = store.pending_ttl();
    let activation_time = slot.schedule(new_ttl, now, old_ttl)?;
    store.set_pending_ttl(slot);

    Ok(ScheduledTtl {
        old_ttl,
        new_ttl,
        activation_time,
    })
}

/// Returns the activation time of the new policy.
pub fn schedule_policy_update<S: GuardStore + ?Sized>(
    store: &mut S,
    caller: Address,
    asset: Address,
    policy: Policy,
    now: u64,
) -> Result<u64, GuardError> {
    authorize(store, caller, Role::Admin)?;
    if store.asset_state(asset).is_none() {
        return Err(GuardError::UnknownAsset(asset));
    }

    let mut slot = store.pending_policy(asset);
    let activation_time = slot.schedule(policy, now, store.ttl())?;
    store.set_pending_policy(asset, slot);
    Ok(activation_time)
}

/// Apply every matured scheduled update. Never fails.
///
/// The TTL is applied before policies; policy activation times were fixed when they were
/// scheduled, so the order does not change which policies mature.
pub fn apply_matured<S: GuardStore + ?Sized>(store: &mut S, now: u64) -> AppliedUpdates {
    let mut applied = AppliedUpdates::default();

    let mut ttl_slot = store.pending_ttl();
    if let Some(new_ttl) = ttl_slot.take_matured(now) {
        let old_ttl = store.ttl();
        store.set_ttl(new_ttl);
        store.set_pending_ttl(ttl_slot);
        applied.ttl = Some((old_ttl, new_ttl));
    }

    for asset in store.protected_assets() {
        let mut slot = store.pending_policy(asset);
        let Some(policy) = slot.take_matured(now) else {
            continue;
        };
        if let Some(mut state) = store.asset_state(asset) {
            state.policy = policy;
            store.put_asset_state(asset, state);
        }
        store.set_pending_policy(asset, slot);
        applied.policies.push((asset, policy));
    }

    applied
}

//! Policy store: which assets are protected, and under which limits.
//!
//! Policies are only ever replaced through [`crate::schedule`]; this module adds assets and
//! reads their policies.

use stylus_sdk::alloy_primitives::Address;

use smaug_guard_types::Policy;

use crate::{
    access::{authorize, Role},
    errors::GuardError,
    store::GuardStore,
    usage::AssetState,
};

pub fn add_protected_asset<S: GuardStore + ?Sized>(
    store: &mut S,
    caller: Address,
    asset: Address,
    policy: Policy,
) -> Result<(), GuardError> {
    authorize(store, caller, Role::Admin)?;
    insert_asset(store, asset, policy)
}

pub(crate) fn insert_asset<S: GuardStore + ?Sized>(
    store: &mut S,
    asset: Address,
    policy: Policy,
) -> Result<(), GuardError> {
    if asset == Address::ZERO {
        return Err(GuardError::InvalidConfiguration);
    }
    if store.asset_state(asset).is_some() {
        return Err(GuardError::AlreadyProtected(asset));
    }
    store.put_asset_state(asset, AssetState::new(policy));
    Ok(())
}

pub fn policy_of<S: GuardStore + ?Sized>(store: &S, asset: Address) -> Result<Policy, GuardError> {
    store
        .asset_state(asset)
        .map(|state| state.policy)
        .ok_or(GuardError::UnknownAsset(asset))
}

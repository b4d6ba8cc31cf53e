//! Pre-approval registry.
//!
//! The admin registers a Safe transaction hash ahead of time. Once the hash has aged by the TTL
//! (read at the moment of the check), a post-check for that hash skips the budget limits.

use stylus_sdk::alloy_primitives::{Address, FixedBytes};

use crate::{
    access::{authorize, Role},
    errors::GuardError,
    store::GuardStore,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreApproval {
    pub registered_at: u64,
    pub revoked: bool,
    /// Set once the approval has carried a limit-exempt outflow.
    pub consumed: bool,
}

impl PreApproval {
    pub fn is_live(&self) -> bool {
        !self.revoked && !self.consumed
    }

    pub fn matures_at(&self, ttl: u64) -> u64 {
        self.registered_at.saturating_add(ttl)
    }

    pub fn is_matured(&self, now: u64, ttl: u64) -> bool {
        self.is_live() && now >= self.matures_at(ttl)
    }
}

/// Register `tx_hash`. Returns the time at which it matures under the current TTL.
pub fn pre_approve<S: GuardStore + ?Sized>(
    store: &mut S,
    caller: Address,
    tx_hash: FixedBytes<32>,
    now: u64,
) -> Result<u64, GuardError> {
    authorize(store, caller, Role::Admin)?;
    if store.approval(tx_hash).is_some_and(|a| a.is_live()) {
        return Err(GuardError::AlreadyApproved(tx_hash));
    }

    let approval = PreApproval {
        registered_at: now,
        revoked: false,
        consumed: false,
    };
    store.put_approval(tx_hash, approval);
    Ok(approval.matures_at(store.ttl()))
}

/// Revoke `tx_hash`. Returns `false` when it was already revoked.
pub fn revoke<S: GuardStore + ?Sized>(
    store: &mut S,
    caller: Address,
    tx_hash: FixedBytes<32>,
) -> Result<bool, GuardError> {
    authorize(store, caller, Role::Admin)?;
    let Some(mut approval) = store.approval(tx_hash) else {
        return Err(GuardError::NotApproved(tx_hash));
    };
    if approval.revoked {
        return Ok(false);
    }
    approval.revoked = true;
    store.put_approval(tx_hash, approval);
    Ok(true)
}

pub fn is_matured<S: GuardStore + ?Sized>(store: &S, tx_hash: FixedBytes<32>, now: u64) -> bool {
    store
        .approval(tx_hash)
        .is_some_and(|a| a.is_matured(now, store.ttl()))
}

pub(crate) fn consume<S: GuardStore + ?Sized>(store: &mut S, tx_hash: FixedBytes<32>) {
    if let Some(mut approval) = store.approval(tx_hash) {
        approval.consumed = true;
        store.put_approval(tx_hash, approval);
    }
}

//! State seam between the guard logic and wherever its state lives.
//!
//! The Stylus contract implements [`GuardStore`] over its `sol_storage!` layout; [`MemoryStore`]
//! keeps the same state in ordinary collections for off-chain simulation and tests.

use alloc::{collections::BTreeMap, vec::Vec};

use stylus_sdk::alloy_primitives::{Address, FixedBytes};

use smaug_guard_types::Policy;

use crate::{approvals::PreApproval, schedule::UpdateSlot, usage::AssetState};

pub trait GuardStore {
    fn is_initialized(&self) -> bool;
    /// Record the one-time configuration. Callers check [`GuardStore::is_initialized`] first.
    fn initialize(&mut self, admin: Address, safe: Address, ttl: u64);

    fn admin(&self) -> Address;
    fn safe(&self) -> Address;

    fn ttl(&self) -> u64;
    fn set_ttl(&mut self, ttl: u64);
    fn pending_ttl(&self) -> UpdateSlot<u64>;
    fn set_pending_ttl(&mut self, slot: UpdateSlot<u64>);

    /// Protected assets, in the order they were added.
    fn protected_assets(&self) -> Vec<Address>;
    fn asset_state(&self, asset: Address) -> Option<AssetState>;
    /// Write an asset's state, registering the asset if it is not yet protected.
    fn put_asset_state(&mut self, asset: Address, state: AssetState);
    fn pending_policy(&self, asset: Address) -> UpdateSlot<Policy>;
    fn set_pending_policy(&mut self, asset: Address, slot: UpdateSlot<Policy>);

    fn approval(&self, tx_hash: FixedBytes<32>) -> Option<PreApproval>;
    fn put_approval(&mut self, tx_hash: FixedBytes<32>, approval: PreApproval);

    /// Whether a pre-check is waiting for its post-check.
    fn check_open(&self) -> bool;
    fn set_check_open(&mut self, open: bool);
}

/// In-memory [`GuardStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    initialized: bool,
    admin: Address,
    safe: Address,
    ttl: u64,
    pending_ttl: UpdateSlot<u64>,
    assets: Vec<Address>,
    states: BTreeMap<Address, AssetState>,
    pending_policies: BTreeMap<Address, UpdateSlot<Policy>>,
    approvals: BTreeMap<FixedBytes<32>, PreApproval>,
    check_open: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GuardStore for MemoryStore {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, admin: Address, safe: Address, ttl: u64) {
        self.initialized = true;
        self.admin = admin;
        self.safe = safe;
        self.ttl = ttl;
    }

    fn admin(&self) -> Address {
        self.admin
    }

    fn safe(&self) -> Address {
        self.safe
    }

    fn ttl(&self) -> u64 {
        self.ttl
    }

    fn set_ttl(&mut self, ttl: u64) {
        self.ttl = ttl;
    }

    fn pending_ttl(&self) -> UpdateSlot<u64> {
        self.pending_ttl.clone()
    }

    fn set_pending_ttl(&mut self, slot: UpdateSlot<u64>) {
        self.pending_ttl = slot;
    }

    fn protected_assets(&self) -> Vec<Address> {
        self.assets.clone()
    }

    fn asset_state(&self, asset: Address) -> Option<AssetState> {
        self.states.get(&asset).copied()
    }

    fn put_asset_state(&mut self, asset: Address, state: AssetState) {
        if self.states.insert(asset, state).is_none() {
            self.assets.push(asset);
        }
    }

    fn pending_policy(&self, asset: Address) -> UpdateSlot<Policy> {
        self.pending_policies.get(&asset).cloned().unwrap_or_default()
    }

    fn set_pending_policy(&mut self, asset: Address, slot: UpdateSlot<Policy>) {
        match slot {
            UpdateSlot::Idle => {
                self.pending_policies.remove(&asset);
            }
            pending => {
                self.pending_policies.insert(asset, pending);
            }
        }
    }

    fn approval(&self, tx_hash: FixedBytes<32>) -> Option<PreApproval> {
        self.approvals.get(&tx_hash).copied()
    }

    fn put_approval(&mut self, tx_hash: FixedBytes<32>, approval: PreApproval) {
        self.approvals.insert(tx_hash, approval);
    }

    fn check_open(&self) -> bool {
        self.check_open
    }

    fn set_check_open(&mut self, open: bool) {
        self.check_open = open;
    }
}

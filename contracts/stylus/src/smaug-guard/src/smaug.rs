//! Stylus entrypoint for the Smaug spending guard.
//!
//! The Safe registers this contract with `setGuard(address)` and calls `checkTransaction` before
//! and `checkAfterExecution` after every transaction. The state machine lives in the sibling
//! modules and is generic over [`GuardStore`]; this file maps it onto contract storage, turns
//! its results into events, and its failures into Solidity custom errors.

use alloc::vec::Vec;

use stylus_sdk::{
    abi::Bytes,
    alloy_primitives::{Address, FixedBytes, U256, U64},
    prelude::*,
    stylus_core::log,
};

use alloy_sol_types::sol;
use stylus_sdk::stylus_proc::SolidityError;

use smaug_guard_types::{BudgetScope, Policy, PolicyTuple};

use crate::{
    access::{authorize, Role},
    approvals::{self, PreApproval},
    balances::onchain::{BalanceSnapshot, Erc20Balances},
    errors::{GuardError, LimitBreach},
    hook::{self, CallEnv, GuardConfig},
    policy_store,
    safe::constants,
    schedule::{self, AppliedUpdates, UpdateSlot},
    store::GuardStore,
    usage::AssetState,
};

sol! {
    event ScheduledUpdateTTLSet(uint256 oldTTL, uint256 newTTL, uint256 activationTime);
    event ScheduledUpdateAssetProtection(
        address asset,
        uint256 activationTime,
        uint256 inDay,
        uint256 inBlock,
        uint256 inTX,
        uint256 inTotal
    );
    event TxApproved(bytes32 txHash, uint256 maturesAt);
    event TxRevoked(bytes32 txHash);

    event Initialized(address indexed admin, address indexed safe, uint256 ttl);
    event AssetProtected(
        address indexed asset,
        uint256 inDay,
        uint256 inBlock,
        uint256 inTX,
        uint256 inTotal
    );
    event TTLUpdated(uint256 oldTTL, uint256 newTTL);
    event AssetPolicyUpdated(
        address indexed asset,
        uint256 inDay,
        uint256 inBlock,
        uint256 inTX,
        uint256 inTotal
    );
    event PreApprovedTxExecuted(bytes32 indexed txHash);
}

sol! {
    error NotMySafe(address sender);
    error OwnableUnauthorizedAccount(address account);
    error DelegatecallNotAllowed();
    error UnsupportedOperation(uint8 operation);
    error GuardReentered();
    error TxBudgetExceeded(address asset, uint256 attempted, uint256 limit);
    error BlockBudgetExceeded(address asset, uint256 attempted, uint256 limit);
    error DailyBudgetExceeded(address asset, uint256 attempted, uint256 limit);
    error TotalBudgetExceeded(address asset, uint256 attempted, uint256 limit);
    error UpdateAlreadyScheduled();
    error AlreadyProtected(address asset);
    error UnknownAsset(address asset);
    error AlreadyApproved(bytes32 txHash);
    error NotApproved(bytes32 txHash);
    error AlreadyInitialized();
    error InvalidConfiguration();
    error BalanceUnavailable(address asset);
}

#[derive(SolidityError)]
pub enum SmaugError {
    NotMySafe(NotMySafe),
    OwnableUnauthorizedAccount(OwnableUnauthorizedAccount),
    DelegatecallNotAllowed(DelegatecallNotAllowed),
    UnsupportedOperation(UnsupportedOperation),
    GuardReentered(GuardReentered),
    TxBudgetExceeded(TxBudgetExceeded),
    BlockBudgetExceeded(BlockBudgetExceeded),
    DailyBudgetExceeded(DailyBudgetExceeded),
    TotalBudgetExceeded(TotalBudgetExceeded),
    UpdateAlreadyScheduled(UpdateAlreadyScheduled),
    AlreadyProtected(AlreadyProtected),
    UnknownAsset(UnknownAsset),
    AlreadyApproved(AlreadyApproved),
    NotApproved(NotApproved),
    AlreadyInitialized(AlreadyInitialized),
    InvalidConfiguration(InvalidConfiguration),
    BalanceUnavailable(BalanceUnavailable),
}

impl From<GuardError> for SmaugError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::NotMySafe { sender } => SmaugError::NotMySafe(NotMySafe { sender }),
            GuardError::Unauthorized { account } => {
                SmaugError::OwnableUnauthorizedAccount(OwnableUnauthorizedAccount { account })
            }
            GuardError::DelegatecallNotAllowed => {
                SmaugError::DelegatecallNotAllowed(DelegatecallNotAllowed {})
            }
            GuardError::UnsupportedOperation(operation) => {
                SmaugError::UnsupportedOperation(UnsupportedOperation { operation })
            }
            GuardError::GuardReentered => SmaugError::GuardReentered(GuardReentered {}),
            GuardError::BudgetExceeded { asset, breach } => budget_error(asset, breach),
            GuardError::UpdateAlreadyScheduled => {
                SmaugError::UpdateAlreadyScheduled(UpdateAlreadyScheduled {})
            }
            GuardError::AlreadyProtected(asset) => {
                SmaugError::AlreadyProtected(AlreadyProtected { asset })
            }
            GuardError::UnknownAsset(asset) => SmaugError::UnknownAsset(UnknownAsset { asset }),
            GuardError::AlreadyApproved(tx_hash) => {
                SmaugError::AlreadyApproved(AlreadyApproved { txHash: tx_hash })
            }
            GuardError::NotApproved(tx_hash) => {
                SmaugError::NotApproved(NotApproved { txHash: tx_hash })
            }
            GuardError::AlreadyInitialized => {
                SmaugError::AlreadyInitialized(AlreadyInitialized {})
            }
            GuardError::InvalidConfiguration => {
                SmaugError::InvalidConfiguration(InvalidConfiguration {})
            }
            GuardError::BalanceUnavailable { asset, .. } => {
                SmaugError::BalanceUnavailable(BalanceUnavailable { asset })
            }
        }
    }
}

fn budget_error(asset: Address, breach: LimitBreach) -> SmaugError {
    let LimitBreach {
        scope,
        attempted,
        limit,
    } = breach;
    match scope {
        BudgetScope::Transaction => {
            SmaugError::TxBudgetExceeded(TxBudgetExceeded { asset, attempted, limit })
        }
        BudgetScope::Block => {
            SmaugError::BlockBudgetExceeded(BlockBudgetExceeded { asset, attempted, limit })
        }
        BudgetScope::Day => {
            SmaugError::DailyBudgetExceeded(DailyBudgetExceeded { asset, attempted, limit })
        }
        BudgetScope::Total => {
            SmaugError::TotalBudgetExceeded(TotalBudgetExceeded { asset, attempted, limit })
        }
    }
}

sol_storage! {
    pub struct StoredPolicy {
        uint256 max_per_tx;
        uint256 max_per_block;
        uint256 max_per_day;
        uint256 max_total;
    }

    pub struct AssetRecord {
        bool protected;
        StoredPolicy policy;

        uint256 spent_this_block;
        uint64 block_of_window;
        uint256 spent_today;
        uint64 day_window_start;
        uint256 spent_total;

        /// Scratch slot written by the pre-check, read by the post-check.
        uint256 balance_before_call;

        bool update_pending;
        StoredPolicy next_policy;
        uint64 next_policy_activation;
    }

    pub struct ApprovalRecord {
        bool exists;
        uint64 registered_at;
        bool revoked;
        bool consumed;
    }

    #[entrypoint]
    pub struct SmaugGuard {
        bool initialized;
        address admin;
        address safe;
        uint64 ttl;

        bool ttl_update_pending;
        uint64 next_ttl;
        uint64 next_ttl_activation;

        /// Protected assets in insertion order.
        address[] asset_list;
        mapping(address => AssetRecord) assets;

        mapping(bytes32 => ApprovalRecord) approvals;

        /// Set between a pre-check and its post-check.
        bool check_open;
    }
}

impl StoredPolicy {
    fn to_policy(&self) -> Policy {
        Policy::new(
            self.max_per_tx.get(),
            self.max_per_block.get(),
            self.max_per_day.get(),
            self.max_total.get(),
        )
    }

    fn set_policy(&mut self, policy: &Policy) {
        self.max_per_tx.set(policy.max_per_tx);
        self.max_per_block.set(policy.max_per_block);
        self.max_per_day.set(policy.max_per_day);
        self.max_total.set(policy.max_total);
    }
}

fn ttl_from_abi(ttl: U256) -> Result<u64, GuardError> {
    if ttl > U256::from(u64::MAX) {
        return Err(GuardError::InvalidConfiguration);
    }
    Ok(ttl.to::<u64>())
}

impl GuardStore for SmaugGuard {
    fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn initialize(&mut self, admin: Address, safe: Address, ttl: u64) {
        self.initialized.set(true);
        self.admin.set(admin);
        self.safe.set(safe);
        self.ttl.set(U64::from(ttl));
    }

    fn admin(&self) -> Address {
        self.admin.get()
    }

    fn safe(&self) -> Address {
        self.safe.get()
    }

    fn ttl(&self) -> u64 {
        self.ttl.get().to::<u64>()
    }

    fn set_ttl(&mut self, ttl: u64) {
        self.ttl.set(U64::from(ttl));
    }

    fn pending_ttl(&self) -> UpdateSlot<u64> {
        if !self.ttl_update_pending.get() {
            return UpdateSlot::Idle;
        }
        UpdateSlot::Pending {
            value: self.next_ttl.get().to::<u64>(),
            activation_time: self.next_ttl_activation.get().to::<u64>(),
        }
    }

    fn set_pending_ttl(&mut self, slot: UpdateSlot<u64>) {
        match slot {
            UpdateSlot::Idle => {
                self.ttl_update_pending.set(false);
                self.next_ttl.set(U64::ZERO);
                self.next_ttl_activation.set(U64::ZERO);
            }
            UpdateSlot::Pending {
                value,
                activation_time,
            } => {
                self.ttl_update_pending.set(true);
                self.next_ttl.set(U64::from(value));
                self.next_ttl_activation.set(U64::from(activation_time));
            }
        }
    }

    fn protected_assets(&self) -> Vec<Address> {
        (0..self.asset_list.len())
            .filter_map(|i| self.asset_list.get(i))
            .collect()
    }

    fn asset_state(&self, asset: Address) -> Option<AssetState> {
        let record = self.assets.getter(asset);
        if !record.protected.get() {
            return None;
        }
        Some(AssetState {
            policy: record.policy.to_policy(),
            spent_this_block: record.spent_this_block.get(),
            block_of_window: record.block_of_window.get().to::<u64>(),
            spent_today: record.spent_today.get(),
            day_window_start: record.day_window_start.get().to::<u64>(),
            spent_total: record.spent_total.get(),
            balance_before_call: record.balance_before_call.get(),
        })
    }

    fn put_asset_state(&mut self, asset: Address, state: AssetState) {
        let mut record = self.assets.setter(asset);
        let is_new = !record.protected.get();
        record.protected.set(true);
        record.policy.set_policy(&state.policy);
        record.spent_this_block.set(state.spent_this_block);
        record.block_of_window.set(U64::from(state.block_of_window));
        record.spent_today.set(state.spent_today);
        record.day_window_start.set(U64::from(state.day_window_start));
        record.spent_total.set(state.spent_total);
        record.balance_before_call.set(state.balance_before_call);
        if is_new {
            self.asset_list.push(asset);
        }
    }

    fn pending_policy(&self, asset: Address) -> UpdateSlot<Policy> {
        let record = self.assets.getter(asset);
        if !record.update_pending.get() {
            return UpdateSlot::Idle;
        }
        UpdateSlot::Pending {
            value: record.next_policy.to_policy(),
            activation_time: record.next_policy_activation.get().to::<u64>(),
        }
    }

    fn set_pending_policy(&mut self, asset: Address, slot: UpdateSlot<Policy>) {
        let mut record = self.assets.setter(asset);
        match slot {
            UpdateSlot::Idle => {
                record.update_pending.set(false);
                record.next_policy.set_policy(&Policy::default());
                record.next_policy_activation.set(U64::ZERO);
            }
            UpdateSlot::Pending {
                value,
                activation_time,
            } => {
                record.update_pending.set(true);
                record.next_policy.set_policy(&value);
                record.next_policy_activation.set(U64::from(activation_time));
            }
        }
    }

    fn approval(&self, tx_hash: FixedBytes<32>) -> Option<PreApproval> {
        let record = self.approvals.getter(tx_hash);
        if !record.exists.get() {
            return None;
        }
        Some(PreApproval {
            registered_at: record.registered_at.get().to::<u64>(),
            revoked: record.revoked.get(),
            consumed: record.consumed.get(),
        })
    }

    fn put_approval(&mut self, tx_hash: FixedBytes<32>, approval: PreApproval) {
        let mut record = self.approvals.setter(tx_hash);
        record.exists.set(true);
        record.registered_at.set(U64::from(approval.registered_at));
        record.revoked.set(approval.revoked);
        record.consumed.set(approval.consumed);
    }

    fn check_open(&self) -> bool {
        self.check_open.get()
    }

    fn set_check_open(&mut self, open: bool) {
        self.check_open.set(open);
    }
}

#[public]
impl SmaugGuard {
    /// One-time setup. `policies[i]` is `(inDay, inBlock, inTX, inTotal)` for `assets[i]`.
    pub fn initialize(
        &mut self,
        admin: Address,
        ttl: U256,
        safe: Address,
        assets: Vec<Address>,
        policies: Vec<PolicyTuple>,
    ) -> Result<(), SmaugError> {
        if assets.len() != policies.len() {
            return Err(GuardError::InvalidConfiguration.into());
        }
        let config = GuardConfig {
            admin,
            safe,
            ttl: ttl_from_abi(ttl)?,
            assets: assets
                .iter()
                .copied()
                .zip(policies.into_iter().map(Policy::from_abi))
                .collect(),
        };
        hook::setup(self, &config)?;

        log(self.vm(), Initialized { admin, safe, ttl });
        for (asset, policy) in &config.assets {
            let (day, block, tx, total) = policy.to_abi();
            log(
                self.vm(),
                AssetProtected {
                    asset: *asset,
                    inDay: day,
                    inBlock: block,
                    inTX: tx,
                    inTotal: total,
                },
            );
        }
        Ok(())
    }

    /// Safe `ITransactionGuard.checkTransaction`.
    pub fn check_transaction(
        &mut self,
        _to: Address,
        _value: U256,
        _data: Bytes,
        operation: u8,
        _safe_tx_gas: U256,
        _base_gas: U256,
        _gas_price: U256,
        _gas_token: Address,
        _refund_receiver: Address,
        _signatures: Bytes,
        _msg_sender: Address,
    ) -> Result<(), SmaugError> {
        let env = self.call_env();
        let balances = self.safe_balances();
        let applied = hook::check_transaction(self, &balances, &env, operation)?;
        self.emit_applied(&applied);
        Ok(())
    }

    /// Safe `ITransactionGuard.checkAfterExecution`.
    pub fn check_after_execution(
        &mut self,
        hash: FixedBytes<32>,
        success: bool,
    ) -> Result<(), SmaugError> {
        let env = self.call_env();
        let balances = self.safe_balances();
        let settlement = match hook::check_after_execution(self, &balances, &env, hash, success) {
            Ok(s) => s,
            Err(err) => {
                #[cfg(feature = "debug")]
                stylus_sdk::console!("smaug: post-check rejected {:?}", err);
                return Err(err.into());
            }
        };
        self.emit_applied(&settlement.applied);
        if settlement.bypassed {
            log(self.vm(), PreApprovedTxExecuted { txHash: hash });
        }
        Ok(())
    }

    pub fn supports_interface(&self, interface_id: FixedBytes<4>) -> bool {
        constants::supports_interface(interface_id)
    }

    #[selector(name = "scheduleTTLUpdate")]
    pub fn schedule_ttl_update(&mut self, new_ttl: U256) -> Result<(), SmaugError> {
        let caller = self.vm().msg_sender();
        authorize(self, caller, Role::Admin)?;
        let new_ttl = ttl_from_abi(new_ttl)?;
        let now = self.vm().block_timestamp();

        let scheduled = schedule::schedule_ttl_update(self, caller, new_ttl, now)?;
        log(
            self.vm(),
            ScheduledUpdateTTLSet {
                oldTTL: U256::from(scheduled.old_ttl),
                newTTL: U256::from(scheduled.new_ttl),
                activationTime: U256::from(scheduled.activation_time),
            },
        );
        Ok(())
    }

    pub fn add_protected_asset(
        &mut self,
        asset: Address,
        policy: PolicyTuple,
    ) -> Result<(), SmaugError> {
        let caller = self.vm().msg_sender();
        policy_store::add_protected_asset(self, caller, asset, Policy::from_abi(policy))?;

        let (day, block, tx, total) = policy;
        log(
            self.vm(),
            AssetProtected {
                asset,
                inDay: day,
                inBlock: block,
                inTX: tx,
                inTotal: total,
            },
        );
        Ok(())
    }

    pub fn schedule_policy_update(
        &mut self,
        asset: Address,
        policy: PolicyTuple,
    ) -> Result<(), SmaugError> {
        let caller = self.vm().msg_sender();
        let now = self.vm().block_timestamp();
        let activation_time =
            schedule::schedule_policy_update(self, caller, asset, Policy::from_abi(policy), now)?;

        let (day, block, tx, total) = policy;
        log(
            self.vm(),
            ScheduledUpdateAssetProtection {
                asset,
                activationTime: U256::from(activation_time),
                inDay: day,
                inBlock: block,
                inTX: tx,
                inTotal: total,
            },
        );
        Ok(())
    }

    pub fn pre_approve_tx(&mut self, tx_hash: FixedBytes<32>) -> Result<(), SmaugError> {
        let caller = self.vm().msg_sender();
        let now = self.vm().block_timestamp();
        let matures_at = approvals::pre_approve(self, caller, tx_hash, now)?;
        log(
            self.vm(),
            TxApproved {
                txHash: tx_hash,
                maturesAt: U256::from(matures_at),
            },
        );
        Ok(())
    }

    pub fn revoke_pre_approved_tx(&mut self, tx_hash: FixedBytes<32>) -> Result<(), SmaugError> {
        let caller = self.vm().msg_sender();
        if approvals::revoke(self, caller, tx_hash)? {
            log(self.vm(), TxRevoked { txHash: tx_hash });
        }
        Ok(())
    }

    #[selector(name = "getTTL")]
    pub fn get_ttl(&self) -> U256 {
        U256::from(GuardStore::ttl(self))
    }

    /// `(inDay, inBlock, inTX, inTotal)`.
    pub fn get_asset_policy(&self, asset: Address) -> Result<PolicyTuple, SmaugError> {
        Ok(policy_store::policy_of(self, asset)?.to_abi())
    }

    pub fn owner(&self) -> Address {
        GuardStore::admin(self)
    }

    #[selector(name = "safe")]
    pub fn guarded_safe(&self) -> Address {
        GuardStore::safe(self)
    }

    pub fn get_protected_assets(&self) -> Vec<Address> {
        self.protected_assets()
    }

    /// `(spentThisBlock, spentToday, spentTotal)` as seen by a transaction in the current block.
    pub fn get_asset_usage(&self, asset: Address) -> Result<(U256, U256, U256), SmaugError> {
        let state = self.asset_state(asset).ok_or(GuardError::UnknownAsset(asset))?;
        let usage = state.effective_usage(self.vm().block_number(), self.vm().block_timestamp());
        Ok((usage.spent_this_block, usage.spent_today, usage.spent_total))
    }

    /// `(pending, newTTL, activationTime)`.
    #[selector(name = "getScheduledTTLUpdate")]
    pub fn get_scheduled_ttl_update(&self) -> (bool, U256, U256) {
        match self.pending_ttl() {
            UpdateSlot::Pending {
                value,
                activation_time,
            } => (true, U256::from(value), U256::from(activation_time)),
            UpdateSlot::Idle => (false, U256::ZERO, U256::ZERO),
        }
    }

    /// `(pending, activationTime, (inDay, inBlock, inTX, inTotal))`.
    pub fn get_scheduled_policy_update(&self, asset: Address) -> (bool, U256, PolicyTuple) {
        match self.pending_policy(asset) {
            UpdateSlot::Pending {
                value,
                activation_time,
            } => (true, U256::from(activation_time), value.to_abi()),
            UpdateSlot::Idle => (false, U256::ZERO, Policy::default().to_abi()),
        }
    }

    /// `(registered, registeredAt, revoked, consumed, maturesAt)`.
    pub fn get_pre_approval(&self, tx_hash: FixedBytes<32>) -> (bool, U256, bool, bool, U256) {
        match self.approval(tx_hash) {
            Some(a) => (
                true,
                U256::from(a.registered_at),
                a.revoked,
                a.consumed,
                U256::from(a.matures_at(GuardStore::ttl(self))),
            ),
            None => (false, U256::ZERO, false, false, U256::ZERO),
        }
    }
}

impl SmaugGuard {
    fn call_env(&self) -> CallEnv {
        CallEnv {
            caller: self.vm().msg_sender(),
            block_number: self.vm().block_number(),
            timestamp: self.vm().block_timestamp(),
        }
    }

    /// The Safe's current balance of every protected asset.
    fn safe_balances(&self) -> BalanceSnapshot {
        Erc20Balances::new(self.vm()).snapshot(self.safe.get(), self.protected_assets())
    }

    fn emit_applied(&self, applied: &AppliedUpdates) {
        if let Some((old_ttl, new_ttl)) = applied.ttl {
            #[cfg(feature = "debug")]
            stylus_sdk::console!("smaug: ttl {} -> {}", old_ttl, new_ttl);
            log(
                self.vm(),
                TTLUpdated {
                    oldTTL: U256::from(old_ttl),
                    newTTL: U256::from(new_ttl),
                },
            );
        }
        for (asset, policy) in &applied.policies {
            #[cfg(feature = "debug")]
            stylus_sdk::console!("smaug: policy applied for {}", asset);
            let (day, block, tx, total) = policy.to_abi();
            log(
                self.vm(),
                AssetPolicyUpdated {
                    asset: *asset,
                    inDay: day,
                    inBlock: block,
                    inTX: tx,
                    inTotal: total,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safe::interfaces::IERC20;
    use alloy_sol_types::{SolCall, SolEvent};
    use stylus_sdk::{alloy_primitives::address, testing::*};

    const ADMIN: Address = address!("f52e5df676f51e410c456cc34360ca6f27959420");
    const SAFE: Address = address!("00000000000000000000000000000000000000b2");
    const STRANGER: Address = address!("00000000000000000000000000000000000000e5");
    const TOKEN: Address = address!("00000000000000000000000000000000000000c3");
    const TTL: u64 = 86_400;
    const T0: u64 = 1_700_000_000;

    fn units(v: u64) -> U256 {
        U256::from(v)
    }

    /// `(inDay, inBlock, inTX, inTotal)`
    fn limits() -> PolicyTuple {
        (units(1000), units(100), units(50), units(10_000))
    }

    /// A guard with no protected assets, so guard calls never leave the contract.
    fn deployed(vm: &TestVM) -> SmaugGuard {
        vm.set_block_timestamp(T0);
        vm.set_block_number(1);
        vm.set_sender(ADMIN);
        let mut guard = SmaugGuard::from(vm);
        assert!(guard.initialize(ADMIN, units(TTL), SAFE, vec![], vec![]).is_ok());
        guard
    }

    /// Every emitted `E`, oldest first.
    fn events<E: SolEvent>(vm: &TestVM) -> Vec<E> {
        vm.get_emitted_logs()
            .iter()
            .filter(|(topics, _)| topics.first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|(topics, data)| E::decode_raw_log(topics.iter().copied(), data, true).ok())
            .collect()
    }

    fn mock_safe_balance(vm: &TestVM, amount: u64) {
        vm.mock_static_call(
            TOKEN,
            IERC20::balanceOfCall { account: SAFE }.abi_encode(),
            Ok(units(amount).to_be_bytes::<32>().to_vec()),
        );
    }

    fn call_as_safe(guard: &mut SmaugGuard, operation: u8) -> Result<(), SmaugError> {
        guard.check_transaction(
            TOKEN,
            U256::ZERO,
            Bytes::from(vec![]),
            operation,
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
            Address::ZERO,
            Address::ZERO,
            Bytes::from(vec![]),
            SAFE,
        )
    }

    #[test]
    fn test_initialize_once() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert_eq!(guard.owner(), ADMIN);
        assert_eq!(guard.guarded_safe(), SAFE);
        assert_eq!(guard.get_ttl(), units(TTL));

        let again = guard.initialize(STRANGER, units(1), STRANGER, vec![], vec![]);
        assert!(matches!(again, Err(SmaugError::AlreadyInitialized(_))));
        assert_eq!(guard.owner(), ADMIN);
    }

    #[test]
    fn test_initialize_rejects_mismatched_policies() {
        let vm = TestVM::default();
        let mut guard = SmaugGuard::from(&vm);
        let result = guard.initialize(ADMIN, units(TTL), SAFE, vec![TOKEN], vec![]);
        assert!(matches!(result, Err(SmaugError::InvalidConfiguration(_))));

        let too_long = U256::from(u64::MAX) + U256::from(1u64);
        let result = guard.initialize(ADMIN, too_long, SAFE, vec![], vec![]);
        assert!(matches!(result, Err(SmaugError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_capabilities() {
        let vm = TestVM::default();
        let guard = deployed(&vm);
        assert!(guard.supports_interface(FixedBytes([0xe6, 0xd7, 0xa8, 0x3a])));
        assert!(guard.supports_interface(FixedBytes([0x01, 0xff, 0xc9, 0xa7])));
        assert!(!guard.supports_interface(FixedBytes([0xff, 0xff, 0xff, 0xff])));
    }

    #[test]
    fn test_admin_surface_rejects_strangers() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        vm.set_sender(STRANGER);

        assert!(matches!(
            guard.add_protected_asset(TOKEN, limits()),
            Err(SmaugError::OwnableUnauthorizedAccount(_))
        ));
        assert!(matches!(
            guard.schedule_ttl_update(units(60)),
            Err(SmaugError::OwnableUnauthorizedAccount(_))
        ));
        assert!(matches!(
            guard.pre_approve_tx(FixedBytes::ZERO),
            Err(SmaugError::OwnableUnauthorizedAccount(_))
        ));
    }

    #[test]
    fn test_asset_policy_roundtrip() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.add_protected_asset(TOKEN, limits()).is_ok());

        assert_eq!(guard.get_asset_policy(TOKEN).ok(), Some(limits()));
        assert_eq!(guard.get_protected_assets(), vec![TOKEN]);
        assert_eq!(guard.get_asset_usage(TOKEN).ok(), Some((U256::ZERO, U256::ZERO, U256::ZERO)));
        assert!(matches!(
            guard.add_protected_asset(TOKEN, limits()),
            Err(SmaugError::AlreadyProtected(_))
        ));
        assert!(matches!(
            guard.get_asset_policy(STRANGER),
            Err(SmaugError::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_scheduled_policy_view() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.add_protected_asset(TOKEN, limits()).is_ok());
        let bigger = (units(2000), units(200), units(150), units(20_000));
        assert!(guard.schedule_policy_update(TOKEN, bigger).is_ok());

        assert_eq!(guard.get_scheduled_policy_update(TOKEN), (true, units(T0 + TTL), bigger));
        assert!(matches!(
            guard.schedule_policy_update(TOKEN, bigger),
            Err(SmaugError::UpdateAlreadyScheduled(_))
        ));
        assert_eq!(guard.get_asset_policy(TOKEN).ok(), Some(limits()));
    }

    #[test]
    fn test_guard_calls_require_the_safe() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);

        vm.set_sender(STRANGER);
        assert!(matches!(call_as_safe(&mut guard, 0), Err(SmaugError::NotMySafe(_))));
        assert!(matches!(
            guard.check_after_execution(FixedBytes::ZERO, true),
            Err(SmaugError::NotMySafe(_))
        ));

        vm.set_sender(SAFE);
        assert!(matches!(
            call_as_safe(&mut guard, 1),
            Err(SmaugError::DelegatecallNotAllowed(_))
        ));
        assert!(call_as_safe(&mut guard, 0).is_ok());
        assert!(matches!(call_as_safe(&mut guard, 0), Err(SmaugError::GuardReentered(_))));
        assert!(guard.check_after_execution(FixedBytes::ZERO, true).is_ok());
    }

    #[test]
    fn test_ttl_update_applied_by_guard_call() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.schedule_ttl_update(units(43_200)).is_ok());
        assert_eq!(guard.get_scheduled_ttl_update(), (true, units(43_200), units(T0 + TTL)));
        assert!(matches!(
            guard.schedule_ttl_update(units(21_600)),
            Err(SmaugError::UpdateAlreadyScheduled(_))
        ));

        vm.set_sender(SAFE);
        assert!(call_as_safe(&mut guard, 0).is_ok());
        assert!(guard.check_after_execution(FixedBytes::ZERO, true).is_ok());
        assert_eq!(guard.get_ttl(), units(TTL));

        vm.set_block_timestamp(T0 + TTL);
        vm.set_block_number(2);
        assert!(call_as_safe(&mut guard, 0).is_ok());
        assert_eq!(guard.get_ttl(), units(43_200));
        assert_eq!(guard.get_scheduled_ttl_update(), (false, U256::ZERO, U256::ZERO));

        let applied = vm
            .get_emitted_logs()
            .iter()
            .any(|(topics, _)| topics.first() == Some(&TTLUpdated::SIGNATURE_HASH));
        assert!(applied);
    }

    #[test]
    fn test_pre_approval_lifecycle() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        let hash = FixedBytes::from([0x11u8; 32]);

        assert!(guard.pre_approve_tx(hash).is_ok());
        assert_eq!(
            guard.get_pre_approval(hash),
            (true, units(T0), false, false, units(T0 + TTL))
        );
        assert!(matches!(guard.pre_approve_tx(hash), Err(SmaugError::AlreadyApproved(_))));

        assert!(guard.revoke_pre_approved_tx(hash).is_ok());
        assert!(guard.get_pre_approval(hash).2);
        // Second revoke is a silent no-op.
        assert!(guard.revoke_pre_approved_tx(hash).is_ok());

        let unknown = FixedBytes::from([0x22u8; 32]);
        assert!(matches!(
            guard.revoke_pre_approved_tx(unknown),
            Err(SmaugError::NotApproved(_))
        ));

        vm.set_block_timestamp(T0 + 10);
        assert!(guard.pre_approve_tx(hash).is_ok());
        assert_eq!(guard.get_pre_approval(hash).1, units(T0 + 10));
    }

    #[test]
    fn test_schedule_events() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.add_protected_asset(TOKEN, limits()).is_ok());

        vm.set_block_timestamp(T0 + 5);
        assert!(guard.schedule_ttl_update(units(3600)).is_ok());
        let ttl = events::<ScheduledUpdateTTLSet>(&vm);
        assert_eq!(ttl.len(), 1);
        assert_eq!(ttl[0].oldTTL, units(TTL));
        assert_eq!(ttl[0].newTTL, units(3600));
        assert_eq!(ttl[0].activationTime, units(T0 + 5 + TTL));

        let bigger = (units(2000), units(200), units(150), units(20_000));
        assert!(guard.schedule_policy_update(TOKEN, bigger).is_ok());
        let policy = events::<ScheduledUpdateAssetProtection>(&vm);
        assert_eq!(policy.len(), 1);
        assert_eq!(policy[0].asset, TOKEN);
        assert_eq!(policy[0].activationTime, units(T0 + 5 + TTL));
        assert_eq!(
            (policy[0].inDay, policy[0].inBlock, policy[0].inTX, policy[0].inTotal),
            bigger
        );

        let protected = events::<AssetProtected>(&vm);
        assert_eq!(protected.len(), 1);
        assert_eq!(protected[0].asset, TOKEN);
        assert_eq!(protected[0].inTX, units(50));
    }

    #[test]
    fn test_approval_events() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        let hash = FixedBytes::from([0x33u8; 32]);

        assert!(guard.pre_approve_tx(hash).is_ok());
        let approved = events::<TxApproved>(&vm);
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].txHash, hash);
        assert_eq!(approved[0].maturesAt, units(T0 + TTL));

        assert!(guard.revoke_pre_approved_tx(hash).is_ok());
        assert!(guard.revoke_pre_approved_tx(hash).is_ok());
        let revoked = events::<TxRevoked>(&vm);
        assert_eq!(revoked.len(), 1);
        assert_eq!(revoked[0].txHash, hash);
    }

    #[test]
    fn test_guard_error_mapping() {
        let breach = |scope| GuardError::BudgetExceeded {
            asset: TOKEN,
            breach: LimitBreach {
                scope,
                attempted: units(101),
                limit: units(100),
            },
        };

        let tx = SmaugError::from(breach(BudgetScope::Transaction));
        assert!(matches!(
            tx,
            SmaugError::TxBudgetExceeded(ref e)
                if e.asset == TOKEN && e.attempted == units(101) && e.limit == units(100)
        ));
        assert!(matches!(
            SmaugError::from(breach(BudgetScope::Block)),
            SmaugError::BlockBudgetExceeded(_)
        ));
        assert!(matches!(
            SmaugError::from(breach(BudgetScope::Day)),
            SmaugError::DailyBudgetExceeded(_)
        ));
        assert!(matches!(
            SmaugError::from(breach(BudgetScope::Total)),
            SmaugError::TotalBudgetExceeded(_)
        ));

        assert!(matches!(
            SmaugError::from(GuardError::UnsupportedOperation(7)),
            SmaugError::UnsupportedOperation(ref e) if e.operation == 7
        ));
        assert!(matches!(
            SmaugError::from(GuardError::Unauthorized { account: STRANGER }),
            SmaugError::OwnableUnauthorizedAccount(ref e) if e.account == STRANGER
        ));
        assert!(matches!(
            SmaugError::from(GuardError::BalanceUnavailable {
                asset: TOKEN,
                reason: crate::errors::BalanceError::CallFailed,
            }),
            SmaugError::BalanceUnavailable(ref e) if e.asset == TOKEN
        ));
    }

    #[test]
    fn test_outflow_over_tx_limit_rejected() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.add_protected_asset(TOKEN, limits()).is_ok());

        vm.set_sender(SAFE);
        mock_safe_balance(&vm, 1000);
        assert!(call_as_safe(&mut guard, 0).is_ok());
        mock_safe_balance(&vm, 900);
        let result = guard.check_after_execution(FixedBytes::ZERO, true);
        assert!(matches!(
            result,
            Err(SmaugError::TxBudgetExceeded(ref e))
                if e.asset == TOKEN && e.attempted == units(100) && e.limit == units(50)
        ));

        // Within limits the outflow is recorded.
        mock_safe_balance(&vm, 900);
        assert!(call_as_safe(&mut guard, 0).is_ok());
        mock_safe_balance(&vm, 860);
        assert!(guard.check_after_execution(FixedBytes::ZERO, true).is_ok());
        assert_eq!(
            guard.get_asset_usage(TOKEN).ok(),
            Some((units(40), units(40), units(40)))
        );
    }

    #[test]
    fn test_unreadable_balance_fails_pre_check() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.add_protected_asset(TOKEN, limits()).is_ok());

        vm.set_sender(SAFE);
        vm.mock_static_call(
            TOKEN,
            IERC20::balanceOfCall { account: SAFE }.abi_encode(),
            Err(vec![]),
        );
        assert!(matches!(
            call_as_safe(&mut guard, 0),
            Err(SmaugError::BalanceUnavailable(ref e)) if e.asset == TOKEN
        ));
    }

    #[test]
    fn test_matured_pre_approval_bypasses_limits() {
        let vm = TestVM::default();
        let mut guard = deployed(&vm);
        assert!(guard.add_protected_asset(TOKEN, limits()).is_ok());
        let hash = FixedBytes::from([0x44u8; 32]);
        assert!(guard.pre_approve_tx(hash).is_ok());

        vm.set_block_timestamp(T0 + TTL);
        vm.set_block_number(2);
        vm.set_sender(SAFE);
        mock_safe_balance(&vm, 1000);
        assert!(call_as_safe(&mut guard, 0).is_ok());
        mock_safe_balance(&vm, 800);
        assert!(guard.check_after_execution(hash, true).is_ok());

        let executed = events::<PreApprovedTxExecuted>(&vm);
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].txHash, hash);
        assert!(guard.get_pre_approval(hash).3);
        // Only the lifetime counter moves.
        assert_eq!(
            guard.get_asset_usage(TOKEN).ok(),
            Some((U256::ZERO, U256::ZERO, units(200)))
        );

        // Consumed: the same hash is held to the limits again.
        mock_safe_balance(&vm, 800);
        assert!(call_as_safe(&mut guard, 0).is_ok());
        mock_safe_balance(&vm, 600);
        assert!(matches!(
            guard.check_after_execution(hash, true),
            Err(SmaugError::TxBudgetExceeded(_))
        ));
        assert_eq!(events::<PreApprovedTxExecuted>(&vm).len(), 1);
    }
}

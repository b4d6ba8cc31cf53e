use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use k256::{ecdsa::SigningKey, elliptic_curve::sec1::ToEncodedPoint};
use sha3::{Digest, Keccak256};
use smaug_guard_types::Policy;

use crate::types::{SafeTx, SetupConfig};

sol! {
    /// Policy tuple in wire order.
    struct Limits {
        uint256 inDay;
        uint256 inBlock;
        uint256 inTX;
        uint256 inTotal;
    }

    /// Payload the distribution factory forwards to `initialize`.
    struct SmaugSetup {
        address admin;
        uint256 ttl;
        address safe;
        address[] assets;
        Limits[] policies;
    }

    function initialize(
        address admin,
        uint256 ttl,
        address safe,
        address[] assets,
        Limits[] policies
    );
    function scheduleTTLUpdate(uint256 newTTL);
    function addProtectedAsset(address asset, Limits policy);
    function schedulePolicyUpdate(address asset, Limits policy);
    function preApproveTx(bytes32 txHash);
    function revokePreApprovedTx(bytes32 txHash);
}

pub const DOMAIN_SEPARATOR_TYPE: &[u8] = b"EIP712Domain(uint256 chainId,address verifyingContract)";
pub const SAFE_TX_TYPE: &[u8] = concat!(
    "SafeTx(address to,uint256 value,bytes data,uint8 operation,",
    "uint256 safeTxGas,uint256 baseGas,uint256 gasPrice,",
    "address gasToken,address refundReceiver,uint256 nonce)"
)
.as_bytes();

impl From<&Policy> for Limits {
    fn from(policy: &Policy) -> Self {
        let (day, block, tx, total) = policy.to_abi();
        Limits {
            inDay: day,
            inBlock: block,
            inTX: tx,
            inTotal: total,
        }
    }
}

fn split_assets(config: &SetupConfig) -> (Vec<Address>, Vec<Limits>) {
    config
        .assets
        .iter()
        .map(|(asset, policy)| (*asset, Limits::from(policy)))
        .unzip()
}

/// `abi.encode((admin, ttl, safe, assets, policies))`, the factory `instantiate` payload.
pub fn encode_setup_payload(config: &SetupConfig) -> Vec<u8> {
    let (assets, policies) = split_assets(config);
    SmaugSetup {
        admin: config.admin,
        ttl: U256::from(config.ttl),
        safe: config.safe,
        assets,
        policies,
    }
    .abi_encode()
}

/// Calldata for calling `initialize` on a freshly deployed guard directly.
pub fn encode_initialize_call(config: &SetupConfig) -> Vec<u8> {
    let (assets, policies) = split_assets(config);
    initializeCall {
        admin: config.admin,
        ttl: U256::from(config.ttl),
        safe: config.safe,
        assets,
        policies,
    }
    .abi_encode()
}

pub fn encode_schedule_ttl_update(new_ttl: u64) -> Vec<u8> {
    scheduleTTLUpdateCall {
        newTTL: U256::from(new_ttl),
    }
    .abi_encode()
}

pub fn encode_add_protected_asset(asset: Address, policy: &Policy) -> Vec<u8> {
    addProtectedAssetCall {
        asset,
        policy: policy.into(),
    }
    .abi_encode()
}

pub fn encode_schedule_policy_update(asset: Address, policy: &Policy) -> Vec<u8> {
    schedulePolicyUpdateCall {
        asset,
        policy: policy.into(),
    }
    .abi_encode()
}

pub fn encode_pre_approve(tx_hash: FixedBytes<32>) -> Vec<u8> {
    preApproveTxCall { txHash: tx_hash }.abi_encode()
}

pub fn encode_revoke(tx_hash: FixedBytes<32>) -> Vec<u8> {
    revokePreApprovedTxCall { txHash: tx_hash }.abi_encode()
}

pub(crate) fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(address.as_slice());
    word
}

pub fn safe_domain_separator(chain_id: u64, safe: Address) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 3);
    buf.extend_from_slice(keccak256_bytes(DOMAIN_SEPARATOR_TYPE).as_slice());
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&address_word(safe));
    keccak256_bytes(&buf)
}

/// Safe's `getTransactionHash`: the hash the Safe passes to `checkAfterExecution`, and the value
/// to register with `preApproveTx`.
pub fn safe_tx_hash(chain_id: u64, safe: Address, tx: &SafeTx) -> FixedBytes<32> {
    let mut struct_buf = Vec::with_capacity(32 * 11);
    struct_buf.extend_from_slice(keccak256_bytes(SAFE_TX_TYPE).as_slice());
    struct_buf.extend_from_slice(&address_word(tx.to));
    struct_buf.extend_from_slice(&tx.value.to_be_bytes::<32>());
    struct_buf.extend_from_slice(keccak256_bytes(&tx.data).as_slice());
    struct_buf.extend_from_slice(&U256::from(tx.operation).to_be_bytes::<32>());
    struct_buf.extend_from_slice(&tx.safe_tx_gas.to_be_bytes::<32>());
    struct_buf.extend_from_slice(&tx.base_gas.to_be_bytes::<32>());
    struct_buf.extend_from_slice(&tx.gas_price.to_be_bytes::<32>());
    struct_buf.extend_from_slice(&address_word(tx.gas_token));
    struct_buf.extend_from_slice(&address_word(tx.refund_receiver));
    struct_buf.extend_from_slice(&tx.nonce.to_be_bytes::<32>());
    let struct_hash = keccak256_bytes(&struct_buf);

    let mut final_buf = Vec::with_capacity(2 + 32 + 32);
    final_buf.extend_from_slice(b"\x19\x01");
    final_buf.extend_from_slice(safe_domain_separator(chain_id, safe).as_slice());
    final_buf.extend_from_slice(struct_hash.as_slice());
    keccak256_bytes(&final_buf)
}

/// 65-byte owner signature (`r || s || v`, `v` in {27, 28}) over a Safe tx hash, in the form
/// `execTransaction` accepts for an ECDSA owner.
pub fn sign_safe_tx_hash(
    hash: FixedBytes<32>,
    signing_key: &SigningKey,
) -> Result<Vec<u8>, k256::ecdsa::Error> {
    let (signature, recovery_id) = signing_key.sign_prehash_recoverable(hash.as_slice())?;
    let (r, s) = signature.split_bytes();

    let mut sig_bytes = Vec::with_capacity(65);
    sig_bytes.extend_from_slice(r.as_slice());
    sig_bytes.extend_from_slice(s.as_slice());
    sig_bytes.push(27 + recovery_id.to_byte());
    Ok(sig_bytes)
}

/// Ethereum address of the key that signs with `signing_key`.
pub fn signer_address(signing_key: &SigningKey) -> Address {
    let point = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256_bytes(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..32])
}

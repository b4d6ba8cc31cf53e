use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use smaug_guard_types::Policy;

/// JSON setup file for a new guard instance.
///
/// Amounts are strings so that 256-bit limits survive JSON; both decimal and `0x` hex are
/// accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupFile {
    pub admin: String,
    pub safe: String,
    /// Seconds.
    pub ttl: u64,
    #[serde(default)]
    pub assets: Vec<AssetLimits>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLimits {
    pub asset: String,
    #[serde(rename = "inTX")]
    pub in_tx: String,
    pub in_block: String,
    pub in_day: String,
    pub in_total: String,
}

/// Setup parameters with every field parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupConfig {
    pub admin: Address,
    pub safe: Address,
    pub ttl: u64,
    pub assets: Vec<(Address, Policy)>,
}

impl SetupFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid setup file")
    }

    pub fn resolve(&self) -> Result<SetupConfig> {
        let admin = parse_address(&self.admin).context("admin")?;
        let safe = parse_address(&self.safe).context("safe")?;
        if admin == Address::ZERO || safe == Address::ZERO {
            return Err(anyhow!("admin and safe must be non-zero addresses"));
        }

        let mut assets = Vec::with_capacity(self.assets.len());
        for limits in &self.assets {
            let asset = parse_address(&limits.asset).context("asset")?;
            if assets.iter().any(|(a, _)| *a == asset) {
                return Err(anyhow!("asset {asset} listed twice"));
            }
            let policy = Policy::new(
                parse_amount(&limits.in_tx).with_context(|| format!("inTX of {asset}"))?,
                parse_amount(&limits.in_block).with_context(|| format!("inBlock of {asset}"))?,
                parse_amount(&limits.in_day).with_context(|| format!("inDay of {asset}"))?,
                parse_amount(&limits.in_total).with_context(|| format!("inTotal of {asset}"))?,
            );
            assets.push((asset, policy));
        }

        Ok(SetupConfig {
            admin,
            safe,
            ttl: self.ttl,
            assets,
        })
    }
}

/// Safe transaction fields covered by the `SafeTx` EIP-712 hash.
#[derive(Clone, Debug, Default)]
pub struct SafeTx {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    /// 0 = call, 1 = delegatecall.
    pub operation: u8,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

pub fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim()).map_err(|e| anyhow!("invalid address {s:?}: {e}"))
}

/// Decimal, or hex with a `0x` prefix. `max` means `2^256 - 1`.
pub fn parse_amount(s: &str) -> Result<U256> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("max") {
        return Ok(U256::MAX);
    }
    U256::from_str(s).map_err(|e| anyhow!("invalid amount {s:?}: {e}"))
}

pub fn parse_bytes(s: &str) -> Result<Bytes> {
    let digits = s.trim().trim_start_matches("0x");
    let raw = hex::decode(digits).with_context(|| format!("invalid hex {s:?}"))?;
    Ok(Bytes::from(raw))
}

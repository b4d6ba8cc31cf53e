use std::{fs, path::PathBuf};

use alloy_primitives::{Address, FixedBytes, U256};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use k256::ecdsa::SigningKey;
use smaug_guard_types::Policy;

use smaug_guard_encoder::{
    encoder,
    types::{parse_address, parse_amount, parse_bytes, SafeTx, SetupFile},
};

/// Encode Smaug guard setup payloads and admin calldata, and compute Safe transaction hashes.
///
/// Everything is printed as `0x`-prefixed hex on stdout; nothing is sent to a network.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a JSON setup file.
    Setup {
        #[arg(long)]
        config: PathBuf,
        /// Emit `initialize(...)` calldata instead of the factory payload.
        #[arg(long)]
        calldata: bool,
    },

    /// `scheduleTTLUpdate(newTTL)` calldata.
    ScheduleTtl {
        #[arg(long)]
        ttl: u64,
    },

    /// `addProtectedAsset` or, with `--schedule`, `schedulePolicyUpdate` calldata.
    Policy {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        in_tx: String,
        #[arg(long)]
        in_block: String,
        #[arg(long)]
        in_day: String,
        #[arg(long)]
        in_total: String,
        #[arg(long)]
        schedule: bool,
    },

    /// Hash of a Safe transaction, as passed to `checkAfterExecution`.
    SafeTxHash {
        #[arg(long)]
        safe: String,
        #[arg(long, env = "CHAIN_ID")]
        chain_id: u64,
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "0")]
        value: String,
        #[arg(long, default_value = "0x")]
        data: String,
        #[arg(long, default_value_t = 0)]
        operation: u8,
        #[arg(long)]
        nonce: String,
    },

    /// `preApproveTx(txHash)` calldata.
    PreApprove {
        #[arg(long)]
        tx_hash: String,
    },

    /// `revokePreApprovedTx(txHash)` calldata.
    Revoke {
        #[arg(long)]
        tx_hash: String,
    },

    /// Owner signature over a Safe tx hash.
    Sign {
        #[arg(long)]
        tx_hash: String,
        /// Private key (hex string, 0x...).
        #[arg(long, env = "PKEY")]
        private_key: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Setup { config, calldata } => {
            let json = fs::read_to_string(&config)
                .with_context(|| format!("failed to read {}", config.display()))?;
            let setup = SetupFile::from_json(&json)?.resolve()?;
            let out = if calldata {
                encoder::encode_initialize_call(&setup)
            } else {
                encoder::encode_setup_payload(&setup)
            };
            print_hex(&out);
        }
        Command::ScheduleTtl { ttl } => print_hex(&encoder::encode_schedule_ttl_update(ttl)),
        Command::Policy {
            asset,
            in_tx,
            in_block,
            in_day,
            in_total,
            schedule,
        } => {
            let asset = parse_address(&asset)?;
            let policy = Policy::new(
                parse_amount(&in_tx)?,
                parse_amount(&in_block)?,
                parse_amount(&in_day)?,
                parse_amount(&in_total)?,
            );
            let out = if schedule {
                encoder::encode_schedule_policy_update(asset, &policy)
            } else {
                encoder::encode_add_protected_asset(asset, &policy)
            };
            print_hex(&out);
        }
        Command::SafeTxHash {
            safe,
            chain_id,
            to,
            value,
            data,
            operation,
            nonce,
        } => {
            let tx = SafeTx {
                to: parse_address(&to)?,
                value: parse_amount(&value)?,
                data: parse_bytes(&data)?,
                operation,
                nonce: parse_amount(&nonce)?,
                safe_tx_gas: U256::ZERO,
                base_gas: U256::ZERO,
                gas_price: U256::ZERO,
                gas_token: Address::ZERO,
                refund_receiver: Address::ZERO,
            };
            let hash = encoder::safe_tx_hash(chain_id, parse_address(&safe)?, &tx);
            print_hex(hash.as_slice());
        }
        Command::PreApprove { tx_hash } => {
            print_hex(&encoder::encode_pre_approve(parse_hash(&tx_hash)?))
        }
        Command::Revoke { tx_hash } => print_hex(&encoder::encode_revoke(parse_hash(&tx_hash)?)),
        Command::Sign { tx_hash, private_key } => {
            let key_bytes = parse_bytes(&private_key).context("private key")?;
            let signing_key = SigningKey::from_slice(&key_bytes)
                .map_err(|e| anyhow!("invalid private key: {e}"))?;
            let signature = encoder::sign_safe_tx_hash(parse_hash(&tx_hash)?, &signing_key)
                .map_err(|e| anyhow!("signing failed: {e}"))?;
            eprintln!("signer {}", encoder::signer_address(&signing_key));
            print_hex(&signature);
        }
    }
    Ok(())
}

fn parse_hash(s: &str) -> Result<FixedBytes<32>> {
    let raw = parse_bytes(s)?;
    if raw.len() != 32 {
        return Err(anyhow!("expected a 32-byte hash, got {} bytes", raw.len()));
    }
    Ok(FixedBytes::from_slice(&raw))
}

fn print_hex(bytes: &[u8]) {
    println!("0x{}", hex::encode(bytes));
}

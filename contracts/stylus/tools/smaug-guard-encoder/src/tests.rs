#[cfg(test)]
mod tests {
    use crate::encoder::{
        encode_initialize_call, encode_pre_approve, encode_revoke, encode_setup_payload,
        keccak256_bytes, safe_domain_separator, safe_tx_hash, sign_safe_tx_hash, signer_address,
        SmaugSetup, DOMAIN_SEPARATOR_TYPE, SAFE_TX_TYPE,
    };
    use crate::types::{SafeTx, SetupConfig, SetupFile};
    use alloy_primitives::{address, b256, Address, FixedBytes, U256};
    use alloy_sol_types::SolValue;
    use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
    use smaug_guard_types::Policy;

    const ADMIN: Address = address!("f52e5df676f51e410c456cc34360ca6f27959420");
    const SAFE: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
    const TOKEN: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

    fn selector(sig: &str) -> [u8; 4] {
        let h = keccak256_bytes(sig.as_bytes());
        [h[0], h[1], h[2], h[3]]
    }

    fn config() -> SetupConfig {
        SetupConfig {
            admin: ADMIN,
            safe: SAFE,
            ttl: 86_400,
            assets: vec![(
                TOKEN,
                Policy::new(
                    U256::from(10_000u64),
                    U256::from(50_000u64),
                    U256::from(100_000u64),
                    U256::from(1_000_000u64),
                ),
            )],
        }
    }

    #[test]
    fn test_setup_file_parsing() {
        let json = r#"{
            "admin": "0xf52e5df676f51e410c456cc34360ca6f27959420",
            "safe": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "ttl": 86400,
            "assets": [{
                "asset": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "inTX": "10000",
                "inBlock": "0xc350",
                "inDay": "100000",
                "inTotal": "1000000"
            }]
        }"#;
        let setup = SetupFile::from_json(json).unwrap().resolve().unwrap();
        assert_eq!(setup, config());

        let unlimited = json.replace("\"1000000\"", "\"max\"");
        let setup = SetupFile::from_json(&unlimited).unwrap().resolve().unwrap();
        assert_eq!(setup.assets[0].1.max_total, U256::MAX);
    }

    #[test]
    fn test_setup_file_rejects_bad_input() {
        let zero_admin = r#"{
            "admin": "0x0000000000000000000000000000000000000000",
            "safe": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "ttl": 60
        }"#;
        assert!(SetupFile::from_json(zero_admin).unwrap().resolve().is_err());

        let limits = r#"{"asset": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "inTX": "1", "inBlock": "1", "inDay": "1", "inTotal": "1"}"#;
        let duplicate = format!(
            r#"{{"admin": "0xf52e5df676f51e410c456cc34360ca6f27959420",
                "safe": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "ttl": 60, "assets": [{limits}, {limits}]}}"#
        );
        assert!(SetupFile::from_json(&duplicate).unwrap().resolve().is_err());

        let bad_amount = duplicate.replacen("\"inTX\": \"1\"", "\"inTX\": \"ten\"", 1);
        assert!(SetupFile::from_json(&bad_amount).unwrap().resolve().is_err());
    }

    #[test]
    fn test_setup_payload_layout() {
        let payload = encode_setup_payload(&config());

        // A dynamic tuple encoded as a single value starts with its offset.
        assert_eq!(U256::from_be_slice(&payload[0..32]), U256::from(32u64));
        assert_eq!(&payload[32 + 12..64], ADMIN.as_slice());
        assert_eq!(U256::from_be_slice(&payload[64..96]), U256::from(86_400u64));
        assert_eq!(&payload[96 + 12..128], SAFE.as_slice());

        let decoded = SmaugSetup::abi_decode(&payload, true).unwrap();
        assert_eq!(decoded.assets, vec![TOKEN]);
        let limits = &decoded.policies[0];
        assert_eq!(limits.inDay, U256::from(100_000u64));
        assert_eq!(limits.inBlock, U256::from(50_000u64));
        assert_eq!(limits.inTX, U256::from(10_000u64));
        assert_eq!(limits.inTotal, U256::from(1_000_000u64));
    }

    #[test]
    fn test_initialize_calldata_selector() {
        let calldata = encode_initialize_call(&config());
        assert_eq!(
            calldata[0..4],
            selector(concat!(
                "initialize(address,uint256,address,address[],",
                "(uint256,uint256,uint256,uint256)[])"
            ))
        );
    }

    #[test]
    fn test_registry_calldata() {
        let hash = FixedBytes::<32>::from([0xabu8; 32]);

        let approve = encode_pre_approve(hash);
        assert_eq!(approve.len(), 4 + 32);
        assert_eq!(approve[0..4], selector("preApproveTx(bytes32)"));
        assert_eq!(&approve[4..], hash.as_slice());

        let revoke = encode_revoke(hash);
        assert_eq!(revoke[0..4], selector("revokePreApprovedTx(bytes32)"));
    }

    #[test]
    fn test_safe_type_hashes() {
        assert_eq!(
            keccak256_bytes(SAFE_TX_TYPE),
            b256!("bb8310d486368db6bd6f849402fdd73ad53d316b5a4b2644ad6efe0f941286d8")
        );
        assert_eq!(
            keccak256_bytes(DOMAIN_SEPARATOR_TYPE),
            b256!("47e79534a245952e8b16893a336b85a3d9ea9fa8c573f3d803afb92a79469218")
        );
    }

    #[test]
    fn test_safe_tx_hash_binds_every_field() {
        let tx = SafeTx {
            to: TOKEN,
            value: U256::ZERO,
            data: vec![0xa9, 0x05, 0x9c, 0xbb].into(),
            nonce: U256::from(7u64),
            ..SafeTx::default()
        };
        let hash = safe_tx_hash(42161, SAFE, &tx);
        assert_eq!(hash, safe_tx_hash(42161, SAFE, &tx));

        assert_ne!(hash, safe_tx_hash(1, SAFE, &tx));
        assert_ne!(hash, safe_tx_hash(42161, ADMIN, &tx));

        let next = SafeTx {
            nonce: U256::from(8u64),
            ..tx.clone()
        };
        assert_ne!(hash, safe_tx_hash(42161, SAFE, &next));

        let delegate = SafeTx { operation: 1, ..tx };
        assert_ne!(hash, safe_tx_hash(42161, SAFE, &delegate));

        assert_ne!(safe_domain_separator(42161, SAFE), safe_domain_separator(42161, ADMIN));
    }

    #[test]
    fn test_owner_signature_recovers() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let signing_key = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            signer_address(&signing_key),
            address!("7e5f4552091a69125d5dfcb7b8c2659029395bdf")
        );

        let hash = safe_tx_hash(42161, SAFE, &SafeTx::default());
        let sig = sign_safe_tx_hash(hash, &signing_key).unwrap();
        assert_eq!(sig.len(), 65);
        assert!(sig[64] == 27 || sig[64] == 28);

        let signature = Signature::from_slice(&sig[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(sig[64] - 27).unwrap();
        let recovered =
            VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recovery_id).unwrap();
        assert_eq!(&recovered, signing_key.verifying_key());
    }
}

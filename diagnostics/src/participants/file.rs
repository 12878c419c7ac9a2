use std::fs;
use std::path::Path;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use serde_json::{Map, Value};

use crate::error::DiagnosticsError;

/// Read a participants file: a JSON object mapping each address to its hex
/// private key. Entries keep their order, so the first one is the hub.
pub fn read_participants_file(path: &Path) -> Result<Vec<(Address, LocalWallet)>, DiagnosticsError> {
    let contents = fs::read_to_string(path)?;
    let entries: Map<String, Value> = serde_json::from_str(&contents).map_err(|err| {
        DiagnosticsError::config(format!("Malformed participants file {path:?}: {err}"))
    })?;

    entries
        .into_iter()
        .map(|(address, key)| {
            let parsed_address = address.parse::<Address>().map_err(|err| {
                DiagnosticsError::config(format!("Invalid participant address {address}: {err}"))
            })?;
            let key = key.as_str().ok_or_else(|| {
                DiagnosticsError::config(format!("Private key for {address} is not a string"))
            })?;
            let wallet = key.parse::<LocalWallet>().map_err(|err| {
                DiagnosticsError::config(format!("Invalid private key for {address}: {err}"))
            })?;
            if wallet.address() != parsed_address {
                return Err(DiagnosticsError::config(format!(
                    "Private key for {address} belongs to {:?}",
                    wallet.address()
                )));
            }
            Ok((parsed_address, wallet))
        })
        .collect()
}

/// Write participants in the format read by [`read_participants_file`]
pub fn write_participants_file(
    path: &Path,
    participants: &[LocalWallet],
) -> Result<(), DiagnosticsError> {
    let entries: Map<String, Value> = participants
        .iter()
        .map(|wallet| {
            let key = format!("0x{}", hex::encode(wallet.signer().to_bytes()));
            (to_checksum(&wallet.address(), None), Value::String(key))
        })
        .collect();
    fs::write(path, serde_json::to_string_pretty(&entries)?)?;
    Ok(())
}

/// Deterministic accounts FOR TESTING ONLY: the private keys are the integers
/// `seed .. seed + count`. Concurrent generators must use disjoint ranges.
pub fn generate_participants(count: usize, seed: u64) -> Result<Vec<LocalWallet>, DiagnosticsError> {
    (0..count as u64)
        .map(|offset| {
            let secret = U256::from(seed).saturating_add(U256::from(offset));
            let mut key = [0u8; 32];
            secret.to_big_endian(&mut key);
            LocalWallet::from_bytes(&key).map_err(|err| {
                DiagnosticsError::config(format!("Cannot derive a key from {secret}: {err}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_participants_are_deterministic() {
        let first = generate_participants(5, 100).unwrap();
        let second = generate_participants(5, 100).unwrap();
        let addresses = |wallets: &[LocalWallet]| -> Vec<Address> {
            wallets.iter().map(|w| w.address()).collect()
        };
        assert_eq!(addresses(&first), addresses(&second));

        let shifted = generate_participants(5, 101).unwrap();
        assert_eq!(addresses(&first)[1..], addresses(&shifted)[..4]);
    }

    #[test]
    fn generated_key_encodes_the_seed() {
        let wallet = &generate_participants(1, 1).unwrap()[0];
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(wallet.signer().to_bytes().as_slice(), &expected);
        // well known address of private key 1
        assert_eq!(
            wallet.address(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn zero_key_is_rejected() {
        assert!(matches!(
            generate_participants(2, 0),
            Err(DiagnosticsError::Configuration(_))
        ));
    }

    #[test]
    fn written_file_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participants.json");
        let wallets = generate_participants(20, 100).unwrap();

        write_participants_file(&path, &wallets).unwrap();
        let loaded = read_participants_file(&path).unwrap();

        assert_eq!(loaded.len(), 20);
        for ((address, wallet), original) in loaded.iter().zip(&wallets) {
            assert_eq!(*address, original.address());
            assert_eq!(wallet.address(), original.address());
        }
    }

    #[test]
    fn reads_keys_without_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participants.json");
        let wallet = &generate_participants(1, 7).unwrap()[0];
        let contents = format!(
            r#"{{"{:?}": "{}"}}"#,
            wallet.address(),
            hex::encode(wallet.signer().to_bytes())
        );
        fs::write(&path, contents).unwrap();

        let loaded = read_participants_file(&path).unwrap();
        assert_eq!(loaded[0].0, wallet.address());
        assert_eq!(loaded[0].1.address(), wallet.address());
    }

    #[test]
    fn malformed_files_are_configuration_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participants.json");
        for contents in [
            "not json",
            r#"["0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"]"#,
            r#"{"not-an-address": "0x01"}"#,
            r#"{"0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf": 1}"#,
            r#"{"0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf": "0xzz"}"#,
            // private key 2 does not belong to the address of key 1
            r#"{"0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf": "0x0000000000000000000000000000000000000000000000000000000000000002"}"#,
        ] {
            fs::write(&path, contents).unwrap();
            assert!(
                matches!(
                    read_participants_file(&path),
                    Err(DiagnosticsError::Configuration(_))
                ),
                "{contents} should be rejected"
            );
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_participants_file(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(DiagnosticsError::Io(_))));
    }
}

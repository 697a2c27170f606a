//! Offline address format checks.
//!
//! Tron addresses are validated by the node (see `ports::tron_node`);
//! fiat-like rails have no address at all.

use alloy::primitives::Address;
use bitcoin::address::{Address as BtcAddress, NetworkUnchecked};
use bitcoin::Network;
use ed25519_dalek::VerifyingKey;

/// Well-formed `0x`-prefixed 20-byte hex address. Checksum not required.
pub fn is_evm_address(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.parse::<Address>().is_ok()
}

/// Base58 Ed25519 public key that decompresses to a curve point.
///
/// Off-curve keys (program-derived addresses) are rejected.
pub fn check_solana_address(address: &str) -> Result<(), String> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| format!("invalid Solana address encoding: {e}"))?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("invalid Solana address length: {} bytes", v.len()))?;
    VerifyingKey::from_bytes(&key)
        .map(|_| ())
        .map_err(|_| "invalid Solana address: public key is not on the ed25519 curve".to_string())
}

/// Legacy base58check (P2PKH/P2SH) or segwit Bitcoin address for the
/// selected network, checksum included.
pub fn is_btc_address(address: &str, testnet: bool) -> bool {
    let network = if testnet { Network::Testnet } else { Network::Bitcoin };
    address
        .parse::<BtcAddress<NetworkUnchecked>>()
        .is_ok_and(|a| a.is_valid_for_network(network))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_address_format() {
        assert!(is_evm_address("0x52908400098527886E0F7030069857D2E4169EE7"));
        assert!(is_evm_address("0x52908400098527886e0f7030069857d2e4169ee7"));
        assert!(!is_evm_address("52908400098527886e0f7030069857d2e4169ee7"));
        assert!(!is_evm_address("0x52908400098527886e0f7030069857d2e4169e"));
        assert!(!is_evm_address("0xZZ908400098527886e0f7030069857d2e4169ee7"));
        assert!(!is_evm_address(""));
    }

    #[test]
    fn test_solana_on_curve_key_accepted() {
        // System program id: all-zero bytes, which lies on the curve.
        assert!(check_solana_address("11111111111111111111111111111111").is_ok());
    }

    #[test]
    fn test_solana_off_curve_key_rejected() {
        // y = 2 has no matching x on edwards25519.
        let err = check_solana_address("8opHzTAnfzRpPEx21XtnrVTX28YQuCpAjcn1PczScKh").unwrap_err();
        assert!(err.contains("not on the ed25519 curve"));
    }

    #[test]
    fn test_solana_bad_encoding_rejected() {
        assert!(check_solana_address("0OIl").is_err());
        assert!(check_solana_address("1111").is_err());
    }

    #[test]
    fn test_btc_address_forms() {
        assert!(is_btc_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", false));
        assert!(is_btc_address("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", false));
        assert!(is_btc_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", false));
        assert!(!is_btc_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", true));
        assert!(!is_btc_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN3", false));
        assert!(is_btc_address("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx", true));
    }

    #[test]
    fn test_btc_bech32_checksum_enforced() {
        assert!(is_btc_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", false));
        // One character changed in the data part.
        assert!(!is_btc_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5", false));
        assert!(!is_btc_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdr", false));
    }
}

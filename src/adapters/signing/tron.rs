//! Tron Approval Signer
//!
//! Same secp256k1 key scheme as EVM, but the message is wrapped in the
//! `\x19TRON Signed Message:\n<len>` envelope before keccak-256 and the
//! address is base58check-encoded with the `0x41` prefix.

use alloy::hex;
use alloy::primitives::{keccak256, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;

use crate::domain::chain::Compatibility;
use crate::domain::error::GatewayError;
use crate::ports::signer::MessageSigner;

const TRON_ADDRESS_PREFIX: u8 = 0x41;
const TRON_MESSAGE_PREFIX: &str = "\x19TRON Signed Message:\n";

/// Digest Tron wallets sign for `message`.
pub fn tron_message_hash(message: &str) -> B256 {
    let envelope = format!("{TRON_MESSAGE_PREFIX}{}{message}", message.len());
    keccak256(envelope.as_bytes())
}

pub struct TronSigner {
    signer: PrivateKeySigner,
}

impl TronSigner {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_hex(key: &str) -> Result<Self, GatewayError> {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| GatewayError::Config(format!("invalid Tron signer key: {e}")))?;
        Ok(Self { signer })
    }
}

#[async_trait]
impl MessageSigner for TronSigner {
    fn family(&self) -> Compatibility {
        Compatibility::Tron
    }

    fn address(&self) -> String {
        let mut payload = Vec::with_capacity(21);
        payload.push(TRON_ADDRESS_PREFIX);
        payload.extend_from_slice(self.signer.address().as_slice());
        bs58::encode(payload).with_check().into_string()
    }

    async fn sign(&self, message: &str) -> Result<String, GatewayError> {
        let signature = self
            .signer
            .sign_hash_sync(&tron_message_hash(message))
            .map_err(|e| GatewayError::signing(format!("Tron signing failed: {e}")))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

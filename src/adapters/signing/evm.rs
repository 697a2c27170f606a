//! EVM Approval Signer — EIP-191 Personal Messages
//!
//! Signs with a local secp256k1 key. Output is the 65-byte `r || s || v`
//! signature as `0x`-prefixed hex, the encoding wallets return for
//! `personal_sign`.

use alloy::hex;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;

use crate::domain::chain::Compatibility;
use crate::domain::error::GatewayError;
use crate::ports::signer::MessageSigner;

pub struct EvmSigner {
    signer: PrivateKeySigner,
}

impl EvmSigner {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_hex(key: &str) -> Result<Self, GatewayError> {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| GatewayError::Config(format!("invalid EVM signer key: {e}")))?;
        Ok(Self { signer })
    }
}

#[async_trait]
impl MessageSigner for EvmSigner {
    fn family(&self) -> Compatibility {
        Compatibility::Evm
    }

    fn address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    async fn sign(&self, message: &str) -> Result<String, GatewayError> {
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| GatewayError::signing(format!("EVM signing failed: {e}")))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

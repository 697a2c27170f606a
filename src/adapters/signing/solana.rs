//! Solana Approval Signer — Detached Ed25519
//!
//! Every signature is verified against the signer's own public key
//! before it is returned. A failed self-check is fatal.

use alloy::hex;
use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::domain::chain::Compatibility;
use crate::domain::error::GatewayError;
use crate::ports::signer::MessageSigner;

pub struct SolanaSigner {
    key: SigningKey,
}

impl SolanaSigner {
    /// Accepts a base58 or hex secret: a 32-byte seed or a 64-byte keypair.
    pub fn from_secret(secret: &str) -> Result<Self, GatewayError> {
        let secret = secret.trim();
        let bytes = bs58::decode(secret)
            .into_vec()
            .ok()
            .filter(|b| b.len() == 32 || b.len() == 64)
            .or_else(|| hex::decode(secret).ok())
            .ok_or_else(|| GatewayError::Config("Solana signer key is neither base58 nor hex".into()))?;

        let key = match bytes.len() {
            32 => {
                let seed: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| GatewayError::Config("invalid Solana seed".into()))?;
                SigningKey::from_bytes(&seed)
            }
            64 => {
                let keypair: [u8; 64] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| GatewayError::Config("invalid Solana keypair".into()))?;
                SigningKey::from_keypair_bytes(&keypair).map_err(|_| {
                    GatewayError::Config("Solana keypair public half does not match secret".into())
                })?
            }
            n => {
                return Err(GatewayError::Config(format!(
                    "Solana signer key must be 32 or 64 bytes, got {n}"
                )));
            }
        };
        Ok(Self { key })
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

/// Strict verification of `signature` over `message`.
pub fn verify_signature(
    key: &VerifyingKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), GatewayError> {
    key.verify_strict(message, signature)
        .map_err(|_| GatewayError::signing("Solana signature failed post-sign verification"))
}

#[async_trait]
impl MessageSigner for SolanaSigner {
    fn family(&self) -> Compatibility {
        Compatibility::Sol
    }

    fn address(&self) -> String {
        bs58::encode(self.key.verifying_key().as_bytes()).into_string()
    }

    async fn sign(&self, message: &str) -> Result<String, GatewayError> {
        let signature = self.key.sign(message.as_bytes());
        verify_signature(&self.key.verifying_key(), message.as_bytes(), &signature)?;
        Ok(hex::encode(signature.to_bytes()))
    }
}

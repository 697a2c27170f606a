//! Operator Signer — Fiat Options Transaction Ids
//!
//! A fixed BIP-44 path of the service-operator mnemonic. The operator
//! signs a per-request seed; the SHA-256 of the hex signature is
//! rendered as lowercase hex and its first 32 characters (the leading
//! 16 digest bytes) become the opaque transaction id.

use alloy::hex;
use alloy::signers::local::coins_bip39::English;
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};
use alloy::signers::SignerSync;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::error::GatewayError;
use crate::ports::signer::{OperatorReceipt, OperatorSigner};

/// Derivation path of the backend operator identity.
pub const OPERATOR_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Length of the id in hex characters, not digest bytes.
const TRANSACTION_ID_LEN: usize = 32;

pub struct MnemonicOperator {
    signer: PrivateKeySigner,
}

impl MnemonicOperator {
    pub fn from_phrase(phrase: &str) -> Result<Self, GatewayError> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase.trim())
            .derivation_path(OPERATOR_DERIVATION_PATH)
            .and_then(|b| b.build())
            .map_err(|e| GatewayError::Config(format!("invalid operator mnemonic: {e}")))?;
        Ok(Self { signer })
    }
}

/// Transaction id derived from a hex signature.
pub fn transaction_id(signature_hex: &str) -> String {
    let digest = hex::encode(Sha256::digest(signature_hex.as_bytes()));
    digest[..TRANSACTION_ID_LEN].to_string()
}

#[async_trait]
impl OperatorSigner for MnemonicOperator {
    fn address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    async fn sign_transaction_id(&self, seed: &str) -> Result<OperatorReceipt, GatewayError> {
        let signature = self
            .signer
            .sign_message_sync(seed.as_bytes())
            .map_err(|e| GatewayError::signing(format!("operator signing failed: {e}")))?;
        let signature = format!("0x{}", hex::encode(signature.as_bytes()));
        Ok(OperatorReceipt {
            transaction_id: transaction_id(&signature),
            signature,
        })
    }
}

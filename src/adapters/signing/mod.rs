//! Signing Adapters - Local Key Material
//!
//! Concrete `MessageSigner`/`OperatorSigner` implementations. Keys come
//! from environment variables only and are never logged:
//! - `EVM_SIGNER_KEY`: hex secp256k1 key
//! - `SOLANA_SIGNER_KEY`: base58/hex Ed25519 seed or keypair
//! - `TRON_SIGNER_KEY`: hex secp256k1 key
//! - `OPERATOR_MNEMONIC`: BIP-39 phrase for the operator identity
//!
//! A missing variable leaves that family without a signer; requests
//! that need it fail with a signing error. A malformed one fails startup.

pub mod evm;
pub mod operator;
pub mod solana;
pub mod tron;

use std::sync::Arc;

use tracing::{info, warn};

pub use evm::EvmSigner;
pub use operator::MnemonicOperator;
pub use solana::SolanaSigner;
pub use tron::TronSigner;

use crate::domain::error::GatewayError;
use crate::ports::signer::OperatorSigner;
use crate::usecases::approval::ApprovalSigner;

pub const EVM_KEY_VAR: &str = "EVM_SIGNER_KEY";
pub const SOLANA_KEY_VAR: &str = "SOLANA_SIGNER_KEY";
pub const TRON_KEY_VAR: &str = "TRON_SIGNER_KEY";
pub const OPERATOR_MNEMONIC_VAR: &str = "OPERATOR_MNEMONIC";

/// Raw key material, usually read from the environment.
#[derive(Default, Clone)]
pub struct SignerKeys {
    pub evm: Option<String>,
    pub solana: Option<String>,
    pub tron: Option<String>,
    pub operator_mnemonic: Option<String>,
}

impl std::fmt::Debug for SignerKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerKeys")
            .field("evm", &self.evm.is_some())
            .field("solana", &self.solana.is_some())
            .field("tron", &self.tron.is_some())
            .field("operator_mnemonic", &self.operator_mnemonic.is_some())
            .finish()
    }
}

impl SignerKeys {
    /// Read every key variable; unset or empty means absent.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            evm: read(EVM_KEY_VAR),
            solana: read(SOLANA_KEY_VAR),
            tron: read(TRON_KEY_VAR),
            operator_mnemonic: read(OPERATOR_MNEMONIC_VAR),
        }
    }

    /// Build the approval signer dispatch from the keys present.
    pub fn into_approval_signer(self) -> Result<ApprovalSigner, GatewayError> {
        let mut dispatch = ApprovalSigner::new();

        if let Some(key) = self.evm.as_deref() {
            dispatch = dispatch.with_signer(Arc::new(EvmSigner::from_hex(key)?))?;
        }
        if let Some(key) = self.solana.as_deref() {
            dispatch = dispatch.with_signer(Arc::new(SolanaSigner::from_secret(key)?))?;
        }
        if let Some(key) = self.tron.as_deref() {
            dispatch = dispatch.with_signer(Arc::new(TronSigner::from_hex(key)?))?;
        }
        match self.operator_mnemonic.as_deref() {
            Some(phrase) => {
                let operator = MnemonicOperator::from_phrase(phrase)?;
                info!(operator = %operator.address(), "Operator signer loaded");
                dispatch = dispatch.with_operator(Arc::new(operator));
            }
            None => warn!("{OPERATOR_MNEMONIC_VAR} not set, fiat-origin submissions will fail"),
        }

        info!(families = ?dispatch.families(), "Approval signers loaded");
        Ok(dispatch)
    }
}

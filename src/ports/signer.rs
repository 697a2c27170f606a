//! Signer Ports - Approval and Operator Signing Capabilities
//!
//! Key material is local, but signing is modeled as an async capability
//! so hardware or remote signers can be swapped in.

use async_trait::async_trait;

use crate::domain::chain::Compatibility;
use crate::domain::error::GatewayError;

/// Signs approval messages for one chain family.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSigner: Send + Sync + 'static {
  /// Family this signer serves.
  fn family(&self) -> Compatibility;

  /// Signer address in the family's native encoding.
  fn address(&self) -> String;

  /// Sign a human-readable approval message.
  async fn sign(&self, message: &str) -> Result<String, GatewayError>;
}

/// Operator-signed opaque transaction id for fiat options payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorReceipt {
  pub signature: String,
  pub transaction_id: String,
}

/// The backend's fixed operator identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OperatorSigner: Send + Sync + 'static {
  fn address(&self) -> String;

  /// Sign `seed` and derive the transaction id from the signature.
  async fn sign_transaction_id(&self, seed: &str) -> Result<OperatorReceipt, GatewayError>;
}

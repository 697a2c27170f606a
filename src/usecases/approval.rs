//! Approval Signer Dispatch
//!
//! Picks the signer for an origin chain's compatibility family. The set
//! of signable families is closed: EVM, Solana and Tron. Anything else
//! is an explicit `Signing` error, never a silent skip.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::chain::{Chain, Compatibility};
use crate::domain::error::GatewayError;
use crate::ports::signer::{MessageSigner, OperatorReceipt, OperatorSigner};

/// Families an approval message can be signed for.
pub const SIGNABLE_FAMILIES: [Compatibility; 3] =
  [Compatibility::Evm, Compatibility::Sol, Compatibility::Tron];

/// Per-family approval signers plus the operator identity.
#[derive(Default)]
pub struct ApprovalSigner {
  signers: HashMap<Compatibility, Arc<dyn MessageSigner>>,
  operator: Option<Arc<dyn OperatorSigner>>,
}

impl ApprovalSigner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a family signer. Signers for unsignable families are refused.
  pub fn with_signer(mut self, signer: Arc<dyn MessageSigner>) -> Result<Self, GatewayError> {
    let family = signer.family();
    if !SIGNABLE_FAMILIES.contains(&family) {
      return Err(GatewayError::signing(format!("unsupported compatibility: {family}")));
    }
    self.signers.insert(family, signer);
    Ok(self)
  }

  pub fn with_operator(mut self, operator: Arc<dyn OperatorSigner>) -> Self {
    self.operator = Some(operator);
    self
  }

  pub fn families(&self) -> Vec<Compatibility> {
    SIGNABLE_FAMILIES
      .into_iter()
      .filter(|f| self.signers.contains_key(f))
      .collect()
  }

  /// Sign `message` for `origin`'s family.
  #[instrument(skip(self, origin, message), fields(chain = %origin.code, family = %origin.compatibility))]
  pub async fn sign(&self, origin: &Chain, message: &str) -> Result<String, GatewayError> {
    let family = origin.compatibility;
    if !SIGNABLE_FAMILIES.contains(&family) {
      return Err(GatewayError::signing(format!("unsupported compatibility: {family}")));
    }
    let signer = self
      .signers
      .get(&family)
      .ok_or_else(|| GatewayError::signing(format!("no signer configured for {family}")))?;

    let signature = signer.sign(message).await?;
    debug!(signer = %signer.address(), "Approval message signed");
    Ok(signature)
  }

  /// Operator-signed transaction id for a fiat options payload.
  #[instrument(skip(self, seed))]
  pub async fn sign_operator(&self, seed: &str) -> Result<OperatorReceipt, GatewayError> {
    let operator = self
      .operator
      .as_ref()
      .ok_or_else(|| GatewayError::signing("operator signer not configured"))?;
    operator.sign_transaction_id(seed).await
  }
}

//! Chain Backend Port - Settlement Backend Interface
//!
//! The backend executes and settles transactions; to the gateway it is
//! a black box reached over HTTP. It also owns the authoritative chain
//! registry, pool balances and TSS public keys.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::GatewayError;
use crate::domain::request::{HtlcParams, TransactionKind, TransactionMode};

/// Token entry as published by the backend registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteToken {
  pub symbol: String,
  #[serde(default)]
  pub address: String,
  /// Decimals arrive as a string ("6").
  pub decimals: String,
  #[serde(default)]
  pub pegged_to: Option<String>,
}

/// Chain entry as published by the backend registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteChain {
  #[serde(rename = "shortName")]
  pub code: String,
  #[serde(default)]
  pub disabled: bool,
  #[serde(default)]
  pub derivation_algorithm: Option<String>,
  #[serde(default)]
  pub is_evm: bool,
  #[serde(default)]
  pub tokens: Vec<RemoteToken>,
}

/// Liquidity held by the custody pool on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolBalance {
  pub chain: String,
  pub symbol: String,
  pub balance: String,
}

/// Threshold-signature public key for one derivation algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TssPublicKey {
  pub derivation_algorithm: String,
  pub public_key: String,
}

/// Normalized payload forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
  /// Signer identity claimed from the rotation pool.
  pub creator: String,
  pub origin_chain: String,
  pub origin_address: String,
  pub origin_symbol: String,
  pub target_chain: String,
  pub target_address: String,
  pub target_symbol: String,
  /// Decimal-shifted amount, e.g. "100.0".
  pub amount: String,
  /// Decimal-shifted fee.
  pub fee: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fee_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub approval_signature: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sender_public_key: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub htlc: Option<HtlcParams>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub transaction_id: Option<String>,
  /// Serialized options map.
  pub options: String,
  pub mode: TransactionMode,
}

/// Key/value attribute of a backend event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
  pub key: String,
  pub value: String,
}

/// Event emitted while the backend processed a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEvent {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub attributes: Vec<EventAttribute>,
}

impl BackendEvent {
  pub fn attribute(&self, key: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|a| a.key == key)
      .map(|a| a.value.as_str())
  }
}

/// Successful HTTP response from a submit call.
///
/// May still carry an application-level error event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
  #[serde(default)]
  pub tx_hash: Option<String>,
  #[serde(default)]
  pub events: Vec<BackendEvent>,
}

impl BackendResponse {
  /// First `error` event as `(code, content)`.
  pub fn application_error(&self) -> Option<(String, String)> {
    self.events.iter().find(|e| e.kind == "error").map(|e| {
      (
        e.attribute("code").unwrap_or("unknown").to_string(),
        e.attribute("content").unwrap_or("unknown backend error").to_string(),
      )
    })
  }
}

/// Trait for the settlement backend.
///
/// Transport failures (timeouts, connection errors, 5xx) MUST be reported
/// as `GatewayError::Transport` so the orchestrator can retry them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainBackend: Send + Sync + 'static {
  /// Fetch the backend's chain/token registry.
  async fn fetch_chains(&self) -> Result<Vec<RemoteChain>, GatewayError>;

  /// Current custody pool balances.
  async fn pool_balances(&self) -> Result<Vec<PoolBalance>, GatewayError>;

  /// TSS public keys the pool addresses derive from.
  async fn tss_public_keys(&self) -> Result<Vec<TssPublicKey>, GatewayError>;

  /// Submit a normalized transaction.
  async fn submit(
    &self,
    kind: TransactionKind,
    payload: &SubmitPayload,
  ) -> Result<BackendResponse, GatewayError>;
}

//! Tron Node Port - Remote Address Validation
//!
//! Tron address validity is delegated to a full node's
//! `wallet/validateaddress` RPC.

use async_trait::async_trait;

use crate::domain::error::GatewayError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TronNode: Send + Sync + 'static {
  /// Ask the node at `rpc_url` whether `address` is valid.
  async fn validate_address(&self, rpc_url: &str, address: &str) -> Result<bool, GatewayError>;
}

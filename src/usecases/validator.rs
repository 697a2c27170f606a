//! Transaction Validator - Route, Address and Token Checks
//!
//! Address validation dispatches on the chain's compatibility family.
//! Every check returns `GatewayError::Validation` on failure; none of
//! them panic or leak transport errors to the caller.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::registry::RegistrySnapshot;
use crate::domain::address::{check_solana_address, is_btc_address, is_evm_address};
use crate::domain::amount::FixedAmount;
use crate::domain::chain::{Chain, Compatibility, Location};
use crate::domain::error::GatewayError;
use crate::domain::request::{TransactionKind, TransactionRequest};
use crate::ports::tron_node::TronNode;

/// Validates requests against a registry snapshot.
pub struct TransactionValidator {
  tron: Arc<dyn TronNode>,
  testnet: bool,
}

impl TransactionValidator {
  pub fn new(tron: Arc<dyn TronNode>, testnet: bool) -> Self {
    Self { tron, testnet }
  }

  /// Amount/fee/decimals well-formed and kind-specific fields present.
  pub fn validate_shape(
    &self,
    kind: TransactionKind,
    request: &TransactionRequest,
  ) -> Result<(), GatewayError> {
    let amount = FixedAmount::parse(&request.amount, request.decimals, "amount")?;
    FixedAmount::parse(&request.fee, request.decimals, "fee")?;
    if amount.is_zero() {
      return Err(GatewayError::validation("amount must be greater than zero"));
    }
    if kind == TransactionKind::HtlcLock && request.htlc.is_none() {
      return Err(GatewayError::validation("htlc parameters are required for htlc-lock"));
    }
    Ok(())
  }

  /// Origin usable at origin, target usable at target, neither disabled.
  ///
  /// Short-circuits on the first failure.
  pub fn validate_route(
    &self,
    registry: &RegistrySnapshot,
    origin_chain: &str,
    target_chain: &str,
  ) -> Result<(), GatewayError> {
    if !registry.is_supported_chain(origin_chain, Location::Origin) {
      return Err(GatewayError::validation(format!(
        "origin chain not supported: {origin_chain}"
      )));
    }
    if !registry.is_supported_chain(target_chain, Location::Target) {
      return Err(GatewayError::validation(format!(
        "target chain not supported: {target_chain}"
      )));
    }
    if registry.is_disabled_chain(origin_chain) {
      return Err(GatewayError::validation(format!(
        "origin chain is disabled: {origin_chain}"
      )));
    }
    if registry.is_disabled_chain(target_chain) {
      return Err(GatewayError::validation(format!(
        "target chain is disabled: {target_chain}"
      )));
    }
    Ok(())
  }

  /// Validate `address` for `chain`'s family.
  #[instrument(skip(self, chain), fields(chain = %chain.code))]
  pub async fn validate_address(&self, address: &str, chain: &Chain) -> Result<(), GatewayError> {
    if chain.compatibility.is_fiat_like() {
      return Ok(());
    }
    if address.is_empty() {
      return Err(GatewayError::validation(format!(
        "address is required for chain {}",
        chain.code
      )));
    }

    match chain.compatibility {
      Compatibility::Evm => {
        if is_evm_address(address) {
          Ok(())
        } else {
          Err(GatewayError::validation(format!("invalid EVM address: {address}")))
        }
      }
      Compatibility::Sol => check_solana_address(address).map_err(GatewayError::Validation),
      Compatibility::Btc => {
        if is_btc_address(address, self.testnet) {
          Ok(())
        } else {
          Err(GatewayError::validation(format!("invalid Bitcoin address: {address}")))
        }
      }
      Compatibility::Tron => self.validate_tron_address(address, chain).await,
      Compatibility::Fiat | Compatibility::Bank | Compatibility::Cc => Ok(()),
    }
  }

  async fn validate_tron_address(&self, address: &str, chain: &Chain) -> Result<(), GatewayError> {
    let Some(rpc) = chain.primary_rpc() else {
      warn!("Tron chain has no RPC endpoint configured");
      return Err(GatewayError::validation("unknown error: invalid address"));
    };
    match self.tron.validate_address(rpc, address).await {
      Ok(true) => Ok(()),
      Ok(false) => Err(GatewayError::validation(format!("invalid Tron address: {address}"))),
      Err(e) => {
        warn!(error = %e, "Tron address validation failed");
        Err(GatewayError::validation("unknown error: invalid address"))
      }
    }
  }

  /// Both symbols must resolve to a token on their chain.
  pub fn validate_tokens(
    &self,
    registry: &RegistrySnapshot,
    origin_chain: &str,
    origin_symbol: &str,
    target_chain: &str,
    target_symbol: &str,
  ) -> Result<(), GatewayError> {
    for (chain, symbol, location) in [
      (origin_chain, origin_symbol, Location::Origin),
      (target_chain, target_symbol, Location::Target),
    ] {
      let token = registry.get_token(chain, symbol).ok_or_else(|| {
        GatewayError::validation(format!("token {symbol} not found on chain {chain}"))
      })?;
      if !token.supports(location) {
        return Err(GatewayError::validation(format!(
          "token {symbol} on chain {chain} is not available as {location}"
        )));
      }
    }
    Ok(())
  }

  /// Run every check in pipeline order.
  pub async fn validate(
    &self,
    registry: &RegistrySnapshot,
    kind: TransactionKind,
    request: &TransactionRequest,
  ) -> Result<(), GatewayError> {
    self.validate_shape(kind, request)?;
    self.validate_route(registry, &request.origin_chain, &request.target_chain)?;
    self.validate_addresses(registry, request).await?;
    self.validate_tokens(
      registry,
      &request.origin_chain,
      &request.origin_symbol,
      &request.target_chain,
      &request.target_symbol,
    )?;
    debug!("Request passed validation");
    Ok(())
  }

  /// Origin then target address, each against its own chain.
  ///
  /// Both chains must already have passed route validation.
  pub async fn validate_addresses(
    &self,
    registry: &RegistrySnapshot,
    request: &TransactionRequest,
  ) -> Result<(), GatewayError> {
    for (address, code) in [
      (&request.origin_address, &request.origin_chain),
      (&request.target_address, &request.target_chain),
    ] {
      let chain = registry
        .get_chain(code)
        .ok_or_else(|| GatewayError::validation(format!("unknown chain: {code}")))?;
      self.validate_address(address, chain).await?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use mockall::predicate::*;

  use super::*;
  use crate::domain::chain::Token;
  use crate::domain::filter::ChainFilterConfig;
  use crate::ports::chain_backend::MockChainBackend;
  use crate::ports::tron_node::MockTronNode;
  use crate::usecases::registry::ChainRegistry;

  fn chain(code: &str, compatibility: Compatibility) -> Chain {
    Chain {
      code: code.into(),
      name: code.into(),
      compatibility,
      decimals: 18,
      rpc_urls: vec![format!("https://rpc.{}", code.to_lowercase())],
      explorer: None,
      disabled: false,
      testnet: false,
      derivation_algorithm: None,
      is_evm: compatibility == Compatibility::Evm,
      tokens: vec![Token {
        symbol: "USDK".into(),
        address: String::new(),
        decimals: 6,
        pegged_to: "USD".into(),
        protocol: None,
        supported_locations: None,
      }],
      supported_locations: vec![Location::Origin, Location::Target],
    }
  }

  fn snapshot(mut chains: Vec<Chain>) -> RegistrySnapshot {
    if let Some(c) = chains.iter_mut().find(|c| c.code == "OFF") {
      c.disabled = true;
    }
    ChainRegistry::new(
      chains,
      false,
      ChainFilterConfig::default(),
      Arc::new(MockChainBackend::new()),
      Duration::from_secs(300),
      Duration::from_secs(5),
    )
    .snapshot()
  }

  fn validator(tron: MockTronNode) -> TransactionValidator {
    TransactionValidator::new(Arc::new(tron), false)
  }

  fn request() -> TransactionRequest {
    serde_json::from_value(serde_json::json!({
      "originChain": "ETH", "originAddress": "0x52908400098527886e0f7030069857d2e4169ee7",
      "originSymbol": "USDK", "targetChain": "POL",
      "targetAddress": "0x52908400098527886e0f7030069857d2e4169ee7", "targetSymbol": "USDK",
      "amount": "100000000", "decimals": 6
    }))
    .unwrap()
  }

  #[tokio::test]
  async fn test_evm_address_passes() {
    let v = validator(MockTronNode::new());
    let eth = chain("ETH", Compatibility::Evm);
    let addr = format!("0x{}", "ab".repeat(20));
    assert!(v.validate_address(&addr, &eth).await.is_ok());
    assert!(v.validate_address("0x1234", &eth).await.is_err());
  }

  #[tokio::test]
  async fn test_off_curve_solana_key_rejected() {
    let v = validator(MockTronNode::new());
    let sol = chain("SOL", Compatibility::Sol);
    let err = v
      .validate_address("8opHzTAnfzRpPEx21XtnrVTX28YQuCpAjcn1PczScKh", &sol)
      .await
      .unwrap_err();
    assert!(err.to_string().contains("Solana"));
    assert!(v
      .validate_address("11111111111111111111111111111111", &sol)
      .await
      .is_ok());
  }

  #[tokio::test]
  async fn test_fiat_address_skipped() {
    let v = validator(MockTronNode::new());
    assert!(v.validate_address("", &chain("FIAT", Compatibility::Fiat)).await.is_ok());
    assert!(v.validate_address("", &chain("CC", Compatibility::Cc)).await.is_ok());
  }

  #[tokio::test]
  async fn test_tron_delegates_to_node() {
    let mut tron = MockTronNode::new();
    tron
      .expect_validate_address()
      .with(eq("https://rpc.trx"), eq("TGood"))
      .returning(|_, _| Ok(true));
    tron
      .expect_validate_address()
      .with(always(), eq("TBad"))
      .returning(|_, _| Ok(false));
    tron
      .expect_validate_address()
      .with(always(), eq("TDown"))
      .returning(|_, _| Err(GatewayError::transport("node unreachable")));

    let v = validator(tron);
    let trx = chain("TRX", Compatibility::Tron);
    assert!(v.validate_address("TGood", &trx).await.is_ok());
    assert!(v.validate_address("TBad", &trx).await.unwrap_err().to_string().contains("invalid Tron"));
    let err = v.validate_address("TDown", &trx).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown error: invalid address");
    assert!(!err.is_retryable());
  }

  #[test]
  fn test_route_reports_missing_target() {
    let snap = snapshot(vec![chain("ETH", Compatibility::Evm)]);
    let v = validator(MockTronNode::new());
    let err = v.validate_route(&snap, "ETH", "POL").unwrap_err();
    assert_eq!(err.to_string(), "target chain not supported: POL");
  }

  #[test]
  fn test_route_rejects_disabled_chain() {
    let snap = snapshot(vec![chain("ETH", Compatibility::Evm), chain("OFF", Compatibility::Evm)]);
    let v = validator(MockTronNode::new());
    let err = v.validate_route(&snap, "OFF", "ETH").unwrap_err();
    assert!(err.to_string().contains("disabled"));
  }

  #[test]
  fn test_unknown_token_names_symbol_and_chain() {
    let snap = snapshot(vec![chain("ETH", Compatibility::Evm), chain("POL", Compatibility::Evm)]);
    let v = validator(MockTronNode::new());
    let err = v.validate_tokens(&snap, "ETH", "USDK", "POL", "WBTC").unwrap_err();
    assert_eq!(err.to_string(), "token WBTC not found on chain POL");
  }

  #[test]
  fn test_shape_checks() {
    let v = validator(MockTronNode::new());
    assert!(v.validate_shape(TransactionKind::Transfer, &request()).is_ok());

    let mut negative = request();
    negative.amount = "-5".into();
    assert!(v.validate_shape(TransactionKind::Transfer, &negative).is_err());

    let mut too_precise = request();
    too_precise.decimals = 19;
    assert!(v.validate_shape(TransactionKind::Transfer, &too_precise).is_err());

    assert!(v.validate_shape(TransactionKind::HtlcLock, &request()).is_err());
  }

  #[test]
  fn test_shape_rejects_unrenderable_amounts() {
    let v = validator(MockTronNode::new());

    let mut huge = request();
    huge.amount = "100000000000000000000000000000".into();
    huge.decimals = 18;
    let err = v.validate_shape(TransactionKind::Transfer, &huge).unwrap_err();
    assert_eq!(err.to_string(), "amount is out of range: 100000000000000000000000000000");

    let mut huge_fee = request();
    huge_fee.fee = "100000000000000000000000000000".into();
    assert!(v.validate_shape(TransactionKind::Transfer, &huge_fee).is_err());
  }

  #[tokio::test]
  async fn test_full_validation_passes() {
    let snap = snapshot(vec![chain("ETH", Compatibility::Evm), chain("POL", Compatibility::Evm)]);
    let v = validator(MockTronNode::new());
    assert!(v.validate(&snap, TransactionKind::Transfer, &request()).await.is_ok());
  }
}

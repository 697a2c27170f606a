//! Compliance Gate - Batch Address Risk Screening
//!
//! One provider call per batch. Ordinary rejections and provider
//! failures both come back as a `ComplianceCheckResult`; only an empty
//! address list is an error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::compliance::{AddressCheck, ComplianceCheckResult, RiskLevel};
use crate::domain::error::GatewayError;
use crate::ports::risk_provider::RiskProvider;

/// Gate in front of the risk provider. No provider means the gate is open.
pub struct ComplianceGate {
  provider: Option<Arc<dyn RiskProvider>>,
}

impl ComplianceGate {
  pub fn new(provider: Option<Arc<dyn RiskProvider>>) -> Self {
    Self { provider }
  }

  /// Gate that passes everything without a network call.
  pub fn disabled() -> Self {
    Self { provider: None }
  }

  pub fn is_enabled(&self) -> bool {
    self.provider.is_some()
  }

  /// Screen `addresses` in a single provider call.
  #[instrument(skip(self), fields(count = addresses.len()))]
  pub async fn check(&self, addresses: &[String]) -> Result<ComplianceCheckResult, GatewayError> {
    let Some(provider) = &self.provider else {
      return Ok(ComplianceCheckResult::passed());
    };
    if addresses.is_empty() {
      return Err(GatewayError::validation("no addresses to screen"));
    }

    let entries = match provider.score(addresses).await {
      Ok(entries) => entries,
      Err(e) => {
        warn!(error = %e, "Risk provider call failed");
        return Ok(ComplianceCheckResult::provider_error(addresses, &e.to_string()));
      }
    };

    let scores: HashMap<&str, &str> = entries
      .iter()
      .map(|e| (e.address.as_str(), e.risk_score.as_str()))
      .collect();

    let checks = addresses
      .iter()
      .map(|address| match scores.get(address.as_str()) {
        Some(score) => AddressCheck::scored(address.clone(), RiskLevel::parse(score)),
        None => AddressCheck::failed(address.clone(), "address missing from provider response"),
      })
      .collect();

    let result = ComplianceCheckResult::from_checks(checks);
    info!(
      compliant = result.is_compliant,
      error = result.is_error,
      "Compliance check complete"
    );
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ports::risk_provider::{MockRiskProvider, RiskScoreEntry};

  fn entry(address: &str, score: &str) -> RiskScoreEntry {
    RiskScoreEntry {
      address: address.into(),
      risk_score: score.into(),
    }
  }

  fn addrs(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[tokio::test]
  async fn test_disabled_gate_passes_without_call() {
    let gate = ComplianceGate::disabled();
    let result = gate.check(&addrs(&["A", "B"])).await.unwrap();
    assert!(result.is_compliant);
    assert!(!result.is_error);
  }

  #[tokio::test]
  async fn test_one_risky_address_fails_batch() {
    let mut provider = MockRiskProvider::new();
    provider
      .expect_score()
      .times(1)
      .returning(|_| Ok(vec![entry("A", "low"), entry("B", "high")]));

    let gate = ComplianceGate::new(Some(Arc::new(provider)));
    let result = gate.check(&addrs(&["A", "B"])).await.unwrap();

    assert!(!result.is_compliant);
    assert!(!result.is_error);
    assert_eq!(result.risky_addresses(), vec!["B"]);
    assert_eq!(result.results.len(), 2);
  }

  #[tokio::test]
  async fn test_unknown_tier_is_not_compliant() {
    let mut provider = MockRiskProvider::new();
    provider
      .expect_score()
      .returning(|_| Ok(vec![entry("A", "unrated")]));

    let gate = ComplianceGate::new(Some(Arc::new(provider)));
    let result = gate.check(&addrs(&["A"])).await.unwrap();
    assert!(!result.is_compliant);
    assert_eq!(result.risky_addresses(), vec!["A"]);
  }

  #[tokio::test]
  async fn test_provider_failure_marks_error() {
    let mut provider = MockRiskProvider::new();
    provider
      .expect_score()
      .returning(|_| Err(GatewayError::transport("timeout")));

    let gate = ComplianceGate::new(Some(Arc::new(provider)));
    let result = gate.check(&addrs(&["A", "B"])).await.unwrap();
    assert!(result.is_error);
    assert!(!result.is_compliant);
    assert_eq!(result.results.len(), 2);
    assert!(result.risky_addresses().is_empty());
  }

  #[tokio::test]
  async fn test_missing_entry_is_error_not_pass() {
    let mut provider = MockRiskProvider::new();
    provider.expect_score().returning(|_| Ok(vec![entry("A", "low")]));

    let gate = ComplianceGate::new(Some(Arc::new(provider)));
    let result = gate.check(&addrs(&["A", "B"])).await.unwrap();
    assert!(result.is_error);
    assert!(!result.is_compliant);
  }

  #[tokio::test]
  async fn test_empty_batch_rejected_when_enabled() {
    let gate = ComplianceGate::new(Some(Arc::new(MockRiskProvider::new())));
    assert!(gate.check(&[]).await.is_err());
  }
}

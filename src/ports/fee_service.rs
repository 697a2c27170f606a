//! Fee Service Port - Authoritative Fee Quotes
//!
//! The fee service prices gas and processing for an origin/target pair.
//! The gateway only adapts its quote into a typed `FeeResult`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::GatewayError;
use crate::domain::fee::FeeLeg;

/// Body of `POST /fees/calculate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuoteRequest {
  pub creator: String,
  pub origin_chain: String,
  /// Omitted for fiat-like origins.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub origin_address: Option<String>,
  pub origin_symbol: String,
  pub pegged_to: String,
  pub target_chain: String,
  pub target_address: String,
  pub target_symbol: String,
  pub amount: String,
  pub options: BTreeMap<String, serde_json::Value>,
}

/// Amounts for one fee-deduction variant, as quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedValues {
  pub allowance_amount: String,
  pub submit_amount: String,
}

/// Raw quote returned by the fee service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
  pub fee_id: String,
  pub origin_gas: FeeLeg,
  pub processing: FeeLeg,
  pub target_gas: FeeLeg,
  pub pegged_to: String,
  /// Unix seconds.
  pub expiration: i64,
  pub fee_from_origin: QuotedValues,
  pub fee_from_target: QuotedValues,
}

/// Trait for fee quotation providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeeService: Send + Sync + 'static {
  async fn calculate(&self, request: &FeeQuoteRequest) -> Result<FeeQuote, GatewayError>;
}

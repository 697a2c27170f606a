//! Fee Calculator - Typed Adapter over the Fee Service
//!
//! The fee service is authoritative for amounts. This use case resolves
//! the origin token's peg, normalizes fiat-like origins, and renders the
//! approval message for each fee-deduction variant so the quote carries
//! the exact text that will be signed.

use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, instrument};

use super::registry::RegistrySnapshot;
use crate::domain::amount::FixedAmount;
use crate::domain::error::GatewayError;
use crate::domain::fee::{ApprovalTerms, FeeResult, TransactionValues};
use crate::domain::request::TransactionRequest;
use crate::ports::fee_service::{FeeQuoteRequest, FeeService, QuotedValues};

/// Origin marker sent to the fee service for every fiat-like rail.
pub const FIAT_MARKER: &str = "FIAT";

pub struct FeeCalculator {
  service: Arc<dyn FeeService>,
  creator: String,
}

impl FeeCalculator {
  pub fn new(service: Arc<dyn FeeService>, creator: impl Into<String>) -> Self {
    Self {
      service,
      creator: creator.into(),
    }
  }

  /// Quote fees for `request` and attach the approval messages.
  #[instrument(skip(self, registry, request), fields(
    origin = %request.origin_chain,
    target = %request.target_chain,
  ))]
  pub async fn calc_service_fee(
    &self,
    registry: &RegistrySnapshot,
    request: &TransactionRequest,
  ) -> Result<FeeResult, GatewayError> {
    let quote_request = self.quote_request(registry, request)?;
    let origin_decimals = registry
      .get_token(&request.origin_chain, &request.origin_symbol)
      .map(|t| t.decimals)
      .ok_or_else(|| {
        GatewayError::validation(format!(
          "token {} not found on chain {}",
          request.origin_symbol, request.origin_chain
        ))
      })?;

    let quote = self.service.calculate(&quote_request).await?;

    let expiration = DateTime::from_timestamp(quote.expiration, 0).ok_or_else(|| {
      GatewayError::transport(format!("fee quote has invalid expiration {}", quote.expiration))
    })?;

    let values = |quoted: &QuotedValues| -> Result<TransactionValues, GatewayError> {
      FixedAmount::parse(&quoted.submit_amount, origin_decimals, "submitAmount")
        .map_err(|e| GatewayError::transport(format!("malformed fee quote: {e}")))?;
      let terms =
        ApprovalTerms::for_request(request, origin_decimals, &quote.fee_id, &quoted.allowance_amount)
          .map_err(|e| GatewayError::transport(format!("malformed fee quote: {e}")))?;
      Ok(TransactionValues {
        allowance_amount: quoted.allowance_amount.clone(),
        submit_amount: quoted.submit_amount.clone(),
        message: terms.message()?,
      })
    };

    let result = FeeResult {
      fee_id: quote.fee_id.clone(),
      origin_gas: quote.origin_gas.clone(),
      processing: quote.processing.clone(),
      target_gas: quote.target_gas.clone(),
      pegged_to: quote.pegged_to.clone(),
      expiration,
      fee_from_origin: values(&quote.fee_from_origin)?,
      fee_from_target: values(&quote.fee_from_target)?,
    };

    debug!(fee_id = %result.fee_id, "Fee quote received");
    Ok(result)
  }

  /// Fee service request body for `request`.
  pub fn quote_request(
    &self,
    registry: &RegistrySnapshot,
    request: &TransactionRequest,
  ) -> Result<FeeQuoteRequest, GatewayError> {
    let origin = registry.get_chain(&request.origin_chain).ok_or_else(|| {
      GatewayError::validation(format!("origin chain not supported: {}", request.origin_chain))
    })?;
    let token = origin.token(&request.origin_symbol).ok_or_else(|| {
      GatewayError::validation(format!(
        "token {} not found on chain {}",
        request.origin_symbol, request.origin_chain
      ))
    })?;
    let amount = FixedAmount::parse(&request.amount, request.decimals, "amount")?;

    let fiat = origin.compatibility.is_fiat_like();
    Ok(FeeQuoteRequest {
      creator: self.creator.clone(),
      origin_chain: if fiat {
        FIAT_MARKER.to_string()
      } else {
        request.origin_chain.clone()
      },
      origin_address: (!fiat).then(|| request.origin_address.clone()),
      origin_symbol: request.origin_symbol.clone(),
      pegged_to: token.pegged_to.clone(),
      target_chain: request.target_chain.clone(),
      target_address: request.target_address.clone(),
      target_symbol: request.target_symbol.clone(),
      amount: amount.to_decimal_string()?,
      options: request.options.clone(),
    })
  }
}

//! Fee quotes and the approval message they carry.
//!
//! `ApprovalTerms::message` is the only place the approval text is
//! rendered. The fee calculator embeds it in each `TransactionValues`,
//! and the orchestrator re-renders it from the same inputs before
//! signing, so the signed text and the executed amount cannot diverge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::FixedAmount;
use super::error::GatewayError;
use super::request::{FeeDeduction, TransactionRequest};

/// One fee leg in fiat and in token base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeLeg {
    pub fiat: String,
    pub amount: String,
}

/// Amounts and approval text for one fee-deduction variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionValues {
    /// Allowance the user grants, in origin token base units.
    pub allowance_amount: String,
    /// Amount the backend will execute, in origin token base units.
    pub submit_amount: String,
    /// Exact text that must be signed.
    pub message: String,
}

/// A time-bounded fee quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeResult {
    pub fee_id: String,
    pub origin_gas: FeeLeg,
    pub processing: FeeLeg,
    pub target_gas: FeeLeg,
    pub pegged_to: String,
    pub expiration: DateTime<Utc>,
    pub fee_from_origin: TransactionValues,
    pub fee_from_target: TransactionValues,
}

impl FeeResult {
    pub const fn values(&self, deduction: FeeDeduction) -> &TransactionValues {
        match deduction {
            FeeDeduction::Origin => &self.fee_from_origin,
            FeeDeduction::Target => &self.fee_from_target,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }
}

/// Everything the approval text depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalTerms {
    pub origin_chain: String,
    pub origin_symbol: String,
    pub target_chain: String,
    pub target_symbol: String,
    pub target_address: String,
    /// Allowance in origin token base units.
    pub allowance: FixedAmount,
    pub fee_id: String,
}

impl ApprovalTerms {
    /// Terms for `request` under a quote's allowance.
    ///
    /// `origin_decimals` are the origin token's registry decimals.
    pub fn for_request(
        request: &TransactionRequest,
        origin_decimals: u8,
        fee_id: &str,
        allowance_amount: &str,
    ) -> Result<Self, GatewayError> {
        let allowance = FixedAmount::parse(allowance_amount, origin_decimals, "allowanceAmount")?;
        Ok(Self {
            origin_chain: request.origin_chain.clone(),
            origin_symbol: request.origin_symbol.clone(),
            target_chain: request.target_chain.clone(),
            target_symbol: request.target_symbol.clone(),
            target_address: request.target_address.clone(),
            allowance,
            fee_id: fee_id.to_string(),
        })
    }

    pub fn message(&self) -> Result<String, GatewayError> {
        let amount = self.allowance.to_decimal_string()?;
        let recipient = if self.target_address.is_empty() {
            String::new()
        } else {
            format!(" for {}", self.target_address)
        };
        Ok(format!(
            "Approve {amount} {} on {} to be delivered as {} on {}{recipient}.\nFee ID: {}",
            self.origin_symbol, self.origin_chain, self.target_symbol, self.target_chain, self.fee_id,
        ))
    }
}

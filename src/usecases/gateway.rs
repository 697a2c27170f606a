//! Submission Orchestrator - Transaction Pipeline
//!
//! Sequences one request through the gateway:
//! 1. Shape check (RECEIVED)
//! 2. Route, address and token validation
//! 3. Compliance gate
//! 4. Fee quote and approval signature (or operator id for fiat origins)
//! 5. Backend submission with bounded retry over a rotating signer pool
//!
//! Stages run strictly in order and the pipeline stops at the first
//! failure. Only transport failures are retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::approval::ApprovalSigner;
use super::cache::MemoCache;
use super::compliance_gate::ComplianceGate;
use super::fee_calculator::FeeCalculator;
use super::registry::{ChainRegistry, RegistrySnapshot};
use super::validator::TransactionValidator;
use crate::domain::amount::FixedAmount;
use crate::domain::compliance::AddressCheck;
use crate::domain::error::{GatewayError, GatewayResponse};
use crate::domain::fee::{ApprovalTerms, FeeResult};
use crate::domain::request::{TransactionKind, TransactionRequest};
use crate::domain::rotation::SignerRotation;
use crate::ports::chain_backend::{ChainBackend, PoolBalance, SubmitPayload, TssPublicKey};
use crate::ports::telemetry::{NoopObserver, PipelineObserver};

/// Pipeline position of a request. Terminal at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
  Received,
  RouteValidated,
  AddressValidated,
  TokenValidated,
  CompliancePassed,
  FeeSignatureComputed,
  Submitted,
  Accepted,
  BackendRejected,
}

impl PipelineStage {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Received => "received",
      Self::RouteValidated => "route_validated",
      Self::AddressValidated => "address_validated",
      Self::TokenValidated => "token_validated",
      Self::CompliancePassed => "compliance_passed",
      Self::FeeSignatureComputed => "fee_signature_computed",
      Self::Submitted => "submitted",
      Self::Accepted => "accepted",
      Self::BackendRejected => "backend_rejected",
    }
  }
}

/// Bounded retry for transport failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Total attempts, first try included.
  pub max_attempts: u32,
  pub base_delay: Duration,
}

impl RetryPolicy {
  /// Exponential backoff before attempt `attempt + 1`.
  pub fn delay_after(&self, attempt: u32) -> Duration {
    self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
  }
}

/// Successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
  pub tx_hash: Option<String>,
  pub explorer_url: Option<String>,
  /// Signer identity used for the accepted attempt.
  pub creator: String,
  pub attempts: u32,
  pub fee_id: Option<String>,
  /// Operator-derived id for fiat-origin submissions.
  pub transaction_id: Option<String>,
}

/// Collaborators the orchestrator is assembled from.
pub struct GatewayParts {
  pub registry: Arc<ChainRegistry>,
  pub validator: TransactionValidator,
  pub compliance: ComplianceGate,
  pub fees: FeeCalculator,
  pub signers: ApprovalSigner,
  pub backend: Arc<dyn ChainBackend>,
  pub rotation: SignerRotation,
  pub retry: RetryPolicy,
  /// Freshness of pool balances and TSS keys.
  pub aux_ttl: Duration,
  pub aux_timeout: Duration,
}

/// The submission orchestrator.
pub struct Gateway {
  registry: Arc<ChainRegistry>,
  validator: TransactionValidator,
  compliance: ComplianceGate,
  fees: FeeCalculator,
  signers: ApprovalSigner,
  backend: Arc<dyn ChainBackend>,
  rotation: SignerRotation,
  retry: RetryPolicy,
  balances: MemoCache<Vec<PoolBalance>>,
  tss_keys: MemoCache<Vec<TssPublicKey>>,
  observer: Arc<dyn PipelineObserver>,
}

impl Gateway {
  pub fn new(parts: GatewayParts) -> Self {
    Self {
      registry: parts.registry,
      validator: parts.validator,
      compliance: parts.compliance,
      fees: parts.fees,
      signers: parts.signers,
      backend: parts.backend,
      rotation: parts.rotation,
      retry: parts.retry,
      balances: MemoCache::new(parts.aux_ttl, parts.aux_timeout),
      tss_keys: MemoCache::new(parts.aux_ttl, parts.aux_timeout),
      observer: Arc::new(NoopObserver),
    }
  }

  /// Report outcomes to `observer` (metrics).
  pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
    self.observer = observer;
    self
  }

  pub fn registry(&self) -> &Arc<ChainRegistry> {
    &self.registry
  }

  /// Run the full pipeline and wrap the outcome in the response envelope.
  pub async fn submit(
    &self,
    kind: TransactionKind,
    request: &TransactionRequest,
  ) -> GatewayResponse<SubmissionReceipt> {
    self.try_submit(kind, request).await.into()
  }

  /// Run the full pipeline.
  #[instrument(skip(self, request), fields(
    kind = kind.as_str(),
    origin = %request.origin_chain,
    target = %request.target_chain,
  ))]
  pub async fn try_submit(
    &self,
    kind: TransactionKind,
    request: &TransactionRequest,
  ) -> Result<SubmissionReceipt, GatewayError> {
    let started = Instant::now();
    let mut stage = PipelineStage::Received;

    let result = self.run_pipeline(kind, request, &mut stage).await;

    let outcome = match &result {
      Ok(receipt) => {
        info!(
          stage = stage.as_str(),
          attempts = receipt.attempts,
          tx_hash = ?receipt.tx_hash,
          "Transaction accepted"
        );
        "accepted"
      }
      Err(e) => {
        warn!(stage = stage.as_str(), kind = e.kind().as_str(), error = %e, "Pipeline halted");
        e.kind().as_str()
      }
    };
    self.observer.on_submission(kind, outcome, started.elapsed());

    result
  }

  /// Validation only. Returns the first error message, if any.
  pub async fn validate(&self, kind: TransactionKind, request: &TransactionRequest) -> Option<String> {
    let snapshot = self.registry.snapshot();
    self
      .validator
      .validate(&snapshot, kind, request)
      .await
      .err()
      .map(|e| e.to_string())
  }

  /// Validate and quote without signing or submitting.
  pub async fn quote(
    &self,
    kind: TransactionKind,
    request: &TransactionRequest,
  ) -> Result<FeeResult, GatewayError> {
    let snapshot = self.registry.snapshot();
    self.validator.validate(&snapshot, kind, request).await?;
    self.fees.calc_service_fee(&snapshot, request).await
  }

  /// Custody pool balances, cached.
  pub async fn pool_balances(&self) -> Result<Vec<PoolBalance>, GatewayError> {
    let backend = Arc::clone(&self.backend);
    let key = MemoCache::<Vec<PoolBalance>>::key("pool_balances", &());
    self
      .balances
      .get_or_fetch(&key, move || async move { backend.pool_balances().await })
      .await
  }

  /// TSS public keys, cached.
  pub async fn tss_public_keys(&self) -> Result<Vec<TssPublicKey>, GatewayError> {
    let backend = Arc::clone(&self.backend);
    let key = MemoCache::<Vec<TssPublicKey>>::key("tss_public_keys", &());
    self
      .tss_keys
      .get_or_fetch(&key, move || async move { backend.tss_public_keys().await })
      .await
  }

  async fn run_pipeline(
    &self,
    kind: TransactionKind,
    request: &TransactionRequest,
    stage: &mut PipelineStage,
  ) -> Result<SubmissionReceipt, GatewayError> {
    // One snapshot for the whole request.
    let snapshot = self.registry.snapshot();

    self.validator.validate_shape(kind, request)?;
    self
      .validator
      .validate_route(&snapshot, &request.origin_chain, &request.target_chain)?;
    *stage = PipelineStage::RouteValidated;

    self.validator.validate_addresses(&snapshot, request).await?;
    *stage = PipelineStage::AddressValidated;

    self.validator.validate_tokens(
      &snapshot,
      &request.origin_chain,
      &request.origin_symbol,
      &request.target_chain,
      &request.target_symbol,
    )?;
    *stage = PipelineStage::TokenValidated;

    self.screen(request).await?;
    *stage = PipelineStage::CompliancePassed;

    let mut payload = self.prepare_payload(&snapshot, request).await?;
    *stage = PipelineStage::FeeSignatureComputed;

    let (receipt, rejected) = self.submit_with_retry(kind, &mut payload, stage).await?;
    if let Some((code, message)) = rejected {
      *stage = PipelineStage::BackendRejected;
      return Err(GatewayError::BackendRejected { code, message });
    }
    *stage = PipelineStage::Accepted;

    let explorer_url = receipt.tx_hash.as_deref().and_then(|hash| {
      snapshot
        .get_chain(&request.origin_chain)
        .and_then(|c| c.explorer_tx_url(hash))
    });
    Ok(SubmissionReceipt {
      explorer_url,
      ..receipt
    })
  }

  async fn screen(&self, request: &TransactionRequest) -> Result<(), GatewayError> {
    let addresses = request.screened_addresses();
    if addresses.is_empty() || !self.compliance.is_enabled() {
      return Ok(());
    }

    let result = self.compliance.check(&addresses).await?;
    if result.is_error {
      self.observer.on_compliance("error");
      let detail = result
        .results
        .first()
        .map(|r| match r {
          AddressCheck::Failed { error, .. } => error.clone(),
          _ => "incomplete screening".to_string(),
        })
        .unwrap_or_default();
      return Err(GatewayError::ComplianceUnavailable(detail));
    }
    if !result.is_compliant {
      self.observer.on_compliance("rejected");
      return Err(GatewayError::NonCompliant(result));
    }
    self.observer.on_compliance("passed");
    Ok(())
  }

  /// Fee quote plus approval signature or operator transaction id.
  async fn prepare_payload(
    &self,
    snapshot: &RegistrySnapshot,
    request: &TransactionRequest,
  ) -> Result<SubmitPayload, GatewayError> {
    let origin = snapshot.get_chain(&request.origin_chain).ok_or_else(|| {
      GatewayError::validation(format!("origin chain not supported: {}", request.origin_chain))
    })?;
    let origin_decimals = snapshot
      .get_token(&request.origin_chain, &request.origin_symbol)
      .map(|t| t.decimals)
      .ok_or_else(|| {
        GatewayError::validation(format!(
          "token {} not found on chain {}",
          request.origin_symbol, request.origin_chain
        ))
      })?;

    let fee = self.fees.calc_service_fee(snapshot, request).await?;
    if fee.is_expired(Utc::now()) {
      return Err(GatewayError::transport(format!("fee quote {} already expired", fee.fee_id)));
    }
    let values = fee.values(request.fee_deducted_from);

    let mut approval_signature = None;
    let mut transaction_id = None;

    if origin.compatibility.is_fiat_like() {
      let seed = format!("{}:{}", request.serialized_options(), Uuid::new_v4());
      let receipt = self.signers.sign_operator(&seed).await?;
      debug!(transaction_id = %receipt.transaction_id, "Operator transaction id derived");
      transaction_id = Some(receipt.transaction_id);
    } else if request.mode.signs_server_side() {
      let message = ApprovalTerms::for_request(
        request,
        origin_decimals,
        &fee.fee_id,
        &values.allowance_amount,
      )?
      .message()?;
      if message != values.message {
        return Err(GatewayError::signing(
          "approval message does not match the quoted fee values",
        ));
      }
      approval_signature = Some(self.signers.sign(origin, &message).await?);
    } else {
      approval_signature.clone_from(&request.signature);
    }

    let amount = FixedAmount::parse(&request.amount, request.decimals, "amount")?;
    let fee_amount = FixedAmount::parse(&request.fee, request.decimals, "fee")?;

    Ok(SubmitPayload {
      creator: String::new(),
      origin_chain: request.origin_chain.clone(),
      origin_address: request.origin_address.clone(),
      origin_symbol: request.origin_symbol.clone(),
      target_chain: request.target_chain.clone(),
      target_address: request.target_address.clone(),
      target_symbol: request.target_symbol.clone(),
      amount: amount.to_decimal_string()?,
      fee: fee_amount.to_decimal_string()?,
      fee_id: Some(fee.fee_id.clone()),
      approval_signature,
      sender_public_key: request.sender_public_key.clone(),
      htlc: request.htlc.clone(),
      transaction_id,
      options: request.serialized_options(),
      mode: request.mode,
    })
  }

  /// Submit, rotating the signer identity on every attempt.
  ///
  /// Returns the receipt and, when the backend embedded an application
  /// error, its `(code, message)`.
  async fn submit_with_retry(
    &self,
    kind: TransactionKind,
    payload: &mut SubmitPayload,
    stage: &mut PipelineStage,
  ) -> Result<(SubmissionReceipt, Option<(String, String)>), GatewayError> {
    let max_attempts = self.retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
      attempt += 1;
      payload.creator = self.rotation.next().to_string();
      self.observer.on_attempt(kind, attempt > 1);
      *stage = PipelineStage::Submitted;

      match self.backend.submit(kind, payload).await {
        Ok(response) => {
          let rejected = response.application_error();
          let receipt = SubmissionReceipt {
            tx_hash: response.tx_hash,
            explorer_url: None,
            creator: payload.creator.clone(),
            attempts: attempt,
            fee_id: payload.fee_id.clone(),
            transaction_id: payload.transaction_id.clone(),
          };
          return Ok((receipt, rejected));
        }
        Err(e) if e.is_retryable() && attempt < max_attempts => {
          let delay = self.retry.delay_after(attempt);
          warn!(
            attempt,
            max_attempts,
            creator = %payload.creator,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "Submission failed, rotating signer and retrying"
          );
          tokio::time::sleep(delay).await;
        }
        Err(e) => return Err(e),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_backoff_doubles() {
    let policy = RetryPolicy {
      max_attempts: 4,
      base_delay: Duration::from_millis(100),
    };
    assert_eq!(policy.delay_after(1), Duration::from_millis(100));
    assert_eq!(policy.delay_after(2), Duration::from_millis(200));
    assert_eq!(policy.delay_after(3), Duration::from_millis(400));
  }

  #[test]
  fn test_stage_labels_are_stable() {
    assert_eq!(PipelineStage::RouteValidated.as_str(), "route_validated");
    assert_eq!(PipelineStage::BackendRejected.as_str(), "backend_rejected");
  }
}

//! Risk Provider Port - Address Risk Scoring
//!
//! One call scores a whole batch of addresses. A provider envelope with
//! `status: "fail"` must be reported as an error, never as scores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::GatewayError;

/// Provider score for a single address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScoreEntry {
  pub address: String,
  pub risk_score: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RiskProvider: Send + Sync + 'static {
  /// Score every address in one request.
  async fn score(&self, addresses: &[String]) -> Result<Vec<RiskScoreEntry>, GatewayError>;
}

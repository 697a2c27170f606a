//! Risk Provider Adapter
//!
//! Posts the whole address batch to the configured endpoint. A
//! `status: "fail"` envelope is surfaced as an error, not as scores.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use super::client::HttpClient;
use super::types::{RiskRequest, RiskResponse};
use crate::domain::error::GatewayError;
use crate::ports::risk_provider::{RiskProvider, RiskScoreEntry};

pub struct HttpRiskProvider {
  client: Arc<HttpClient>,
}

impl HttpRiskProvider {
  /// `client` must point at the full scoring endpoint.
  pub fn new(client: Arc<HttpClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl RiskProvider for HttpRiskProvider {
  #[instrument(skip(self, addresses), fields(count = addresses.len()))]
  async fn score(&self, addresses: &[String]) -> Result<Vec<RiskScoreEntry>, GatewayError> {
    let response: RiskResponse = self
      .client
      .post_json("", &RiskRequest { addresses })
      .await
      .map_err(|e| GatewayError::ComplianceUnavailable(e.to_string()))?;

    response.into_scores().map_err(|message| {
      warn!(%message, "Risk provider reported failure");
      GatewayError::ComplianceUnavailable(message)
    })
  }
}

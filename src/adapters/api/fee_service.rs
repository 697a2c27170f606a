//! Fee Service Adapter - `POST /fees/calculate`

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::client::HttpClient;
use crate::domain::error::GatewayError;
use crate::ports::fee_service::{FeeQuote, FeeQuoteRequest, FeeService};

const CALCULATE_PATH: &str = "/fees/calculate";

pub struct HttpFeeService {
  client: Arc<HttpClient>,
}

impl HttpFeeService {
  pub fn new(client: Arc<HttpClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl FeeService for HttpFeeService {
  #[instrument(skip(self, request), fields(origin = %request.origin_chain, target = %request.target_chain))]
  async fn calculate(&self, request: &FeeQuoteRequest) -> Result<FeeQuote, GatewayError> {
    self.client.post_json(CALCULATE_PATH, request).await
  }
}

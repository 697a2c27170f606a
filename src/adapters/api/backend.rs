//! Settlement Backend Adapter
//!
//! Implements the `ChainBackend` port over the shared `HttpClient`.
//! Registry and pool reads are retried by the client; submissions are
//! sent once per call and retried by the orchestrator with a rotated
//! signer identity.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::client::HttpClient;
use super::types::ListResponse;
use crate::domain::error::GatewayError;
use crate::domain::request::TransactionKind;
use crate::ports::chain_backend::{
  BackendResponse, ChainBackend, PoolBalance, RemoteChain, SubmitPayload, TssPublicKey,
};

const CHAINS_PATH: &str = "/chains";
const POOL_BALANCES_PATH: &str = "/pool/balances";
const TSS_KEYS_PATH: &str = "/tss/public-keys";

/// HTTP client for the settlement backend.
pub struct HttpChainBackend {
  client: Arc<HttpClient>,
}

impl HttpChainBackend {
  pub fn new(client: Arc<HttpClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl ChainBackend for HttpChainBackend {
  #[instrument(skip(self))]
  async fn fetch_chains(&self) -> Result<Vec<RemoteChain>, GatewayError> {
    let chains = self
      .client
      .get_json::<ListResponse<RemoteChain>>(CHAINS_PATH)
      .await?
      .into_vec();
    debug!(count = chains.len(), "Fetched backend chain registry");
    Ok(chains)
  }

  #[instrument(skip(self))]
  async fn pool_balances(&self) -> Result<Vec<PoolBalance>, GatewayError> {
    Ok(
      self
        .client
        .get_json::<ListResponse<PoolBalance>>(POOL_BALANCES_PATH)
        .await?
        .into_vec(),
    )
  }

  #[instrument(skip(self))]
  async fn tss_public_keys(&self) -> Result<Vec<TssPublicKey>, GatewayError> {
    Ok(
      self
        .client
        .get_json::<ListResponse<TssPublicKey>>(TSS_KEYS_PATH)
        .await?
        .into_vec(),
    )
  }

  #[instrument(skip(self, payload), fields(kind = kind.as_str(), creator = %payload.creator))]
  async fn submit(
    &self,
    kind: TransactionKind,
    payload: &SubmitPayload,
  ) -> Result<BackendResponse, GatewayError> {
    let response: BackendResponse = self.client.post_json(kind.submit_path(), payload).await?;
    debug!(tx_hash = ?response.tx_hash, events = response.events.len(), "Backend responded");
    Ok(response)
  }
}

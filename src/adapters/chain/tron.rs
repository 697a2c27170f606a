//! Tron Node Adapter — Remote Address Validation
//!
//! Calls the node's `wallet/validateaddress` endpoint. The RPC URL comes
//! from the chain's registry entry, so one client serves every Tron
//! network the registry knows about.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::adapters::api::client::HttpClient;
use crate::adapters::api::types::{TronValidateRequest, TronValidateResponse};
use crate::domain::error::GatewayError;
use crate::ports::tron_node::TronNode;

const VALIDATE_PATH: &str = "/wallet/validateaddress";

/// Tron full-node HTTP API client.
pub struct TronNodeClient {
    client: Arc<HttpClient>,
}

impl TronNodeClient {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TronNode for TronNodeClient {
    #[instrument(skip(self))]
    async fn validate_address(&self, rpc_url: &str, address: &str) -> Result<bool, GatewayError> {
        let url = format!("{}{}", rpc_url.trim_end_matches('/'), VALIDATE_PATH);
        let response: TronValidateResponse = self
            .client
            .post_json_url(
                &url,
                &TronValidateRequest {
                    address,
                    visible: true,
                },
            )
            .await?;
        debug!(valid = response.result, message = ?response.message, "Tron node answered");
        Ok(response.result)
    }
}

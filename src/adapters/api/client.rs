//! Upstream HTTP Client - Rate-limited JSON Client
//!
//! Wraps reqwest with a request timeout, a concurrency semaphore, a
//! client-side rate limiter and bounded retries for idempotent reads.
//! Writes (POST) are sent once; the orchestrator owns their retry policy.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::domain::error::GatewayError;

/// Configuration for one upstream client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
  /// Base URL, without trailing slash.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Client-side rate limit.
  pub requests_per_second: u32,
  /// Maximum retries on transient errors (GET only).
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for HttpClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:1317".to_string(),
      timeout: Duration::from_secs(10),
      max_concurrent: 16,
      requests_per_second: 50,
      max_retries: 2,
      retry_base_delay: Duration::from_millis(200),
    }
  }
}

impl HttpClientConfig {
  /// Client settings for the settlement backend.
  pub fn from_backend(config: &BackendConfig) -> Self {
    Self {
      base_url: config.url.trim_end_matches('/').to_string(),
      timeout: Duration::from_millis(config.timeout_ms),
      max_concurrent: config.max_concurrent,
      requests_per_second: config.requests_per_second,
      max_retries: config.max_retries,
      retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
    }
  }

  /// Single-shot client settings for a secondary upstream.
  pub fn simple(base_url: &str, timeout_ms: u64) -> Self {
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_millis(timeout_ms),
      max_retries: 0,
      ..Self::default()
    }
  }
}

/// Rate-limited JSON client shared by all HTTP adapters.
pub struct HttpClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: HttpClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Requests-per-second limiter.
  limiter: DefaultDirectRateLimiter,
}

impl HttpClient {
  /// Create a new client.
  pub fn new(config: HttpClientConfig) -> Result<Self, GatewayError> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

    let rps = NonZeroU32::new(config.requests_per_second)
      .ok_or_else(|| GatewayError::Config("requests_per_second must be positive".into()))?;

    Ok(Self {
      http,
      semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
      limiter: RateLimiter::direct(Quota::per_second(rps)),
      config,
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url, path)
  }

  /// GET `path` and decode JSON, retrying transient failures.
  pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
    let request = self.http.get(self.url(path));
    self.execute_with_retry(request, path, self.config.max_retries).await
  }

  /// POST a JSON body to `path` once.
  pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let request = self.http.post(self.url(path)).json(body);
    self.execute_with_retry(request, path, 0).await
  }

  /// POST a JSON body to an absolute URL once.
  pub async fn post_json_url<B, T>(&self, url: &str, body: &B) -> Result<T, GatewayError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let request = self.http.post(url).json(body);
    self.execute_with_retry(request, url, 0).await
  }

  /// Execute with concurrency and rate limiting plus up to `max_retries` retries.
  async fn execute_with_retry<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
    path: &str,
    max_retries: u32,
  ) -> Result<T, GatewayError> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| GatewayError::transport("HTTP client is shutting down"))?;

    let mut last_error = None;

    for attempt in 0..=max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, path, delay_ms = delay.as_millis() as u64, "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      let req = request
        .try_clone()
        .ok_or_else(|| GatewayError::transport("request body cannot be retried"))?;

      let err = match req.send().await {
        Ok(response) => match response.status() {
          status if status.is_success() => return response.json::<T>().await.map_err(Into::into),
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(path, "Rate limited by upstream, backing off");
            GatewayError::transport(format!("{path}: rate limited"))
          }
          status if status.is_server_error() => {
            warn!(path, status = %status, "Upstream server error");
            GatewayError::transport(format!("{path}: upstream returned {status}"))
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::BackendRejected {
              code: status.as_u16().to_string(),
              message: body,
            });
          }
        },
        Err(e) => {
          warn!(path, error = %e, attempt, "Request failed");
          e.into()
        }
      };
      last_error = Some(err);
    }

    Err(last_error.unwrap_or_else(|| GatewayError::transport("max retries exceeded")))
  }
}

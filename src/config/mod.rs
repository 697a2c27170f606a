//! Configuration Module - TOML-based Gateway Configuration
//!
//! Loads and validates configuration from `config.toml`. Upstream
//! endpoints, seed chains and filters are externalized here; signer key
//! material is NEVER in this file (see `adapters::signing`).

pub mod loader;

use serde::Deserialize;

use crate::domain::chain::Chain;
use crate::domain::filter::ChainFilterConfig;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Gateway identity and environment.
  pub gateway: GatewayConfig,
  /// Seed chains, filters and refresh policy.
  pub registry: RegistryConfig,
  /// Settlement backend connection.
  pub backend: BackendConfig,
  /// Fee service connection.
  pub fees: FeeServiceConfig,
  /// Risk provider connection (optional URL).
  #[serde(default)]
  pub compliance: ComplianceConfig,
  /// Tron node RPC settings.
  #[serde(default)]
  pub tron: TronConfig,
  /// Submission retry and signer pool.
  pub submission: SubmissionConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Gateway identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Serve testnet chains instead of mainnet chains.
  #[serde(default)]
  pub testnet: bool,
}

/// Chain registry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
  /// How long a merged remote registry stays fresh (seconds).
  #[serde(default = "default_refresh_ttl")]
  pub refresh_ttl_seconds: u64,
  /// Static seed chains (both networks; filtered by `gateway.testnet`).
  pub chains: Vec<Chain>,
  /// Per-location whitelist/blacklist.
  #[serde(default)]
  pub filters: ChainFilterConfig,
}

/// Shared HTTP client knobs for an upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Backend base URL.
  pub url: String,
  /// Request timeout (milliseconds).
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum concurrent requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Client-side rate limit.
  #[serde(default = "default_rps")]
  pub requests_per_second: u32,
  /// Retries for idempotent reads.
  #[serde(default = "default_read_retries")]
  pub max_retries: u32,
  /// Base delay between read retries (exponential backoff).
  #[serde(default = "default_retry_delay_ms")]
  pub retry_base_delay_ms: u64,
  /// Freshness of pool balances and TSS keys (seconds).
  #[serde(default = "default_aux_ttl")]
  pub aux_cache_ttl_seconds: u64,
}

/// Fee service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeServiceConfig {
  /// Fee service base URL.
  pub url: String,
  /// Account quoted as the transaction creator.
  pub creator: String,
  /// Request timeout (milliseconds).
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
}

/// Risk provider configuration. No URL disables the gate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceConfig {
  /// Risk provider endpoint.
  pub url: Option<String>,
  /// Request timeout (milliseconds).
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
}

/// Tron node RPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TronConfig {
  /// Request timeout (milliseconds).
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
}

impl Default for TronConfig {
  fn default() -> Self {
    Self {
      timeout_ms: default_timeout_ms(),
    }
  }
}

/// Submission retry and signer rotation.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
  /// Total attempts per submission (first try included).
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Base delay between attempts (exponential backoff).
  #[serde(default = "default_retry_delay_ms")]
  pub retry_base_delay_ms: u64,
  /// Round-robin pool of signer identities.
  pub signer_addresses: Vec<String>,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_refresh_ttl() -> u64 {
  300
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_max_concurrent() -> usize {
  16
}

fn default_rps() -> u32 {
  50
}

fn default_read_retries() -> u32 {
  2
}

fn default_retry_delay_ms() -> u64 {
  200
}

fn default_aux_ttl() -> u64 {
  30
}

fn default_max_attempts() -> u32 {
  3
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}

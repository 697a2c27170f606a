//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::amount::MAX_DECIMALS;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    chains = config.registry.chains.len(),
    testnet = config.gateway.testnet,
    signers = config.submission.signer_addresses.len(),
    compliance = config.compliance.url.is_some(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty, unique seed chains with sane decimals
/// - At least one chain on the selected network
/// - Non-empty filter sets
/// - Usable upstream URLs, timeouts and signer pool
fn validate_config(config: &AppConfig) -> Result<()> {
  // Registry validation
  anyhow::ensure!(
    !config.registry.chains.is_empty(),
    "At least one seed chain must be configured"
  );

  let mut seen = HashSet::new();
  for chain in &config.registry.chains {
    anyhow::ensure!(!chain.code.is_empty(), "Seed chain {} has empty code", chain.name);
    anyhow::ensure!(
      seen.insert((chain.code.as_str(), chain.testnet)),
      "Duplicate seed chain {} (testnet={})",
      chain.code,
      chain.testnet
    );
    for token in &chain.tokens {
      anyhow::ensure!(
        token.decimals <= MAX_DECIMALS,
        "Token {} on {} has decimals {} > {}",
        token.symbol,
        chain.code,
        token.decimals,
        MAX_DECIMALS
      );
    }
  }

  anyhow::ensure!(
    config
      .registry
      .chains
      .iter()
      .any(|c| c.testnet == config.gateway.testnet),
    "No seed chains configured for the selected network (testnet={})",
    config.gateway.testnet
  );

  for (location, filter) in [
    ("origin", &config.registry.filters.origin),
    ("target", &config.registry.filters.target),
  ] {
    if let Some(filter) = filter {
      anyhow::ensure!(
        !filter.chains.is_empty(),
        "Filter for {location} must list at least one chain"
      );
    }
  }

  anyhow::ensure!(
    config.registry.refresh_ttl_seconds > 0,
    "registry.refresh_ttl_seconds must be positive"
  );

  // Upstream validation
  anyhow::ensure!(!config.backend.url.is_empty(), "Backend URL must not be empty");
  anyhow::ensure!(!config.fees.url.is_empty(), "Fee service URL must not be empty");
  anyhow::ensure!(config.backend.timeout_ms > 0, "backend.timeout_ms must be positive");
  anyhow::ensure!(
    config.backend.requests_per_second > 0,
    "backend.requests_per_second must be positive"
  );
  if let Some(url) = &config.compliance.url {
    anyhow::ensure!(!url.is_empty(), "compliance.url must not be empty when set");
  }

  // Submission validation
  anyhow::ensure!(
    config.submission.max_attempts > 0,
    "submission.max_attempts must be at least 1"
  );
  anyhow::ensure!(
    !config.submission.signer_addresses.is_empty(),
    "submission.signer_addresses must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const VALID: &str = r#"
    [gateway]
    name = "gateway-test"

    [registry]
    [[registry.chains]]
    code = "ETH"
    name = "Ethereum"
    compatibility = "EVM"
    decimals = 18

    [registry.filters.origin]
    mode = "blacklist"
    chains = ["BSC"]

    [backend]
    url = "http://backend"

    [fees]
    url = "http://fees"
    creator = "0x0000000000000000000000000000000000000001"

    [submission]
    signer_addresses = ["signer-1", "signer-2"]
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_parse_valid_config_with_defaults() {
    let config = parse_config(VALID).unwrap();
    assert_eq!(config.registry.refresh_ttl_seconds, 300);
    assert_eq!(config.submission.max_attempts, 3);
    assert!(config.compliance.url.is_none());
    assert!(config.metrics.enabled);
  }

  #[test]
  fn test_rejects_empty_signer_pool() {
    let broken = VALID.replace(r#"["signer-1", "signer-2"]"#, "[]");
    let err = parse_config(&broken).unwrap_err();
    assert!(err.to_string().contains("signer_addresses"));
  }

  #[test]
  fn test_rejects_empty_filter_set() {
    let broken = VALID.replace(r#"chains = ["BSC"]"#, "chains = []");
    assert!(parse_config(&broken).is_err());
  }

  #[test]
  fn test_rejects_network_without_chains() {
    let testnet = VALID.replace(r#"name = "gateway-test""#, "name = \"t\"\ntestnet = true");
    let err = parse_config(&testnet).unwrap_err();
    assert!(err.to_string().contains("testnet=true"));
  }
}

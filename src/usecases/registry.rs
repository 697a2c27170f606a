//! Chain Registry - Canonical Chain/Token Map
//!
//! Built from static seed data for one network (mainnet XOR testnet),
//! then refreshed by overlaying the backend's registry. The map is an
//! immutable snapshot behind a single reference: a refresh swaps in a
//! whole new map, and every read operation works on one snapshot so it
//! never sees a half-updated view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::cache::MemoCache;
use crate::domain::amount::FixedAmount;
use crate::domain::chain::{Chain, ChainMap, Location, Token};
use crate::domain::error::GatewayError;
use crate::domain::filter::{ChainFilter, ChainFilterConfig};
use crate::ports::chain_backend::{ChainBackend, RemoteChain, RemoteToken};

const REFRESH_KEY: &str = "fetch_chains:null";

/// One consistent view of the registry.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
  chains: Arc<ChainMap>,
  filters: Arc<ChainFilterConfig>,
}

impl RegistrySnapshot {
  pub fn chains(&self) -> &ChainMap {
    &self.chains
  }

  pub fn get_chain(&self, code: &str) -> Option<&Chain> {
    self.chains.get(code)
  }

  pub fn get_token(&self, chain: &str, symbol: &str) -> Option<&Token> {
    self.get_chain(chain).and_then(|c| c.token(symbol))
  }

  /// Filter bound to this snapshot's map.
  pub fn filter(&self, location: Location) -> ChainFilter<'_> {
    ChainFilter::new(&self.chains, location, &self.filters)
  }

  pub fn is_supported_chain(&self, code: &str, location: Location) -> bool {
    self.filter(location).is_supported_chain(code)
  }

  /// Unknown chains count as disabled.
  pub fn is_disabled_chain(&self, code: &str) -> bool {
    self.get_chain(code).is_none_or(|c| c.disabled)
  }

  /// Chains usable at `location`.
  pub fn supported_chains(&self, location: Location) -> Vec<&Chain> {
    let filter = self.filter(location);
    self
      .chains
      .values()
      .filter(|c| filter.is_supported_chain(&c.code))
      .collect()
  }

  /// Convert a request amount into the token's base units.
  pub fn to_token_units(
    &self,
    chain: &str,
    symbol: &str,
    amount: &FixedAmount,
  ) -> Result<u128, GatewayError> {
    let token = self.get_token(chain, symbol).ok_or_else(|| {
      GatewayError::validation(format!("token {symbol} not found on chain {chain}"))
    })?;
    amount.rescale(token.decimals)
  }
}

/// A merged map tagged with the order in which its fetch completed.
#[derive(Debug, Clone)]
struct MergedMap {
  generation: u64,
  chains: Arc<ChainMap>,
}

/// Registry of supported chains, refreshed from the backend.
pub struct ChainRegistry {
  seed: Arc<ChainMap>,
  filters: Arc<ChainFilterConfig>,
  current: RwLock<MergedMap>,
  generations: Arc<AtomicU64>,
  backend: Arc<dyn ChainBackend>,
  cache: MemoCache<MergedMap>,
  merged_once: AtomicBool,
  last_refresh_failed: AtomicBool,
}

impl ChainRegistry {
  /// Build the registry from seed chains of the selected network.
  pub fn new(
    seed_chains: Vec<Chain>,
    testnet: bool,
    filters: ChainFilterConfig,
    backend: Arc<dyn ChainBackend>,
    ttl: Duration,
    fetch_timeout: Duration,
  ) -> Self {
    let seed: ChainMap = seed_chains
      .into_iter()
      .filter(|c| c.testnet == testnet)
      .map(|c| (c.code.clone(), c))
      .collect();
    let seed = Arc::new(seed);

    info!(chains = seed.len(), testnet, "Chain registry seeded");

    Self {
      current: RwLock::new(MergedMap {
        generation: 0,
        chains: Arc::clone(&seed),
      }),
      generations: Arc::new(AtomicU64::new(1)),
      seed,
      filters: Arc::new(filters),
      backend,
      cache: MemoCache::new(ttl, fetch_timeout),
      merged_once: AtomicBool::new(false),
      last_refresh_failed: AtomicBool::new(false),
    }
  }

  /// Take a consistent snapshot. Callers should take one per operation.
  pub fn snapshot(&self) -> RegistrySnapshot {
    let chains = Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner).chains);
    RegistrySnapshot {
      chains,
      filters: Arc::clone(&self.filters),
    }
  }

  pub fn get_chain(&self, code: &str) -> Option<Chain> {
    self.snapshot().get_chain(code).cloned()
  }

  pub fn get_token(&self, chain: &str, symbol: &str) -> Option<Token> {
    self.snapshot().get_token(chain, symbol).cloned()
  }

  pub fn is_supported_chain(&self, code: &str, location: Location) -> bool {
    self.snapshot().is_supported_chain(code, location)
  }

  pub fn is_disabled_chain(&self, code: &str) -> bool {
    self.snapshot().is_disabled_chain(code)
  }

  /// Merge the backend registry into the seed and swap it in.
  ///
  /// Memoized: callers within the TTL share one fetch and one result.
  /// On failure the current map is left untouched and the error is
  /// returned to the caller.
  #[instrument(skip(self))]
  pub async fn refresh(&self) -> Result<(), GatewayError> {
    let backend = Arc::clone(&self.backend);
    let seed = Arc::clone(&self.seed);
    let generations = Arc::clone(&self.generations);

    let merged = self
      .cache
      .get_or_fetch(REFRESH_KEY, move || async move {
        let remote = backend.fetch_chains().await?;
        let chains = Arc::new(merge_remote(&seed, &remote));
        Ok(MergedMap {
          generation: generations.fetch_add(1, Ordering::Relaxed),
          chains,
        })
      })
      .await;

    match merged {
      Ok(map) => {
        self.install(map);
        self.merged_once.store(true, Ordering::Relaxed);
        self.last_refresh_failed.store(false, Ordering::Relaxed);
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "Chain registry refresh failed, keeping previous map");
        self.last_refresh_failed.store(true, Ordering::Relaxed);
        Err(e)
      }
    }
  }

  /// Swap in `map` unless a newer fetch is already installed.
  fn install(&self, map: MergedMap) -> bool {
    let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
    if map.generation <= current.generation {
      return false;
    }
    info!(chains = map.chains.len(), generation = map.generation, "Chain registry refreshed");
    *current = map;
    true
  }

  /// Whether remote data has been merged at least once.
  pub fn has_merged(&self) -> bool {
    self.merged_once.load(Ordering::Relaxed)
  }

  pub fn last_refresh_failed(&self) -> bool {
    self.last_refresh_failed.load(Ordering::Relaxed)
  }
}

/// Overlay remote registry data onto the seed map.
///
/// Chains are matched by short code. Unmatched local chains are kept
/// as-is; remote-only chains are ignored (the seed defines what the
/// gateway can serve).
pub fn merge_remote(seed: &ChainMap, remote: &[RemoteChain]) -> ChainMap {
  let by_code: HashMap<&str, &RemoteChain> =
    remote.iter().map(|r| (r.code.as_str(), r)).collect();

  seed
    .iter()
    .map(|(code, local)| {
      let mut chain = local.clone();
      if let Some(remote) = by_code.get(code.as_str()) {
        chain.disabled = remote.disabled;
        chain.derivation_algorithm.clone_from(&remote.derivation_algorithm);
        chain.is_evm = remote.is_evm;
        if !remote.tokens.is_empty() {
          chain.tokens = remote
            .tokens
            .iter()
            .filter_map(|t| merge_token(local, t))
            .collect();
        }
      }
      (code.clone(), chain)
    })
    .collect()
}

fn merge_token(local_chain: &Chain, remote: &RemoteToken) -> Option<Token> {
  let decimals = match remote.decimals.trim().parse::<u8>() {
    Ok(d) => d,
    Err(_) => {
      warn!(
        chain = %local_chain.code,
        token = %remote.symbol,
        decimals = %remote.decimals,
        "Skipping remote token with unparseable decimals"
      );
      return None;
    }
  };
  let local = local_chain.token(&remote.symbol);

  Some(Token {
    symbol: remote.symbol.clone(),
    address: remote.address.clone(),
    decimals,
    pegged_to: remote
      .pegged_to
      .clone()
      .or_else(|| local.map(|t| t.pegged_to.clone()))
      .unwrap_or_default(),
    protocol: local.and_then(|t| t.protocol),
    supported_locations: local.and_then(|t| t.supported_locations.clone()),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::chain::Compatibility;
  use crate::domain::filter::{FilterMode, LocationFilter};
  use crate::ports::chain_backend::MockChainBackend;

  fn token(symbol: &str, decimals: u8) -> Token {
    Token {
      symbol: symbol.into(),
      address: "0x0000000000000000000000000000000000000001".into(),
      decimals,
      pegged_to: "USD".into(),
      protocol: None,
      supported_locations: None,
    }
  }

  fn chain(code: &str, testnet: bool) -> Chain {
    Chain {
      code: code.into(),
      name: code.into(),
      compatibility: Compatibility::Evm,
      decimals: 18,
      rpc_urls: vec![],
      explorer: None,
      disabled: false,
      testnet,
      derivation_algorithm: None,
      is_evm: true,
      tokens: vec![token("USDK", 6)],
      supported_locations: vec![Location::Origin, Location::Target],
    }
  }

  fn remote(code: &str, disabled: bool, tokens: Vec<(&str, &str)>) -> RemoteChain {
    RemoteChain {
      code: code.into(),
      disabled,
      derivation_algorithm: Some("secp256k1".into()),
      is_evm: true,
      tokens: tokens
        .into_iter()
        .map(|(s, d)| RemoteToken {
          symbol: s.into(),
          address: "0xbeef".into(),
          decimals: d.into(),
          pegged_to: None,
        })
        .collect(),
    }
  }

  fn registry(backend: MockChainBackend, filters: ChainFilterConfig) -> ChainRegistry {
    ChainRegistry::new(
      vec![chain("ETH", false), chain("POL", false), chain("SEP", true)],
      false,
      filters,
      Arc::new(backend),
      Duration::from_secs(300),
      Duration::from_secs(5),
    )
  }

  #[test]
  fn test_seed_is_filtered_by_network() {
    let reg = registry(MockChainBackend::new(), ChainFilterConfig::default());
    assert!(reg.get_chain("ETH").is_some());
    assert!(reg.get_chain("SEP").is_none());
  }

  #[test]
  fn test_merge_overlays_matching_chains_only() {
    let mut seed = ChainMap::new();
    seed.insert("ETH".into(), chain("ETH", false));
    seed.insert("POL".into(), chain("POL", false));

    let merged = merge_remote(
      &seed,
      &[
        remote("ETH", true, vec![("USDK", "18"), ("BAD", "x")]),
        remote("NEW", false, vec![]),
      ],
    );

    let eth = &merged["ETH"];
    assert!(eth.disabled);
    assert_eq!(eth.derivation_algorithm.as_deref(), Some("secp256k1"));
    assert_eq!(eth.tokens.len(), 1);
    assert_eq!(eth.tokens[0].decimals, 18);
    assert_eq!(eth.tokens[0].pegged_to, "USD");
    assert_eq!(merged["POL"], seed["POL"]);
    assert!(!merged.contains_key("NEW"));
  }

  #[tokio::test]
  async fn test_refresh_twice_within_ttl_fetches_once() {
    let mut backend = MockChainBackend::new();
    backend
      .expect_fetch_chains()
      .times(1)
      .returning(|| Ok(vec![remote("POL", true, vec![("USDK", "6")])]));

    let reg = registry(backend, ChainFilterConfig::default());
    reg.refresh().await.unwrap();
    let first = reg.snapshot();
    reg.refresh().await.unwrap();
    let second = reg.snapshot();

    assert!(Arc::ptr_eq(&first.chains, &second.chains));
    assert!(reg.is_disabled_chain("POL"));
    assert!(reg.has_merged());
  }

  #[test]
  fn test_stale_merge_never_replaces_newer_one() {
    let reg = registry(MockChainBackend::new(), ChainFilterConfig::default());
    let mut newer = (*reg.seed).clone();
    if let Some(eth) = newer.get_mut("ETH") {
      eth.disabled = true;
    }

    assert!(reg.install(MergedMap { generation: 2, chains: Arc::new(newer) }));
    assert!(!reg.install(MergedMap { generation: 1, chains: Arc::clone(&reg.seed) }));
    assert!(!reg.install(MergedMap { generation: 2, chains: Arc::clone(&reg.seed) }));
    assert!(reg.is_disabled_chain("ETH"));
  }

  #[tokio::test]
  async fn test_failed_refresh_keeps_previous_map() {
    let mut backend = MockChainBackend::new();
    backend
      .expect_fetch_chains()
      .returning(|| Err(GatewayError::transport("connection refused")));

    let reg = registry(backend, ChainFilterConfig::default());
    let before = reg.snapshot();
    assert!(reg.refresh().await.is_err());
    assert!(Arc::ptr_eq(&before.chains, &reg.snapshot().chains));
    assert!(reg.last_refresh_failed());
    assert!(!reg.has_merged());
  }

  #[tokio::test]
  async fn test_snapshot_survives_concurrent_refresh() {
    let mut backend = MockChainBackend::new();
    backend
      .expect_fetch_chains()
      .returning(|| Ok(vec![remote("ETH", true, vec![])]));

    let reg = registry(backend, ChainFilterConfig::default());
    let held = reg.snapshot();
    reg.refresh().await.unwrap();

    assert!(!held.is_disabled_chain("ETH"));
    assert!(reg.snapshot().is_disabled_chain("ETH"));
  }

  #[test]
  fn test_filters_apply_through_snapshot() {
    let filters = ChainFilterConfig {
      origin: None,
      target: Some(LocationFilter {
        mode: FilterMode::Whitelist,
        chains: ["ETH".to_string()].into_iter().collect(),
      }),
    };
    let reg = registry(MockChainBackend::new(), filters);
    assert!(reg.is_supported_chain("POL", Location::Origin));
    assert!(!reg.is_supported_chain("POL", Location::Target));
    assert!(!reg.is_supported_chain("XYZ", Location::Origin));
    assert_eq!(reg.snapshot().supported_chains(Location::Target).len(), 1);
  }

  #[test]
  fn test_token_unit_conversion() {
    let reg = registry(MockChainBackend::new(), ChainFilterConfig::default());
    let amount = FixedAmount::parse("100", 0, "amount").unwrap();
    assert_eq!(
      reg.snapshot().to_token_units("ETH", "USDK", &amount).unwrap(),
      100_000_000
    );
    assert!(reg.snapshot().to_token_units("ETH", "NOPE", &amount).is_err());
  }
}

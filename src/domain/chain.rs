//! Chain and token model.
//!
//! A `Chain` is built once from static seed data and later overlaid with
//! remote registry data. Chains are never mutated in place: a refresh
//! produces a new `ChainMap` that replaces the old one wholesale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Chains keyed by short code ("ETH", "SOL", ...).
pub type ChainMap = BTreeMap<String, Chain>;

/// Cryptographic / address scheme family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compatibility {
    Evm,
    Sol,
    Tron,
    Btc,
    Fiat,
    Bank,
    Cc,
}

impl Compatibility {
    /// Rails with no on-chain address (fiat, bank transfer, credit card).
    pub const fn is_fiat_like(self) -> bool {
        matches!(self, Self::Fiat | Self::Bank | Self::Cc)
    }
}

impl std::fmt::Display for Compatibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Evm => "EVM",
            Self::Sol => "SOL",
            Self::Tron => "TRON",
            Self::Btc => "BTC",
            Self::Fiat => "FIAT",
            Self::Bank => "BANK",
            Self::Cc => "CC",
        };
        f.write_str(s)
    }
}

/// Role a chain plays in a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Origin,
    Target,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Origin => f.write_str("origin"),
            Self::Target => f.write_str("target"),
        }
    }
}

fn both_locations() -> Vec<Location> {
    vec![Location::Origin, Location::Target]
}

/// Payment protocol tag carried by fiat-like tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    CreditCard,
    Sepa,
    Swift,
}

/// Block explorer metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explorer {
    pub url: String,
    #[serde(default = "default_tx_path")]
    pub tx_path: String,
}

fn default_tx_path() -> String {
    "/tx/".to_string()
}

/// A token owned by exactly one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    /// Contract address, or `NativeCoin`/empty for non-address rails.
    #[serde(default)]
    pub address: String,
    pub decimals: u8,
    pub pegged_to: String,
    #[serde(default)]
    pub protocol: Option<Protocol>,
    /// Explicit location override; both locations when absent.
    #[serde(default)]
    pub supported_locations: Option<Vec<Location>>,
}

impl Token {
    pub fn supports(&self, location: Location) -> bool {
        self.supported_locations
            .as_ref()
            .is_none_or(|locs| locs.contains(&location))
    }
}

/// A supported chain with its ordered token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Short code, e.g. "ETH", "SOL", "TRX", "FIAT".
    pub code: String,
    pub name: String,
    pub compatibility: Compatibility,
    /// Decimals of the native coin.
    pub decimals: u8,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub explorer: Option<Explorer>,
    /// Set by the backend.
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub testnet: bool,
    #[serde(default)]
    pub derivation_algorithm: Option<String>,
    #[serde(default)]
    pub is_evm: bool,
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Locations this chain may be used at before any filter applies.
    #[serde(default = "both_locations")]
    pub supported_locations: Vec<Location>,
}

impl Chain {
    pub fn token(&self, symbol: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    pub fn statically_supports(&self, location: Location) -> bool {
        self.supported_locations.contains(&location)
    }

    pub fn primary_rpc(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    /// Explorer link for a transaction hash, if explorer metadata is known.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer.as_ref().map(|e| {
            format!("{}{}{}", e.url.trim_end_matches('/'), e.tx_path, tx_hash)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdk(locations: Option<Vec<Location>>) -> Token {
        Token {
            symbol: "USDK".into(),
            address: "0x0000000000000000000000000000000000000001".into(),
            decimals: 6,
            pegged_to: "USD".into(),
            protocol: None,
            supported_locations: locations,
        }
    }

    #[test]
    fn test_token_defaults_to_both_locations() {
        let t = usdk(None);
        assert!(t.supports(Location::Origin));
        assert!(t.supports(Location::Target));

        let target_only = usdk(Some(vec![Location::Target]));
        assert!(!target_only.supports(Location::Origin));
    }

    #[test]
    fn test_fiat_like_families() {
        assert!(Compatibility::Fiat.is_fiat_like());
        assert!(Compatibility::Bank.is_fiat_like());
        assert!(Compatibility::Cc.is_fiat_like());
        assert!(!Compatibility::Evm.is_fiat_like());
        assert!(!Compatibility::Tron.is_fiat_like());
    }

    #[test]
    fn test_chain_deserializes_with_defaults() {
        let chain: Chain = toml::from_str(
            r#"
            code = "ETH"
            name = "Ethereum"
            compatibility = "EVM"
            decimals = 18
            explorer = { url = "https://etherscan.io/" }
            "#,
        )
        .unwrap();
        assert_eq!(chain.supported_locations, both_locations());
        assert!(!chain.disabled);
        assert_eq!(
            chain.explorer_tx_url("0xabc").as_deref(),
            Some("https://etherscan.io/tx/0xabc")
        );
    }
}

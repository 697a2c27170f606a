//! Per-location chain whitelist/blacklist policy.
//!
//! A chain is usable at a location iff it statically supports that
//! location AND the location's filter admits its code. A location with no
//! filter behaves as an empty blacklist.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::chain::{ChainMap, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Whitelist,
    Blacklist,
}

/// Filter for a single location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationFilter {
    pub mode: FilterMode,
    pub chains: BTreeSet<String>,
}

impl LocationFilter {
    pub fn admits(&self, code: &str) -> bool {
        let listed = self.chains.contains(code);
        match self.mode {
            FilterMode::Whitelist => listed,
            FilterMode::Blacklist => !listed,
        }
    }
}

/// Origin/target filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChainFilterConfig {
    #[serde(default)]
    pub origin: Option<LocationFilter>,
    #[serde(default)]
    pub target: Option<LocationFilter>,
}

impl ChainFilterConfig {
    pub const fn for_location(&self, location: Location) -> Option<&LocationFilter> {
        match location {
            Location::Origin => self.origin.as_ref(),
            Location::Target => self.target.as_ref(),
        }
    }
}

/// Pure filter over one registry snapshot.
///
/// Borrowing the map (rather than holding its own copy) guarantees the
/// filter never observes a map older than the registry's current one.
#[derive(Debug, Clone, Copy)]
pub struct ChainFilter<'a> {
    chains: &'a ChainMap,
    location: Location,
    config: &'a ChainFilterConfig,
}

impl<'a> ChainFilter<'a> {
    pub const fn new(chains: &'a ChainMap, location: Location, config: &'a ChainFilterConfig) -> Self {
        Self {
            chains,
            location,
            config,
        }
    }

    pub fn is_supported_chain(&self, code: &str) -> bool {
        let Some(chain) = self.chains.get(code) else {
            return false;
        };
        if !chain.statically_supports(self.location) {
            return false;
        }
        self.config
            .for_location(self.location)
            .is_none_or(|f| f.admits(code))
    }

    /// Codes of every chain usable at this location, in map order.
    pub fn supported_codes(&self) -> Vec<&'a str> {
        self.chains
            .keys()
            .filter(|code| self.is_supported_chain(code))
            .map(String::as_str)
            .collect()
    }
}

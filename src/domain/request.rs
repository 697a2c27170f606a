//! Inbound transaction requests.
//!
//! Requests are stateless per call: nothing here is persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Backend operation a request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    Transfer,
    Swap,
    External,
    HtlcLock,
}

impl TransactionKind {
    /// Backend submit path for this kind.
    pub const fn submit_path(self) -> &'static str {
        match self {
            Self::Transfer => "/submit/transfer",
            Self::Swap => "/submit/swap",
            Self::External => "/submit/external",
            Self::HtlcLock => "/submit/htlc-lock",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Swap => "swap",
            Self::External => "external",
            Self::HtlcLock => "htlc_lock",
        }
    }
}

/// Widget mode.
///
/// In `Bridge` mode the user's wallet signs the approval client-side;
/// `Light` and `Payment` have the gateway sign it server-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    #[default]
    Bridge,
    Light,
    Payment,
}

impl TransactionMode {
    pub const fn signs_server_side(self) -> bool {
        matches!(self, Self::Light | Self::Payment)
    }
}

/// Which leg pays the fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeDeduction {
    #[default]
    Origin,
    Target,
}

/// Bitcoin-style hash time-locked contract parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcParams {
    pub hash: String,
    pub vout: u32,
    pub expiration: u64,
    pub version: u32,
}

/// A cross-chain transfer/swap request as received from the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub origin_chain: String,
    #[serde(default)]
    pub origin_address: String,
    pub origin_symbol: String,
    pub target_chain: String,
    #[serde(default)]
    pub target_address: String,
    pub target_symbol: String,
    /// Integer string scaled by `10^decimals`.
    pub amount: String,
    #[serde(default = "zero")]
    pub fee: String,
    pub decimals: u8,
    #[serde(default)]
    pub htlc: Option<HtlcParams>,
    #[serde(default)]
    pub sender_public_key: Option<String>,
    /// Approval signature produced client-side (bridge mode).
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub fee_deducted_from: FeeDeduction,
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub mode: TransactionMode,
}

fn zero() -> String {
    "0".to_string()
}

impl TransactionRequest {
    /// Non-empty addresses to screen, origin first, deduplicated.
    pub fn screened_addresses(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(2);
        for addr in [&self.origin_address, &self.target_address] {
            if !addr.is_empty() && !out.contains(addr) {
                out.push(addr.clone());
            }
        }
        out
    }

    /// Options serialized the way the backend stores them.
    pub fn serialized_options(&self) -> String {
        serde_json::to_string(&self.options).unwrap_or_else(|_| "{}".to_string())
    }
}

//! Address risk screening results.
//!
//! Only the lowest risk tier is compliant. Anything else, including a
//! tier we do not recognize, is treated as risky.

use serde::{Deserialize, Serialize};

/// Risk tier reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Severe,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    /// Parse a provider tier, case-insensitively. Unrecognized → `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "severe" => Self::Severe,
            _ => Self::Unknown,
        }
    }

    pub const fn is_compliant(self) -> bool {
        matches!(self, Self::Low)
    }
}

/// Per-address screening outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressCheck {
    Scored {
        address: String,
        #[serde(rename = "isCompliant")]
        is_compliant: bool,
        #[serde(rename = "riskScore")]
        risk_score: RiskLevel,
    },
    Failed {
        address: String,
        error: String,
    },
}

impl AddressCheck {
    pub fn scored(address: impl Into<String>, risk: RiskLevel) -> Self {
        Self::Scored {
            address: address.into(),
            is_compliant: risk.is_compliant(),
            risk_score: risk,
        }
    }

    pub fn failed(address: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failed {
            address: address.into(),
            error: error.into(),
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Self::Scored { address, .. } | Self::Failed { address, .. } => address,
        }
    }

    pub const fn is_compliant(&self) -> bool {
        matches!(self, Self::Scored { is_compliant: true, .. })
    }
}

/// Result of screening one batch of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheckResult {
    /// AND over all per-address results.
    pub is_compliant: bool,
    /// The provider could not give an answer ("we don't know").
    pub is_error: bool,
    pub results: Vec<AddressCheck>,
}

impl ComplianceCheckResult {
    /// Gate disabled or nothing to screen.
    pub const fn passed() -> Self {
        Self {
            is_compliant: true,
            is_error: false,
            results: Vec::new(),
        }
    }

    pub fn from_checks(results: Vec<AddressCheck>) -> Self {
        let is_error = results.iter().any(|r| matches!(r, AddressCheck::Failed { .. }));
        let is_compliant = !is_error && results.iter().all(AddressCheck::is_compliant);
        Self {
            is_compliant,
            is_error,
            results,
        }
    }

    /// One error entry per address.
    pub fn provider_error(addresses: &[String], error: &str) -> Self {
        Self {
            is_compliant: false,
            is_error: true,
            results: addresses
                .iter()
                .map(|a| AddressCheck::failed(a.clone(), error))
                .collect(),
        }
    }

    pub fn risky_addresses(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| matches!(r, AddressCheck::Scored { is_compliant: false, .. }))
            .map(AddressCheck::address)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_low_is_compliant() {
        assert!(RiskLevel::Low.is_compliant());
        assert!(!RiskLevel::Medium.is_compliant());
        assert!(!RiskLevel::Severe.is_compliant());
        assert!(!RiskLevel::parse("catastrophic").is_compliant());
        assert_eq!(RiskLevel::parse(" LOW "), RiskLevel::Low);
    }

    #[test]
    fn test_mixed_batch_identifies_risky_address() {
        let result = ComplianceCheckResult::from_checks(vec![
            AddressCheck::scored("A", RiskLevel::Low),
            AddressCheck::scored("B", RiskLevel::High),
        ]);
        assert!(!result.is_compliant);
        assert!(!result.is_error);
        assert_eq!(result.risky_addresses(), vec!["B"]);
    }

    #[test]
    fn test_provider_error_is_not_a_rejection() {
        let addrs = vec!["A".to_string(), "B".to_string()];
        let result = ComplianceCheckResult::provider_error(&addrs, "timeout");
        assert!(result.is_error);
        assert_eq!(result.results.len(), 2);
        assert!(result.risky_addresses().is_empty());
    }

    #[test]
    fn test_serializes_per_address_shape() {
        let json = serde_json::to_value(AddressCheck::scored("A", RiskLevel::Low)).unwrap();
        assert_eq!(json["isCompliant"], true);
        assert_eq!(json["riskScore"], "low");

        let json = serde_json::to_value(AddressCheck::failed("B", "boom")).unwrap();
        assert_eq!(json["address"], "B");
        assert_eq!(json["error"], "boom");
    }
}

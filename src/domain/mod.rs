//! Domain layer - Core gateway model and pure policy.
//!
//! Chains, tokens, filters, amounts, requests, compliance results, fee
//! quotes and the error taxonomy. No network I/O happens here
//! (hexagonal architecture inner ring); everything is testable in isolation.

pub mod address;
pub mod amount;
pub mod chain;
pub mod compliance;
pub mod error;
pub mod fee;
pub mod filter;
pub mod request;
pub mod rotation;

// Re-export core types for convenience
pub use amount::FixedAmount;
pub use chain::{Chain, ChainMap, Compatibility, Location, Protocol, Token};
pub use compliance::{AddressCheck, ComplianceCheckResult, RiskLevel};
pub use error::{ErrorKind, GatewayError, GatewayResponse};
pub use fee::{ApprovalTerms, FeeLeg, FeeResult, TransactionValues};
pub use filter::{ChainFilter, ChainFilterConfig, FilterMode, LocationFilter};
pub use request::{
    FeeDeduction, HtlcParams, TransactionKind, TransactionMode, TransactionRequest,
};
pub use rotation::SignerRotation;

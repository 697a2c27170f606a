//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainBackend`: Registry, pool data and transaction submission
//! - `FeeService`: Authoritative fee quotes
//! - `RiskProvider`: Address risk scoring
//! - `TronNode`: Remote Tron address validation
//! - `MessageSigner` / `OperatorSigner`: Signing capabilities
//! - `PipelineObserver`: Outcome hooks for metrics

pub mod chain_backend;
pub mod fee_service;
pub mod risk_provider;
pub mod signer;
pub mod telemetry;
pub mod tron_node;

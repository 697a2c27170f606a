//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, chain nodes, local key
//! material). Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Backend, fee service and risk provider HTTP clients
//! - `chain`: Chain node calls (Tron address validation)
//! - `metrics`: Prometheus metrics export and health checks
//! - `signing`: EVM, Solana, Tron and operator signers

pub mod api;
pub mod chain;
pub mod metrics;
pub mod signing;

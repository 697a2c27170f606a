//! Chain Adapters - Chain Node Interaction Layer
//!
//! Provides remote checks that cannot be done offline:
//! - Tron address validation via the node's HTTP API

pub mod tron;

pub use tron::TronNodeClient;

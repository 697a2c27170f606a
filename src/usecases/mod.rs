//! Use Cases Layer - Gateway Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the gateway's workflows. Each use case is a self-contained
//! component the orchestrator is assembled from.
//!
//! Use cases:
//! - `MemoCache`: TTL memoization with in-flight de-duplication
//! - `ChainRegistry`: Seed + remote chain/token map, copy-on-write
//! - `TransactionValidator`: Route, address and token checks
//! - `ComplianceGate`: Batch risk screening
//! - `FeeCalculator`: Fee quotes with embedded approval messages
//! - `ApprovalSigner`: Per-family signing dispatch
//! - `Gateway`: Submission pipeline with retry and signer rotation

pub mod approval;
pub mod cache;
pub mod compliance_gate;
pub mod fee_calculator;
pub mod gateway;
pub mod registry;
pub mod validator;

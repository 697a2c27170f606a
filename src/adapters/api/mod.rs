//! Upstream HTTP Adapters
//!
//! Typed clients for the services the gateway depends on. All of them
//! share one `HttpClient` implementation (timeout, concurrency limit,
//! rate limit, bounded read retries).
//!
//! Sub-modules:
//! - `client`: HTTP client with rate limiting and retries
//! - `backend`: Settlement backend (`ChainBackend` port)
//! - `fee_service`: Fee quotes (`FeeService` port)
//! - `risk_provider`: Address risk scoring (`RiskProvider` port)
//! - `types`: Wire envelopes

pub mod backend;
pub mod client;
pub mod fee_service;
pub mod risk_provider;
pub mod types;

pub use backend::HttpChainBackend;
pub use client::{HttpClient, HttpClientConfig};
pub use fee_service::HttpFeeService;
pub use risk_provider::HttpRiskProvider;

//! Prometheus Metrics Registry - Gateway Observability
//!
//! Registers and exposes Prometheus metrics on :9090. Covers
//! submission outcomes, retry attempts, registry refreshes, compliance
//! results and pipeline latency.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::domain::request::TransactionKind;
use crate::ports::telemetry::PipelineObserver;

/// Centralized Prometheus metrics for the gateway.
///
/// All metrics follow the naming convention `chain_gateway_*`.
pub struct GatewayMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Terminal submission outcomes.
    pub submissions: IntCounterVec,
    /// Backend submit attempts (first tries and retries).
    pub submission_attempts: IntCounterVec,
    /// End-to-end pipeline latency (seconds).
    pub pipeline_latency: HistogramVec,
    /// Registry refreshes by result.
    pub registry_refreshes: IntCounterVec,
    /// Chains in the current registry snapshot.
    pub registry_chains: IntGauge,
    /// Compliance gate results.
    pub compliance_checks: IntCounterVec,
}

impl GatewayMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("chain_gateway_submissions_total", "Submissions by terminal outcome"),
            &["kind", "outcome"],
        )?;

        let submission_attempts = IntCounterVec::new(
            Opts::new(
                "chain_gateway_submission_attempts_total",
                "Backend submit attempts",
            ),
            &["kind", "retry"],
        )?;

        let pipeline_latency = HistogramVec::new(
            HistogramOpts::new(
                "chain_gateway_pipeline_latency_seconds",
                "Pipeline latency from receipt to terminal outcome",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["kind"],
        )?;

        let registry_refreshes = IntCounterVec::new(
            Opts::new(
                "chain_gateway_registry_refreshes_total",
                "Chain registry refreshes by result",
            ),
            &["result"],
        )?;

        let registry_chains = IntGauge::new(
            "chain_gateway_registry_chains",
            "Chains in the current registry snapshot",
        )?;

        let compliance_checks = IntCounterVec::new(
            Opts::new(
                "chain_gateway_compliance_checks_total",
                "Compliance gate results",
            ),
            &["result"],
        )?;

        // Register all metrics
        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(submission_attempts.clone()))?;
        registry.register(Box::new(pipeline_latency.clone()))?;
        registry.register(Box::new(registry_refreshes.clone()))?;
        registry.register(Box::new(registry_chains.clone()))?;
        registry.register(Box::new(compliance_checks.clone()))?;

        Ok(Self {
            registry,
            submissions,
            submission_attempts,
            pipeline_latency,
            registry_refreshes,
            registry_chains,
            compliance_checks,
        })
    }

    /// Record one registry refresh.
    pub fn record_refresh(&self, ok: bool, chains: usize) {
        let result = if ok { "ok" } else { "error" };
        self.registry_refreshes.with_label_values(&[result]).inc();
        self.registry_chains
            .set(i64::try_from(chains).unwrap_or(i64::MAX));
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

impl PipelineObserver for GatewayMetrics {
    fn on_submission(&self, kind: TransactionKind, outcome: &str, elapsed: Duration) {
        self.submissions
            .with_label_values(&[kind.as_str(), outcome])
            .inc();
        self.pipeline_latency
            .with_label_values(&[kind.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    fn on_attempt(&self, kind: TransactionKind, retry: bool) {
        let retry = if retry { "true" } else { "false" };
        self.submission_attempts
            .with_label_values(&[kind.as_str(), retry])
            .inc();
    }

    fn on_compliance(&self, result: &str) {
        self.compliance_checks.with_label_values(&[result]).inc();
    }
}

//! Chain Gateway — Entry Point
//!
//! Initializes configuration, logging, upstream clients, signers and the
//! submission orchestrator. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create one HttpClient per upstream (backend, fees, risk, Tron RPC)
//! 4. Create port adapters (ChainBackend, FeeService, RiskProvider, TronNode)
//! 5. Seed the ChainRegistry for the configured network
//! 6. Load approval and operator signers from env vars
//! 7. Assemble the Gateway (validator, compliance, fees, signers, rotation)
//! 8. Initial registry refresh (stale seed data is served on failure)
//! 9. Spawn the registry refresh loop (every TTL)
//! 10. Spawn health server (/live + /ready) and Prometheus exporter
//! 11. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use chain_gateway::adapters::api::{
    HttpChainBackend, HttpClient, HttpClientConfig, HttpFeeService, HttpRiskProvider,
};
use chain_gateway::adapters::chain::TronNodeClient;
use chain_gateway::adapters::metrics::{GatewayMetrics, HealthServer, HealthState};
use chain_gateway::adapters::signing::SignerKeys;
use chain_gateway::config;
use chain_gateway::domain::chain::Location;
use chain_gateway::domain::rotation::SignerRotation;
use chain_gateway::ports::chain_backend::ChainBackend;
use chain_gateway::ports::risk_provider::RiskProvider;
use chain_gateway::ports::telemetry::PipelineObserver;
use chain_gateway::usecases::compliance_gate::ComplianceGate;
use chain_gateway::usecases::fee_calculator::FeeCalculator;
use chain_gateway::usecases::gateway::{Gateway, GatewayParts, RetryPolicy};
use chain_gateway::usecases::registry::ChainRegistry;
use chain_gateway::usecases::validator::TransactionValidator;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.gateway.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.gateway.name,
        version = env!("CARGO_PKG_VERSION"),
        testnet = config.gateway.testnet,
        seed_chains = config.registry.chains.len(),
        "Starting Chain Gateway"
    );

    // ── Shutdown signal channel ─────────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Upstream HTTP clients ────────────────────────────
    let backend_client = Arc::new(
        HttpClient::new(HttpClientConfig::from_backend(&config.backend))
            .context("Failed to create backend client")?,
    );
    let fee_client = Arc::new(
        HttpClient::new(HttpClientConfig::simple(&config.fees.url, config.fees.timeout_ms))
            .context("Failed to create fee service client")?,
    );
    // Tron RPC endpoints come from the registry, so the base URL is empty.
    let tron_client = Arc::new(
        HttpClient::new(HttpClientConfig::simple("", config.tron.timeout_ms))
            .context("Failed to create Tron RPC client")?,
    );

    // ── 4. Port adapters ────────────────────────────────────
    let backend: Arc<dyn ChainBackend> = Arc::new(HttpChainBackend::new(backend_client));
    let fee_service = Arc::new(HttpFeeService::new(fee_client));
    let tron_node = Arc::new(TronNodeClient::new(tron_client));

    let risk_provider: Option<Arc<dyn RiskProvider>> = match config.compliance.url.as_deref() {
        Some(url) => {
            let client = HttpClient::new(HttpClientConfig::simple(url, config.compliance.timeout_ms))
                .context("Failed to create risk provider client")?;
            Some(Arc::new(HttpRiskProvider::new(Arc::new(client))))
        }
        None => {
            warn!("No compliance URL configured, address screening disabled");
            None
        }
    };

    // ── 5. Chain registry ───────────────────────────────────
    let refresh_ttl = Duration::from_secs(config.registry.refresh_ttl_seconds);
    let fetch_timeout = Duration::from_millis(config.backend.timeout_ms);
    let registry = Arc::new(ChainRegistry::new(
        config.registry.chains.clone(),
        config.gateway.testnet,
        config.registry.filters.clone(),
        Arc::clone(&backend),
        refresh_ttl,
        fetch_timeout,
    ));

    // ── 6. Signers from env vars ────────────────────────────
    let signers = SignerKeys::from_env()
        .into_approval_signer()
        .context("Failed to load signer keys")?;
    let rotation = SignerRotation::new(config.submission.signer_addresses.clone())
        .context("Invalid signer pool")?;

    // ── 7. Submission orchestrator ──────────────────────────
    let metrics = Arc::new(GatewayMetrics::new().context("Failed to register metrics")?);
    let gateway = Arc::new(
        Gateway::new(GatewayParts {
            registry: Arc::clone(&registry),
            validator: TransactionValidator::new(tron_node, config.gateway.testnet),
            compliance: ComplianceGate::new(risk_provider),
            fees: FeeCalculator::new(fee_service, config.fees.creator.clone()),
            signers,
            backend,
            rotation,
            retry: RetryPolicy {
                max_attempts: config.submission.max_attempts,
                base_delay: Duration::from_millis(config.submission.retry_base_delay_ms),
            },
            aux_ttl: Duration::from_secs(config.backend.aux_cache_ttl_seconds),
            aux_timeout: fetch_timeout,
        })
        .with_observer(Arc::clone(&metrics) as Arc<dyn PipelineObserver>),
    );

    // ── 8. Initial refresh ──────────────────────────────────
    let health = Arc::new(HealthState::new());
    refresh_registry(&registry, &metrics, &health).await;

    let snapshot = gateway.registry().snapshot();
    info!(
        origins = snapshot.supported_chains(Location::Origin).len(),
        targets = snapshot.supported_chains(Location::Target).len(),
        "Routable chains"
    );
    match gateway.pool_balances().await {
        Ok(balances) => info!(pools = balances.len(), "Pool balances warmed"),
        Err(e) => warn!(error = %e, "Pool balance warm-up failed"),
    }

    // ── 9. Registry refresh loop ────────────────────────────
    let refresh_handle = {
        let registry = Arc::clone(&registry);
        let metrics = Arc::clone(&metrics);
        let health = Arc::clone(&health);
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh_ttl);
            // First tick fires immediately; the initial refresh already ran.
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!("Refresh loop received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        refresh_registry(&registry, &metrics, &health).await;
                    }
                }
            }
        })
    };

    // ── 10. Health and metrics servers ──────────────────────
    let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let metrics_handle = if config.metrics.enabled {
        let metrics_shutdown = shutdown_tx.subscribe();
        let bind = config.metrics.bind_address.clone();
        let exporter = Arc::clone(&metrics);
        Some(tokio::spawn(async move {
            if let Err(e) = exporter.serve(bind, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        None
    };

    info!("All tasks spawned — gateway is running");

    // ── 11. Wait for SIGINT ─────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    // 1. Readiness probe → 503
    health.begin_shutdown();

    // 2. Signal all tasks to stop
    let _ = shutdown_tx.send(());

    // 3. Wait for the refresh loop (up to 5s)
    let _ = tokio::time::timeout(Duration::from_secs(5), refresh_handle).await;

    // 4. Wait for servers to drain (up to 5s each)
    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Refresh the registry and publish the outcome to metrics and health.
async fn refresh_registry(registry: &ChainRegistry, metrics: &GatewayMetrics, health: &HealthState) {
    let ok = match registry.refresh().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Registry refresh failed, serving previous map");
            false
        }
    };
    metrics.record_refresh(ok, registry.snapshot().chains().len());
    health.record_refresh(registry.has_merged(), !registry.last_refresh_failed());
}

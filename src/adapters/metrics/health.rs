//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7. Readiness requires
//! a registry that has merged backend data at least once and whose last
//! refresh succeeded, and a process that is not shutting down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Registry merged remote data at least once.
    pub registry_merged: Arc<AtomicBool>,
    /// Last registry refresh succeeded.
    pub registry_fresh: Arc<AtomicBool>,
    /// Shutdown has begun.
    pub shutting_down: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Not ready until the first successful refresh.
    pub fn new() -> Self {
        Self {
            registry_merged: Arc::new(AtomicBool::new(false)),
            registry_fresh: Arc::new(AtomicBool::new(false)),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Record the outcome of a registry refresh.
    pub fn record_refresh(&self, merged_once: bool, ok: bool) {
        self.registry_merged.store(merged_once, Ordering::Relaxed);
        self.registry_fresh.store(ok, Ordering::Relaxed);
    }

    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
    }

    /// Check if the gateway is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        self.registry_merged.load(Ordering::Relaxed)
            && self.registry_fresh.load(Ordering::Relaxed)
            && !self.shutting_down.load(Ordering::Relaxed)
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    /// Health state shared with all components.
    state: Arc<HealthState>,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: Arc<HealthState>, port: u16) -> Self {
        Self { state, port }
    }

    fn router(state: Arc<HealthState>) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(state)
    }

    /// Start the health check server.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Self::router(Arc::clone(&self.state));

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 only once the registry is merged and fresh.
    async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
        if state.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_transitions() {
        let state = HealthState::new();
        assert!(!state.is_ready());

        state.record_refresh(true, true);
        assert!(state.is_ready());

        state.record_refresh(true, false);
        assert!(!state.is_ready());

        state.record_refresh(true, true);
        state.begin_shutdown();
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn test_readiness_handler_status() {
        let state = Arc::new(HealthState::new());
        let resp = HealthServer::readiness(State(Arc::clone(&state)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.record_refresh(true, true);
        let resp = HealthServer::readiness(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

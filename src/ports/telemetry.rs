//! Telemetry Port - Pipeline Observation Hooks
//!
//! Lets the orchestrator report outcomes without knowing the metrics
//! backend. Every hook defaults to a no-op.

use std::time::Duration;

use crate::domain::request::TransactionKind;

pub trait PipelineObserver: Send + Sync + 'static {
  /// A submission reached a terminal outcome (`accepted` or an error kind label).
  fn on_submission(&self, _kind: TransactionKind, _outcome: &str, _elapsed: Duration) {}

  /// One backend submit attempt was made.
  fn on_attempt(&self, _kind: TransactionKind, _retry: bool) {}

  /// The compliance gate produced a result (`passed`, `rejected`, `error`).
  fn on_compliance(&self, _result: &str) {}
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

//! Gateway error taxonomy.
//!
//! Every terminal failure carries a stable discriminator so callers can
//! tell "fix your input" from "pick other addresses", "do not retry" and
//! "retry later". Only `Transport` is ever retried.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::compliance::ComplianceCheckResult;

/// Stable, serializable error discriminator exposed to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NonCompliant,
    ComplianceUnavailable,
    BackendRejected,
    Transport,
    Signing,
    Config,
}

impl ErrorKind {
    /// Label used in metrics and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NonCompliant => "non_compliant",
            Self::ComplianceUnavailable => "compliance_unavailable",
            Self::BackendRejected => "backend_rejected",
            Self::Transport => "transport",
            Self::Signing => "signing",
            Self::Config => "config",
        }
    }
}

/// Every failure the gateway can surface.
///
/// `Clone` because a single in-flight upstream call may resolve for
/// many concurrent waiters (see `usecases::cache`).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Bad route, address, token or request shape. Client's fault.
    #[error("{0}")]
    Validation(String),

    /// One or more addresses failed risk screening.
    #[error("high risk address detected: {}", .0.risky_addresses().join(", "))]
    NonCompliant(ComplianceCheckResult),

    /// The risk provider could not be reached or returned garbage.
    #[error("compliance provider unavailable: {0}")]
    ComplianceUnavailable(String),

    /// Structured error embedded in a successful backend response.
    #[error("backend rejected transaction [{code}]: {message}")]
    BackendRejected { code: String, message: String },

    /// Timeout, connection failure or 5xx from any upstream.
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing key material, unsupported family, failed self-check.
    #[error("signing error: {0}")]
    Signing(String),

    /// Misconfiguration detected at runtime.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NonCompliant(_) => ErrorKind::NonCompliant,
            Self::ComplianceUnavailable(_) => ErrorKind::ComplianceUnavailable,
            Self::BackendRejected { .. } => ErrorKind::BackendRejected,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Signing(_) => ErrorKind::Signing,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP-equivalent status for the (external) API layer.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NonCompliant(_) => 403,
            Self::BackendRejected { .. } => 422,
            Self::Transport(_) => 502,
            Self::ComplianceUnavailable(_) => 503,
            Self::Signing(_) | Self::Config(_) => 500,
        }
    }

    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {e}"))
        } else if e.is_decode() {
            Self::Transport(format!("malformed upstream response: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Response envelope handed to the HTTP layer.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GatewayResponse<T> {
    Ok {
        ok: bool,
        result: T,
    },
    Err {
        ok: bool,
        #[serde(rename = "errorKind")]
        error_kind: ErrorKind,
        detail: serde_json::Value,
    },
}

impl<T> From<Result<T, GatewayError>> for GatewayResponse<T> {
    fn from(result: Result<T, GatewayError>) -> Self {
        match result {
            Ok(result) => Self::Ok { ok: true, result },
            Err(e) => {
                let detail = match &e {
                    GatewayError::NonCompliant(check) => {
                        serde_json::to_value(check).unwrap_or_else(|_| e.to_string().into())
                    }
                    GatewayError::BackendRejected { code, message } => {
                        serde_json::json!({ "code": code, "message": message })
                    }
                    other => serde_json::Value::String(other.to_string()),
                };
                Self::Err {
                    ok: false,
                    error_kind: e.kind(),
                    detail,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(GatewayError::transport("timeout").is_retryable());
        assert!(!GatewayError::validation("bad").is_retryable());
        assert!(!GatewayError::signing("no key").is_retryable());
        assert!(
            !GatewayError::BackendRejected {
                code: "5".into(),
                message: "insufficient funds".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_status_codes_are_distinct_per_remediation() {
        let invalid = GatewayError::validation("x").status_code();
        let risky = GatewayError::NonCompliant(ComplianceCheckResult::passed()).status_code();
        let rejected = GatewayError::BackendRejected {
            code: "1".into(),
            message: "m".into(),
        }
        .status_code();
        let unreachable = GatewayError::transport("x").status_code();

        assert_eq!(invalid, 400);
        assert_eq!(risky, 403);
        assert_eq!(rejected, 422);
        assert_eq!(unreachable, 502);
    }

    #[test]
    fn test_response_envelope_carries_error_kind() {
        let resp: GatewayResponse<()> = Err(GatewayError::BackendRejected {
            code: "13".into(),
            message: "insufficient fee".into(),
        })
        .into();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["errorKind"], "backend_rejected");
        assert_eq!(json["detail"]["code"], "13");
        assert_eq!(json["detail"]["message"], "insufficient fee");
    }
}

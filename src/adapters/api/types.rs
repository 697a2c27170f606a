//! Upstream Request/Response Envelopes
//!
//! Wire shapes that only the HTTP adapters see. Port types live in
//! `crate::ports`; these wrap or unwrap them.

use serde::{Deserialize, Serialize};

use crate::ports::risk_provider::RiskScoreEntry;

/// A list returned either bare or under a `data` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
  Bare(Vec<T>),
  Wrapped { data: Vec<T> },
}

impl<T> ListResponse<T> {
  pub fn into_vec(self) -> Vec<T> {
    match self {
      Self::Bare(items) | Self::Wrapped { data: items } => items,
    }
  }
}

/// Body of a risk provider request.
#[derive(Debug, Clone, Serialize)]
pub struct RiskRequest<'a> {
  pub addresses: &'a [String],
}

/// Risk provider reply: a bare score list or a status envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RiskResponse {
  Scores(Vec<RiskScoreEntry>),
  Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<RiskScoreEntry>>,
  },
}

impl RiskResponse {
  /// Scores, or the provider's failure message.
  pub fn into_scores(self) -> Result<Vec<RiskScoreEntry>, String> {
    match self {
      Self::Scores(scores) => Ok(scores),
      Self::Envelope { status, message, .. } if status.eq_ignore_ascii_case("fail") => {
        Err(message.unwrap_or_else(|| "risk provider reported failure".to_string()))
      }
      Self::Envelope { data: Some(scores), .. } => Ok(scores),
      Self::Envelope { status, .. } => Err(format!("risk provider returned no scores (status {status})")),
    }
  }
}

/// Tron `wallet/validateaddress` request.
#[derive(Debug, Clone, Serialize)]
pub struct TronValidateRequest<'a> {
  pub address: &'a str,
  pub visible: bool,
}

/// Tron `wallet/validateaddress` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TronValidateResponse {
  pub result: bool,
  #[serde(default)]
  pub message: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_list_response_shapes() {
    let bare: ListResponse<u32> = serde_json::from_str("[1, 2]").unwrap();
    let wrapped: ListResponse<u32> = serde_json::from_str(r#"{"data": [3]}"#).unwrap();
    assert_eq!(bare.into_vec(), vec![1, 2]);
    assert_eq!(wrapped.into_vec(), vec![3]);
  }

  #[test]
  fn test_risk_fail_envelope_is_error() {
    let resp: RiskResponse =
      serde_json::from_str(r#"{"status": "fail", "message": "quota exceeded"}"#).unwrap();
    assert_eq!(resp.into_scores().unwrap_err(), "quota exceeded");
  }

  #[test]
  fn test_risk_bare_scores() {
    let resp: RiskResponse = serde_json::from_str(
      r#"[{"address": "A", "risk_score": "low", "category": "exchange"}]"#,
    )
    .unwrap();
    let scores = resp.into_scores().unwrap();
    assert_eq!(scores[0].risk_score, "low");
  }
}

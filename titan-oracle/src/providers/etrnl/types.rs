//! ETRNL wire types

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/tags/verify-authenticity`.
///
/// Exactly one of `tt` and `cmac` is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub tag_id: String,
    pub e_code: String,
    pub enc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmac: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub authentic: Option<bool>,
    #[serde(default)]
    pub uid: Option<String>,
    /// Number or numeric string. Sometimes absent or `null`.
    #[serde(default)]
    pub ctr: Option<serde_json::Value>,
    #[serde(default)]
    pub tt_curr_status: Option<String>,
    #[serde(default)]
    pub tt_perm_status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerifyResponse {
    /// Tap counter, with a missing value read as 0.
    pub fn counter(&self) -> Result<i64, String> {
        match &self.ctr {
            None => Ok(0),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| format!("counter {} is not an integer", n)),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(0),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| format!("counter {:?} is not an integer", s)),
            Some(other) => Err(format!("unexpected counter value {}", other)),
        }
    }
}

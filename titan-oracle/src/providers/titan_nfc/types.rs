//! Titan NFC wire types

use serde::Deserialize;

/// Answer of the Titan NFC verification endpoint.
///
/// The service replies either with a JSON object or with a bare boolean.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VerifyResponse {
    Detailed(VerifyDetails),
    Bare(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerifyDetails {
    #[serde(default)]
    pub authentic: Option<bool>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, alias = "counter")]
    pub ctr: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub permanent_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_boolean_body() {
        let resp: VerifyResponse = serde_json::from_str("false").unwrap();
        assert_eq!(resp, VerifyResponse::Bare(false));
    }

    #[test]
    fn test_counter_alias() {
        let resp: VerifyResponse =
            serde_json::from_str(r#"{"authentic":true,"counter":12,"status":"ok"}"#).unwrap();
        match resp {
            VerifyResponse::Detailed(d) => {
                assert_eq!(d.ctr, Some(12));
                assert_eq!(d.status.as_deref(), Some("ok"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

//! Proof material presented by a scanner and the oracle's normalized verdict.

use serde::{Deserialize, Serialize};

/// Cryptographic material read off the tag by the scanning client.
///
/// Exactly one shape is supplied per scan; adapters never guess between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProofMaterial {
    /// Encrypted payload plus tamper-loop token.
    TamperToken {
        enc: String,
        e_code: String,
        tamper_token: String,
    },
    /// Encrypted payload plus message authentication code.
    Mac {
        enc: String,
        e_code: String,
        cmac: String,
    },
    /// Single opaque payload verified server side.
    Sealed { data: String },
}

impl ProofMaterial {
    /// Short name used in logs and rejection reasons.
    pub fn mode(&self) -> &'static str {
        match self {
            ProofMaterial::TamperToken { .. } => "tamper_token",
            ProofMaterial::Mac { .. } => "mac",
            ProofMaterial::Sealed { .. } => "sealed",
        }
    }
}

/// Canonical oracle result, independent of the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleVerdict {
    pub authentic: bool,
    /// Hardware uid of the chip.
    pub uid: String,
    /// Tap counter reported by the chip.
    pub counter: i64,
    pub tamper_current: Option<String>,
    pub tamper_permanent: Option<String>,
}

impl OracleVerdict {
    pub fn authentic(uid: impl Into<String>, counter: i64) -> Self {
        Self {
            authentic: true,
            uid: uid.into(),
            counter,
            tamper_current: None,
            tamper_permanent: None,
        }
    }

    pub fn with_tamper(mut self, current: Option<String>, permanent: Option<String>) -> Self {
        self.tamper_current = current;
        self.tamper_permanent = permanent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_modes() {
        let tt = ProofMaterial::TamperToken {
            enc: "e".into(),
            e_code: "c".into(),
            tamper_token: "t".into(),
        };
        assert_eq!(tt.mode(), "tamper_token");
        assert_eq!(ProofMaterial::Sealed { data: "d".into() }.mode(), "sealed");
    }

    #[test]
    fn test_proof_serializes_tagged() {
        let json = serde_json::to_value(ProofMaterial::Mac {
            enc: "e".into(),
            e_code: "c".into(),
            cmac: "m".into(),
        })
        .unwrap();
        assert_eq!(json["mode"], "mac");
        assert_eq!(json["cmac"], "m");
    }
}

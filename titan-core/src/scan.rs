//! Scan pipeline inputs and outputs.

use crate::{
    CardId, CardInstance, ClientMeta, OracleProvider, OracleVerdict, ProofMaterial, ScanState,
    TemplateId,
};
use serde::{Deserialize, Serialize};

/// A normalized scan invocation, produced by the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub provider: OracleProvider,
    pub tag_external_id: String,
    pub proof: ProofMaterial,
    /// Needed only when the tag has never been minted.
    pub template_hint: Option<String>,
    pub client: ClientMeta,
}

/// A scan the oracle vouched for, ready for the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedScan {
    pub provider: OracleProvider,
    pub tag_uid: String,
    pub tag_external_id: String,
    pub counter: i64,
    pub tamper_current: Option<String>,
    pub tamper_permanent: Option<String>,
    pub client: ClientMeta,
}

impl VerifiedScan {
    pub fn from_verdict(request: &ScanRequest, verdict: OracleVerdict) -> Self {
        Self {
            provider: request.provider,
            tag_uid: verdict.uid,
            tag_external_id: request.tag_external_id.clone(),
            counter: verdict.counter,
            tamper_current: verdict.tamper_current,
            tamper_permanent: verdict.tamper_permanent,
            client: request.client.clone(),
        }
    }
}

/// How an operator vouches for a tag bound ahead of its first scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindEvidence {
    /// Proof material, checked with the ETRNL oracle before binding.
    Proof(ProofMaterial),
    /// Chip uid read by fulfillment hardware. Taken on trust, counter 0.
    Uid(String),
}

/// Operator request to bind a tag to a known template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    pub template_id: TemplateId,
    pub tag_external_id: String,
    pub evidence: BindEvidence,
}

/// Result of a successful pass through the binder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub authentic: bool,
    pub state: ScanState,
    pub card_id: CardId,
    /// True when this scan created the instance.
    pub minted: bool,
    pub serial_no: i64,
    pub template_id: TemplateId,
}

impl ScanOutcome {
    pub fn for_instance(card: &CardInstance, minted: bool) -> Self {
        Self {
            authentic: true,
            state: card.scan_state(),
            card_id: card.card_id,
            minted,
            serial_no: card.serial_no,
            template_id: card.template_id,
        }
    }
}

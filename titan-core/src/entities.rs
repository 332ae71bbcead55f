//! Persisted entities: templates, card instances and scan audit records.

use crate::{
    AthleteId, CardId, CardStatus, CardVersion, EntityIdType, OracleProvider, PrincipalId,
    ScanEventId, ScanState, TemplateId, Timestamp, ValidationError,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// CARD TEMPLATE
// ============================================================================

/// A printable/mintable card design.
///
/// `minted_count` is the authoritative source of the next serial number and
/// never decreases. When `edition_cap` is set, `minted_count <= edition_cap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub template_id: TemplateId,
    pub athlete_id: AthleteId,
    pub version: CardVersion,
    /// Identifier shared with the print vendor / legacy URLs.
    pub external_group_id: Option<String>,
    /// Human-facing SKU such as `SL-REG`.
    pub sku_code: Option<String>,
    pub edition_cap: Option<i64>,
    pub minted_count: i64,
    pub created_at: Timestamp,
}

impl CardTemplate {
    pub fn new(athlete_id: AthleteId, version: CardVersion) -> Self {
        Self {
            template_id: TemplateId::now_v7(),
            athlete_id,
            version,
            external_group_id: None,
            sku_code: None,
            edition_cap: None,
            minted_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_external_group(mut self, group_id: impl Into<String>) -> Self {
        self.external_group_id = Some(group_id.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku_code = Some(sku.into());
        self
    }

    pub fn with_edition_cap(mut self, cap: i64) -> Self {
        self.edition_cap = Some(cap);
        self
    }

    pub fn with_minted_count(mut self, minted: i64) -> Self {
        self.minted_count = minted;
        self
    }

    /// Serial the next mint would receive, or `None` if the cap is exhausted.
    pub fn next_serial(&self) -> Option<i64> {
        let next = self.minted_count.checked_add(1)?;
        match self.edition_cap {
            Some(cap) if next > cap => None,
            _ => Some(next),
        }
    }

    pub fn remaining(&self) -> Option<i64> {
        self.edition_cap.map(|cap| (cap - self.minted_count).max(0))
    }

    /// Check the invariants catalog provisioning must respect.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.minted_count < 0 {
            return Err(ValidationError::InvalidValue {
                field: "minted_count".into(),
                reason: "must be >= 0".into(),
            });
        }
        if let Some(cap) = self.edition_cap {
            if cap < 1 {
                return Err(ValidationError::InvalidValue {
                    field: "edition_cap".into(),
                    reason: "must be >= 1 when set".into(),
                });
            }
            if self.minted_count > cap {
                return Err(ValidationError::InvalidValue {
                    field: "minted_count".into(),
                    reason: format!("{} exceeds edition cap {}", self.minted_count, cap),
                });
            }
        }
        for (field, value) in [
            ("sku_code", &self.sku_code),
            ("external_group_id", &self.external_group_id),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    reason: "must not be blank".into(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// CARD INSTANCE
// ============================================================================

/// One physical card, bound to exactly one NFC tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    pub card_id: CardId,
    pub template_id: TemplateId,
    /// 1-based, unique within the template, never reused.
    pub serial_no: i64,
    /// Hardware identifier of the chip. Globally unique.
    pub tag_uid: String,
    /// Identifier presented alongside proof material. Globally unique.
    pub tag_external_id: String,
    /// Highest accepted tap counter. Never decreases.
    pub last_ctr: i64,
    pub status: CardStatus,
    pub owner_principal_id: Option<PrincipalId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CardInstance {
    /// A freshly minted, unassigned card.
    pub fn mint(
        template_id: TemplateId,
        serial_no: i64,
        tag_uid: impl Into<String>,
        tag_external_id: impl Into<String>,
        counter: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            card_id: CardId::now_v7(),
            template_id,
            serial_no,
            tag_uid: tag_uid.into(),
            tag_external_id: tag_external_id.into(),
            last_ctr: counter,
            status: CardStatus::Unassigned,
            owner_principal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner_principal_id.is_some()
    }

    pub fn is_owned_by(&self, principal: PrincipalId) -> bool {
        self.owner_principal_id == Some(principal)
    }

    /// State reported to an anonymous scanner.
    pub fn scan_state(&self) -> ScanState {
        if self.is_owned() {
            ScanState::OwnedByOther
        } else {
            ScanState::Unclaimed
        }
    }
}

// ============================================================================
// SCAN EVENT
// ============================================================================

/// Network metadata of the scanning client, supplied by the request layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }
}

/// Immutable audit record of a scan that passed through the binder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub scan_id: ScanEventId,
    pub card_id: CardId,
    pub tag_external_id: String,
    pub tag_uid: String,
    pub counter: i64,
    pub authentic: bool,
    pub tamper_current: Option<String>,
    pub tamper_permanent: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub provider: OracleProvider,
    pub created_at: Timestamp,
}

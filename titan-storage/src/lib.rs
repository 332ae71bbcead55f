//! TITAN Storage - Transactional card storage
//!
//! Defines the storage seam the minting core runs against:
//!
//! - [`CardStore`] is the connection-level handle. It opens transactions and
//!   serves read-only views plus catalog provisioning.
//! - [`CardTx`] is one open transaction. Row locks (`*_lock`) are held until
//!   `commit` or `rollback`, and nothing written inside it is visible to other
//!   transactions before a successful commit.
//!
//! [`MemoryStore`] implements both with real per-row locks and uniqueness
//! checks, so the concurrency properties of the core can be exercised without
//! a database. The PostgreSQL implementation lives in `titan-api`.

mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{CardStore, CardTx};

use titan_core::{CardStatus, PrincipalId};

/// Update payload for card instances.
///
/// `None` leaves a column untouched. Ownership can only ever be set, never
/// cleared, so there is no way to express "remove owner" here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceUpdate {
    pub last_ctr: Option<i64>,
    pub status: Option<CardStatus>,
    pub owner_principal_id: Option<PrincipalId>,
}

impl InstanceUpdate {
    pub fn counter(last_ctr: i64) -> Self {
        Self {
            last_ctr: Some(last_ctr),
            ..Default::default()
        }
    }

    pub fn claim(owner: PrincipalId) -> Self {
        Self {
            status: Some(CardStatus::Claimed),
            owner_principal_id: Some(owner),
            ..Default::default()
        }
    }

    pub fn status(status: CardStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_ctr.is_none() && self.status.is_none() && self.owner_principal_id.is_none()
    }
}

/// Names of the uniqueness constraints every store enforces.
pub mod constraints {
    pub const TAG_UID: &str = "tag_uid";
    pub const TAG_EXTERNAL_ID: &str = "tag_external_id";
    pub const TEMPLATE_SERIAL: &str = "template_serial";
    pub const SKU_CODE: &str = "sku_code";
    pub const PRIMARY_KEY: &str = "primary_key";
}

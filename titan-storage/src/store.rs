//! Async storage traits.

use crate::InstanceUpdate;
use async_trait::async_trait;
use titan_core::{
    CardId, CardInstance, CardTemplate, PrincipalId, ScanEvent, TemplateId, TitanResult,
};

/// Connection-level storage handle.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> TitanResult<Box<dyn CardTx>>;

    /// Round trip to the backend, for readiness checks.
    async fn ping(&self) -> TitanResult<()>;

    // ========================================================================
    // CATALOG
    // ========================================================================

    /// Insert a template. Used by catalog provisioning and test seeding.
    async fn template_insert(&self, template: &CardTemplate) -> TitanResult<()>;

    async fn template_get(&self, id: TemplateId) -> TitanResult<Option<CardTemplate>>;

    /// Every template, oldest first.
    async fn templates_list(&self) -> TitanResult<Vec<CardTemplate>>;

    // ========================================================================
    // READ VIEWS (committed state only)
    // ========================================================================

    async fn instance_get(&self, id: CardId) -> TitanResult<Option<CardInstance>>;

    async fn instance_get_by_tag_uid(&self, tag_uid: &str) -> TitanResult<Option<CardInstance>>;

    /// All instances of a template ordered by serial number.
    async fn instances_for_template(&self, id: TemplateId) -> TitanResult<Vec<CardInstance>>;

    /// Cards owned by `owner`, newest first.
    async fn instances_for_owner(&self, owner: PrincipalId) -> TitanResult<Vec<CardInstance>>;

    /// Audit history of a card ordered by creation time.
    async fn scan_events_for_card(&self, id: CardId) -> TitanResult<Vec<ScanEvent>>;
}

/// One open transaction.
///
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait CardTx: Send {
    // ========================================================================
    // TEMPLATES
    // ========================================================================

    async fn template_get(&mut self, id: TemplateId) -> TitanResult<Option<CardTemplate>>;

    async fn templates_by_external_group(&mut self, group_id: &str) -> TitanResult<Vec<CardTemplate>>;

    async fn templates_by_sku(&mut self, sku_code: &str) -> TitanResult<Vec<CardTemplate>>;

    /// Read a template and hold an exclusive lock on its row.
    async fn template_lock(&mut self, id: TemplateId) -> TitanResult<Option<CardTemplate>>;

    /// Overwrite `minted_count`. The row must be locked by this transaction.
    async fn template_set_minted_count(&mut self, id: TemplateId, minted_count: i64) -> TitanResult<()>;

    // ========================================================================
    // INSTANCES
    // ========================================================================

    /// Read the instance bound to a tag uid and lock its row.
    async fn instance_lock_by_tag_uid(&mut self, tag_uid: &str) -> TitanResult<Option<CardInstance>>;

    /// Read an instance by id and lock its row.
    async fn instance_lock(&mut self, id: CardId) -> TitanResult<Option<CardInstance>>;

    /// Insert a new instance.
    ///
    /// Fails with `StorageError::UniqueViolation` when the tag uid, tag
    /// external id or `(template, serial)` is taken. A conflict with a
    /// concurrent uncommitted insert may only surface at `commit`.
    async fn instance_insert(&mut self, card: &CardInstance) -> TitanResult<()>;

    /// Apply an update to a locked instance and return the new row.
    async fn instance_update(&mut self, id: CardId, update: &InstanceUpdate) -> TitanResult<CardInstance>;

    // ========================================================================
    // AUDIT
    // ========================================================================

    async fn scan_event_insert(&mut self, event: &ScanEvent) -> TitanResult<()>;

    // ========================================================================
    // COMPLETION
    // ========================================================================

    async fn commit(self: Box<Self>) -> TitanResult<()>;

    async fn rollback(self: Box<Self>) -> TitanResult<()>;
}

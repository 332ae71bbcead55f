//! Instance Binder
//!
//! Binds a verified tag uid to exactly one card instance. A known tag goes
//! through the replay guard; an unseen tag is minted against a resolved
//! template. Both paths write their audit record in the same transaction.

use crate::resolver::TemplateResolver;
use crate::{audit, finish, replay, serial};
use std::sync::Arc;
use titan_core::{
    CardInstance, MintError, ScanOutcome, StorageError, TemplateId, TitanError, TitanResult,
    VerifiedScan,
};
use titan_storage::{constraints, CardStore, CardTx};

/// Creates or updates the card instance behind a verified scan.
#[derive(Clone)]
pub struct InstanceBinder {
    store: Arc<dyn CardStore>,
    resolver: TemplateResolver,
}

impl InstanceBinder {
    pub fn new(store: Arc<dyn CardStore>) -> Self {
        Self {
            store,
            resolver: TemplateResolver::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: TemplateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn store(&self) -> &Arc<dyn CardStore> {
        &self.store
    }

    /// Bind `scan` to its card instance.
    ///
    /// `template_hint` is consulted only on first sighting. If a concurrent
    /// first sighting of the same tag commits first, the whole attempt is
    /// rolled back and the known-card path runs once against the row that
    /// won, so the replay guard still applies to this scan's counter.
    ///
    /// # Errors
    /// - `MintError::Replay` for a counter at or below the recorded one
    /// - `MintError::UnknownTemplate` / `AmbiguousTemplate` on first sighting
    ///   without a usable hint
    /// - `MintError::EditionCapReached` when the template is full
    pub async fn bind(&self, scan: &VerifiedScan, template_hint: Option<&str>) -> TitanResult<ScanOutcome> {
        match self.bind_once(scan, template_hint).await {
            Err(TitanError::Storage(ref err)) if err.is_unique_violation_on(constraints::TAG_UID) => {
                tracing::info!(
                    tag_uid = %scan.tag_uid,
                    "concurrent first sighting already bound this tag, retrying as known card"
                );
                let mut tx = self.store.begin().await?;
                let result = match tx.instance_lock_by_tag_uid(&scan.tag_uid).await {
                    Ok(Some(card)) => bind_known(tx.as_mut(), card, scan).await,
                    Ok(None) => Err(StorageError::TransactionFailed {
                        reason: format!("tag {} vanished after a unique violation", scan.tag_uid),
                    }
                    .into()),
                    Err(err) => Err(err),
                };
                finish(tx, result).await
            }
            other => other,
        }
    }

    /// Bind a tag to `template_id` before it has ever been scanned.
    ///
    /// Serials come from the same allocator as scan-time minting, so the
    /// edition cap and contiguity hold across both paths. No audit record is
    /// written because no scan took place.
    ///
    /// # Errors
    /// - `MintError::TagAlreadyBound` when the uid already has a card
    /// - `MintError::UnknownTemplate` when the template does not exist
    /// - `MintError::EditionCapReached` when the template is full
    pub async fn bind_as_admin(
        &self,
        template_id: TemplateId,
        tag_uid: &str,
        tag_external_id: &str,
        counter: i64,
    ) -> TitanResult<CardInstance> {
        let mut tx = self.store.begin().await?;
        let result = bind_ahead(tx.as_mut(), template_id, tag_uid, tag_external_id, counter).await;
        finish(tx, result).await
    }

    async fn bind_once(&self, scan: &VerifiedScan, template_hint: Option<&str>) -> TitanResult<ScanOutcome> {
        let mut tx = self.store.begin().await?;
        let result = match tx.instance_lock_by_tag_uid(&scan.tag_uid).await {
            Ok(Some(card)) => bind_known(tx.as_mut(), card, scan).await,
            Ok(None) => self.bind_new(tx.as_mut(), scan, template_hint).await,
            Err(err) => Err(err),
        };
        finish(tx, result).await
    }

    async fn bind_new(
        &self,
        tx: &mut dyn CardTx,
        scan: &VerifiedScan,
        template_hint: Option<&str>,
    ) -> TitanResult<ScanOutcome> {
        let template = self.resolver.resolve(tx, template_hint).await?;
        let serial_no = serial::reserve(tx, template.template_id).await?;

        let card = CardInstance::mint(
            template.template_id,
            serial_no,
            scan.tag_uid.clone(),
            scan.tag_external_id.clone(),
            scan.counter,
        );
        tx.instance_insert(&card).await?;
        audit::append(tx, &card, scan).await?;

        tracing::info!(
            card_id = %card.card_id,
            template_id = %card.template_id,
            serial_no,
            tag_uid = %card.tag_uid,
            "minted card on first sighting"
        );
        Ok(ScanOutcome::for_instance(&card, true))
    }
}

async fn bind_ahead(
    tx: &mut dyn CardTx,
    template_id: TemplateId,
    tag_uid: &str,
    tag_external_id: &str,
    counter: i64,
) -> TitanResult<CardInstance> {
    if let Some(existing) = tx.instance_lock_by_tag_uid(tag_uid).await? {
        return Err(MintError::TagAlreadyBound {
            tag_uid: tag_uid.to_string(),
            card_id: existing.card_id,
        }
        .into());
    }
    if tx.template_get(template_id).await?.is_none() {
        return Err(MintError::UnknownTemplate {
            hint: Some(template_id.to_string()),
        }
        .into());
    }

    let serial_no = serial::reserve(tx, template_id).await?;
    let card = CardInstance::mint(template_id, serial_no, tag_uid, tag_external_id, counter);
    tx.instance_insert(&card).await?;

    tracing::info!(
        card_id = %card.card_id,
        template_id = %template_id,
        serial_no,
        tag_uid = %card.tag_uid,
        "bound tag ahead of first scan"
    );
    Ok(card)
}

async fn bind_known(tx: &mut dyn CardTx, card: CardInstance, scan: &VerifiedScan) -> TitanResult<ScanOutcome> {
    let updated = replay::advance(tx, &card, scan.counter).await?;
    audit::append(tx, &updated, scan).await?;
    tracing::debug!(card_id = %updated.card_id, counter = scan.counter, "known card scanned");
    Ok(ScanOutcome::for_instance(&updated, false))
}

impl std::fmt::Debug for InstanceBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceBinder")
            .field("resolver", &self.resolver)
            .finish()
    }
}

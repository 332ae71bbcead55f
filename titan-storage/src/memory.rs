//! In-memory store with row locks and all-or-nothing commits.

use crate::{constraints, CardStore, CardTx, InstanceUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use titan_core::{
    CardId, CardInstance, CardTemplate, PrincipalId, ScanEvent, StorageError, TemplateId,
    TitanError, TitanResult,
};
use tokio::sync::{Mutex as RowMutex, OwnedMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Template(TemplateId),
    Card(CardId),
}

#[derive(Debug, Default)]
struct Tables {
    templates: HashMap<TemplateId, CardTemplate>,
    instances: HashMap<CardId, CardInstance>,
    by_tag_uid: HashMap<String, CardId>,
    by_tag_external_id: HashMap<String, CardId>,
    by_serial: HashMap<(TemplateId, i64), CardId>,
    events: Vec<ScanEvent>,
}

impl Tables {
    /// First uniqueness constraint `card` would violate, if any.
    fn conflict_for(&self, card: &CardInstance) -> Option<&'static str> {
        if self.instances.contains_key(&card.card_id) {
            return Some(constraints::PRIMARY_KEY);
        }
        if self.by_tag_uid.contains_key(&card.tag_uid) {
            return Some(constraints::TAG_UID);
        }
        if self.by_tag_external_id.contains_key(&card.tag_external_id) {
            return Some(constraints::TAG_EXTERNAL_ID);
        }
        if self.by_serial.contains_key(&(card.template_id, card.serial_no)) {
            return Some(constraints::TEMPLATE_SERIAL);
        }
        None
    }

    fn index(&mut self, card: CardInstance) {
        self.by_tag_uid.insert(card.tag_uid.clone(), card.card_id);
        self.by_tag_external_id
            .insert(card.tag_external_id.clone(), card.card_id);
        self.by_serial
            .insert((card.template_id, card.serial_no), card.card_id);
        self.instances.insert(card.card_id, card);
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: RwLock<Tables>,
    row_locks: Mutex<HashMap<RowKey, Arc<RowMutex<()>>>>,
}

impl Inner {
    fn read(&self) -> TitanResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| TitanError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> TitanResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| TitanError::Storage(StorageError::LockPoisoned))
    }

    fn row_mutex(&self, key: RowKey) -> TitanResult<Arc<RowMutex<()>>> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| TitanError::Storage(StorageError::LockPoisoned))?;
        Ok(locks
            .entry(key)
            .or_insert_with(|| Arc::new(RowMutex::new(())))
            .clone())
    }

    /// Drop lock entries no transaction holds or waits on.
    ///
    /// Holders and waiters keep their own clone of the `Arc`, so a strong
    /// count of one means the map is the last reference.
    fn prune_row_locks(&self, keys: &[RowKey]) {
        let Ok(mut locks) = self.row_locks.lock() else {
            return;
        };
        for key in keys {
            if locks.get(key).is_some_and(|m| Arc::strong_count(m) == 1) {
                locks.remove(key);
            }
        }
    }
}

/// Thread-safe in-memory [`CardStore`].
///
/// Cloning yields another handle to the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> usize {
        self.inner.read().map(|t| t.instances.len()).unwrap_or(0)
    }

    pub fn scan_event_count(&self) -> usize {
        self.inner.read().map(|t| t.events.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn begin(&self) -> TitanResult<Box<dyn CardTx>> {
        Ok(Box::new(MemoryTx {
            inner: Arc::clone(&self.inner),
            held: HashMap::new(),
            pending: WriteSet::default(),
        }))
    }

    async fn ping(&self) -> TitanResult<()> {
        self.inner.read().map(|_| ())
    }

    async fn template_insert(&self, template: &CardTemplate) -> TitanResult<()> {
        template.validate()?;
        let mut tables = self.inner.write()?;
        if tables.templates.contains_key(&template.template_id) {
            return Err(StorageError::UniqueViolation {
                constraint: constraints::PRIMARY_KEY.into(),
            }
            .into());
        }
        if let Some(sku) = &template.sku_code {
            if tables
                .templates
                .values()
                .any(|t| t.sku_code.as_deref() == Some(sku.as_str()))
            {
                return Err(StorageError::UniqueViolation {
                    constraint: constraints::SKU_CODE.into(),
                }
                .into());
            }
        }
        tables
            .templates
            .insert(template.template_id, template.clone());
        Ok(())
    }

    async fn template_get(&self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        Ok(self.inner.read()?.templates.get(&id).cloned())
    }

    async fn templates_list(&self) -> TitanResult<Vec<CardTemplate>> {
        let mut templates: Vec<CardTemplate> =
            self.inner.read()?.templates.values().cloned().collect();
        templates.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.template_id.cmp(&b.template_id))
        });
        Ok(templates)
    }

    async fn instance_get(&self, id: CardId) -> TitanResult<Option<CardInstance>> {
        Ok(self.inner.read()?.instances.get(&id).cloned())
    }

    async fn instance_get_by_tag_uid(&self, tag_uid: &str) -> TitanResult<Option<CardInstance>> {
        let tables = self.inner.read()?;
        Ok(tables
            .by_tag_uid
            .get(tag_uid)
            .and_then(|id| tables.instances.get(id))
            .cloned())
    }

    async fn instances_for_template(&self, id: TemplateId) -> TitanResult<Vec<CardInstance>> {
        let tables = self.inner.read()?;
        let mut cards: Vec<CardInstance> = tables
            .instances
            .values()
            .filter(|c| c.template_id == id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.serial_no);
        Ok(cards)
    }

    async fn instances_for_owner(&self, owner: PrincipalId) -> TitanResult<Vec<CardInstance>> {
        let tables = self.inner.read()?;
        let mut cards: Vec<CardInstance> = tables
            .instances
            .values()
            .filter(|c| c.is_owned_by(owner))
            .cloned()
            .collect();
        cards.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.card_id.cmp(&a.card_id))
        });
        Ok(cards)
    }

    async fn scan_events_for_card(&self, id: CardId) -> TitanResult<Vec<ScanEvent>> {
        let tables = self.inner.read()?;
        let mut events: Vec<ScanEvent> = tables
            .events
            .iter()
            .filter(|e| e.card_id == id)
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.scan_id.cmp(&b.scan_id))
        });
        Ok(events)
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Default)]
struct WriteSet {
    templates: HashMap<TemplateId, CardTemplate>,
    instances: HashMap<CardId, CardInstance>,
    inserted: Vec<CardId>,
    events: Vec<ScanEvent>,
}

/// Transaction over a [`MemoryStore`].
///
/// Writes are buffered and applied under the table lock on commit; row
/// guards are released only after that, mirroring `SELECT ... FOR UPDATE`.
pub(crate) struct MemoryTx {
    inner: Arc<Inner>,
    held: HashMap<RowKey, OwnedMutexGuard<()>>,
    pending: WriteSet,
}

impl MemoryTx {
    async fn lock_row(&mut self, key: RowKey) -> TitanResult<()> {
        if self.held.contains_key(&key) {
            return Ok(());
        }
        let mutex = self.inner.row_mutex(key)?;
        let guard = mutex.lock_owned().await;
        self.held.insert(key, guard);
        Ok(())
    }

    /// Release every row guard this transaction holds.
    fn release(&mut self) {
        if self.held.is_empty() {
            return;
        }
        let keys: Vec<RowKey> = self.held.keys().copied().collect();
        self.held.clear();
        self.inner.prune_row_locks(&keys);
    }

    fn require_lock(&self, key: RowKey) -> TitanResult<()> {
        if self.held.contains_key(&key) {
            Ok(())
        } else {
            Err(StorageError::TransactionFailed {
                reason: format!("{:?} updated without holding its row lock", key),
            }
            .into())
        }
    }

    fn current_template(&self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        if let Some(t) = self.pending.templates.get(&id) {
            return Ok(Some(t.clone()));
        }
        Ok(self.inner.read()?.templates.get(&id).cloned())
    }

    fn current_instance(&self, id: CardId) -> TitanResult<Option<CardInstance>> {
        if let Some(c) = self.pending.instances.get(&id) {
            return Ok(Some(c.clone()));
        }
        Ok(self.inner.read()?.instances.get(&id).cloned())
    }

    fn templates_where(&self, pred: impl Fn(&CardTemplate) -> bool) -> TitanResult<Vec<CardTemplate>> {
        let tables = self.inner.read()?;
        let mut found: Vec<CardTemplate> = tables
            .templates
            .values()
            .filter(|t| pred(t))
            .map(|t| {
                self.pending
                    .templates
                    .get(&t.template_id)
                    .cloned()
                    .unwrap_or_else(|| t.clone())
            })
            .collect();
        found.sort_by_key(|t| t.template_id);
        Ok(found)
    }
}

#[async_trait]
impl CardTx for MemoryTx {
    async fn template_get(&mut self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        self.current_template(id)
    }

    async fn templates_by_external_group(&mut self, group_id: &str) -> TitanResult<Vec<CardTemplate>> {
        self.templates_where(|t| t.external_group_id.as_deref() == Some(group_id))
    }

    async fn templates_by_sku(&mut self, sku_code: &str) -> TitanResult<Vec<CardTemplate>> {
        self.templates_where(|t| t.sku_code.as_deref() == Some(sku_code))
    }

    async fn template_lock(&mut self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        let exists = self.inner.read()?.templates.contains_key(&id);
        if exists {
            self.lock_row(RowKey::Template(id)).await?;
        }
        self.current_template(id)
    }

    async fn template_set_minted_count(&mut self, id: TemplateId, minted_count: i64) -> TitanResult<()> {
        self.require_lock(RowKey::Template(id))?;
        let mut template = self.current_template(id)?.ok_or_else(|| StorageError::NotFound {
            entity: "template",
            id: id.to_string(),
        })?;
        template.minted_count = minted_count;
        self.pending.templates.insert(id, template);
        Ok(())
    }

    async fn instance_lock_by_tag_uid(&mut self, tag_uid: &str) -> TitanResult<Option<CardInstance>> {
        if let Some(own) = self
            .pending
            .inserted
            .iter()
            .filter_map(|id| self.pending.instances.get(id))
            .find(|c| c.tag_uid == tag_uid)
        {
            return Ok(Some(own.clone()));
        }
        let card_id = self.inner.read()?.by_tag_uid.get(tag_uid).copied();
        match card_id {
            Some(id) => self.instance_lock(id).await,
            None => Ok(None),
        }
    }

    async fn instance_lock(&mut self, id: CardId) -> TitanResult<Option<CardInstance>> {
        self.lock_row(RowKey::Card(id)).await?;
        self.current_instance(id)
    }

    async fn instance_insert(&mut self, card: &CardInstance) -> TitanResult<()> {
        let pending_conflict = self
            .pending
            .inserted
            .iter()
            .filter_map(|id| self.pending.instances.get(id))
            .find_map(|own| {
                if own.card_id == card.card_id {
                    Some(constraints::PRIMARY_KEY)
                } else if own.tag_uid == card.tag_uid {
                    Some(constraints::TAG_UID)
                } else if own.tag_external_id == card.tag_external_id {
                    Some(constraints::TAG_EXTERNAL_ID)
                } else if own.template_id == card.template_id && own.serial_no == card.serial_no {
                    Some(constraints::TEMPLATE_SERIAL)
                } else {
                    None
                }
            });
        let conflict = match pending_conflict {
            Some(c) => Some(c),
            None => self.inner.read()?.conflict_for(card),
        };
        if let Some(constraint) = conflict {
            return Err(StorageError::UniqueViolation {
                constraint: constraint.into(),
            }
            .into());
        }
        self.lock_row(RowKey::Card(card.card_id)).await?;
        self.pending.instances.insert(card.card_id, card.clone());
        self.pending.inserted.push(card.card_id);
        Ok(())
    }

    async fn instance_update(&mut self, id: CardId, update: &InstanceUpdate) -> TitanResult<CardInstance> {
        self.require_lock(RowKey::Card(id))?;
        let mut card = self.current_instance(id)?.ok_or_else(|| StorageError::NotFound {
            entity: "card instance",
            id: id.to_string(),
        })?;
        if let Some(ctr) = update.last_ctr {
            card.last_ctr = ctr;
        }
        if let Some(status) = update.status {
            card.status = status;
        }
        if let Some(owner) = update.owner_principal_id {
            card.owner_principal_id = Some(owner);
        }
        card.updated_at = Utc::now();
        self.pending.instances.insert(id, card.clone());
        Ok(card)
    }

    async fn scan_event_insert(&mut self, event: &ScanEvent) -> TitanResult<()> {
        if self.current_instance(event.card_id)?.is_none() {
            return Err(StorageError::NotFound {
                entity: "card instance",
                id: event.card_id.to_string(),
            }
            .into());
        }
        self.pending.events.push(event.clone());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> TitanResult<()> {
        let pending = std::mem::take(&mut self.pending);
        {
            let mut tables = self.inner.write()?;
            for id in &pending.inserted {
                if let Some(card) = pending.instances.get(id) {
                    if let Some(constraint) = tables.conflict_for(card) {
                        tracing::debug!(card_id = %id, constraint, "commit rejected by uniqueness check");
                        return Err(StorageError::UniqueViolation {
                            constraint: constraint.into(),
                        }
                        .into());
                    }
                }
            }
            for (id, template) in pending.templates {
                tables.templates.insert(id, template);
            }
            for (_, card) in pending.instances {
                if tables.instances.contains_key(&card.card_id) {
                    tables.instances.insert(card.card_id, card);
                } else {
                    tables.index(card);
                }
            }
            tables.events.extend(pending.events);
        }
        self.release();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> TitanResult<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_core::{AthleteId, CardVersion, EntityIdType, OracleProvider, ScanEventId};

    fn template() -> CardTemplate {
        CardTemplate::new(AthleteId::now_v7(), CardVersion::Regular)
    }

    fn event_for(card: &CardInstance) -> ScanEvent {
        ScanEvent {
            scan_id: ScanEventId::now_v7(),
            card_id: card.card_id,
            tag_external_id: card.tag_external_id.clone(),
            tag_uid: card.tag_uid.clone(),
            counter: card.last_ctr,
            authentic: true,
            tamper_current: None,
            tamper_permanent: None,
            client_ip: None,
            user_agent: None,
            provider: OracleProvider::Etrnl,
            created_at: Utc::now(),
        }
    }

    async fn seeded() -> (MemoryStore, CardTemplate) {
        let store = MemoryStore::new();
        let t = template().with_sku("SL-REG");
        store.template_insert(&t).await.unwrap();
        (store, t)
    }

    #[tokio::test]
    async fn test_commit_publishes_all_writes() {
        let (store, t) = seeded().await;
        let card = CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1);

        let mut tx = store.begin().await.unwrap();
        tx.template_lock(t.template_id).await.unwrap();
        tx.template_set_minted_count(t.template_id, 1).await.unwrap();
        tx.instance_insert(&card).await.unwrap();
        tx.scan_event_insert(&event_for(&card)).await.unwrap();

        assert!(store.instance_get(card.card_id).await.unwrap().is_none());
        tx.commit().await.unwrap();

        let stored = store.instance_get_by_tag_uid("04AA").await.unwrap().unwrap();
        assert_eq!(stored.card_id, card.card_id);
        assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 1);
        assert_eq!(store.scan_events_for_card(card.card_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let (store, t) = seeded().await;
        {
            let mut tx = store.begin().await.unwrap();
            tx.template_lock(t.template_id).await.unwrap();
            tx.template_set_minted_count(t.template_id, 1).await.unwrap();
            tx.instance_insert(&CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1))
                .await
                .unwrap();
        }
        assert_eq!(store.instance_count(), 0);
        assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 0);

        // The row lock was released by the drop.
        let mut tx = store.begin().await.unwrap();
        assert!(tx.template_lock(t.template_id).await.unwrap().is_some());
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_rejects_committed_duplicates() {
        let (store, t) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.instance_insert(&CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .instance_insert(&CardInstance::mint(t.template_id, 2, "04AA", "TAG-B", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Storage(ref e) if e.is_unique_violation_on(constraints::TAG_UID)));

        let err = tx
            .instance_insert(&CardInstance::mint(t.template_id, 1, "04BB", "TAG-B", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Storage(ref e) if e.is_unique_violation_on(constraints::TEMPLATE_SERIAL)));

        let err = tx
            .instance_insert(&CardInstance::mint(t.template_id, 2, "04BB", "TAG-A", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Storage(ref e) if e.is_unique_violation_on(constraints::TAG_EXTERNAL_ID)));
    }

    #[tokio::test]
    async fn test_concurrent_insert_of_same_tag_fails_at_commit() {
        let (store, t) = seeded().await;
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        first
            .instance_insert(&CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1))
            .await
            .unwrap();
        second
            .instance_insert(&CardInstance::mint(t.template_id, 2, "04AA", "TAG-A", 1))
            .await
            .unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, TitanError::Storage(ref e) if e.is_unique_violation_on(constraints::TAG_UID)));
        assert_eq!(store.instance_count(), 1);
    }

    #[tokio::test]
    async fn test_update_requires_row_lock() {
        let (store, t) = seeded().await;
        let card = CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1);
        let mut tx = store.begin().await.unwrap();
        tx.instance_insert(&card).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .instance_update(card.card_id, &InstanceUpdate::counter(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Storage(StorageError::TransactionFailed { .. })));

        tx.instance_lock(card.card_id).await.unwrap();
        let updated = tx
            .instance_update(card.card_id, &InstanceUpdate::counter(5))
            .await
            .unwrap();
        assert_eq!(updated.last_ctr, 5);
    }

    #[tokio::test]
    async fn test_template_insert_validation() {
        let (store, _) = seeded().await;
        let err = store
            .template_insert(&template().with_sku("SL-REG"))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Storage(ref e) if e.is_unique_violation_on(constraints::SKU_CODE)));

        let err = store
            .template_insert(&template().with_edition_cap(0))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Validation(_)));
    }

    fn row_lock_entries(store: &MemoryStore) -> usize {
        store.inner.row_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_row_locks_are_pruned_after_completion() {
        let (store, t) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        tx.template_lock(t.template_id).await.unwrap();
        tx.instance_insert(&CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1))
            .await
            .unwrap();
        assert_eq!(row_lock_entries(&store), 2);
        tx.commit().await.unwrap();
        assert_eq!(row_lock_entries(&store), 0);

        let card = store.instance_get_by_tag_uid("04AA").await.unwrap().unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.instance_lock(card.card_id).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(row_lock_entries(&store), 0);

        {
            let mut tx = store.begin().await.unwrap();
            tx.template_lock(t.template_id).await.unwrap();
        }
        assert_eq!(row_lock_entries(&store), 0);
    }

    #[tokio::test]
    async fn test_waited_on_lock_survives_holder_release() {
        let (store, t) = seeded().await;
        let mut holder = store.begin().await.unwrap();
        holder.template_lock(t.template_id).await.unwrap();

        let waiter_store = store.clone();
        let id = t.template_id;
        let waiter = tokio::spawn(async move {
            let mut tx = waiter_store.begin().await.unwrap();
            tx.template_lock(id).await.unwrap();
            tx.commit().await.unwrap();
        });
        while Arc::strong_count(&store.inner.row_mutex(RowKey::Template(id)).unwrap()) < 4 {
            tokio::task::yield_now().await;
        }

        holder.commit().await.unwrap();
        waiter.await.unwrap();
        assert_eq!(row_lock_entries(&store), 0);
    }

    #[tokio::test]
    async fn test_owner_listing_is_newest_first() {
        let (store, t) = seeded().await;
        let owner = PrincipalId::now_v7();
        let mut ids = Vec::new();
        for (serial, uid) in ["04AA", "04BB", "04CC"].iter().enumerate() {
            let serial = serial as i64 + 1;
            let card = CardInstance::mint(t.template_id, serial, *uid, format!("TAG-{}", serial), 1);
            let mut tx = store.begin().await.unwrap();
            tx.instance_insert(&card).await.unwrap();
            if serial != 2 {
                tx.instance_update(card.card_id, &InstanceUpdate::claim(owner))
                    .await
                    .unwrap();
            }
            tx.commit().await.unwrap();
            ids.push(card.card_id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed: Vec<CardId> = store
            .instances_for_owner(owner)
            .await
            .unwrap()
            .iter()
            .map(|c| c.card_id)
            .collect();
        assert_eq!(listed, vec![ids[2], ids[0]]);
        assert!(store.instances_for_owner(PrincipalId::now_v7()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_templates_list_oldest_first() {
        let (store, first) = seeded().await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = template().with_sku("SL-DIA");
        store.template_insert(&second).await.unwrap();

        let listed: Vec<TemplateId> = store
            .templates_list()
            .await
            .unwrap()
            .iter()
            .map(|t| t.template_id)
            .collect();
        assert_eq!(listed, vec![first.template_id, second.template_id]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_template_lock_serializes_increments() {
        let (store, t) = seeded().await;
        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = store.clone();
            let id = t.template_id;
            handles.push(tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                let current = tx.template_lock(id).await.unwrap().unwrap();
                tokio::task::yield_now().await;
                tx.template_set_minted_count(id, current.minted_count + 1)
                    .await
                    .unwrap();
                tx.commit().await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 64);
    }
}

//! Audit Log Writer

use chrono::Utc;
use titan_core::{CardInstance, EntityIdType, ScanEvent, ScanEventId, TitanResult, VerifiedScan};
use titan_storage::CardTx;

/// Build the audit record for `scan` against `card`.
pub fn record(card: &CardInstance, scan: &VerifiedScan) -> ScanEvent {
    ScanEvent {
        scan_id: ScanEventId::now_v7(),
        card_id: card.card_id,
        tag_external_id: scan.tag_external_id.clone(),
        tag_uid: scan.tag_uid.clone(),
        counter: scan.counter,
        authentic: true,
        tamper_current: scan.tamper_current.clone(),
        tamper_permanent: scan.tamper_permanent.clone(),
        client_ip: scan.client.ip.clone(),
        user_agent: scan.client.user_agent.clone(),
        provider: scan.provider,
        created_at: Utc::now(),
    }
}

/// Append one immutable scan record in the caller's transaction.
pub async fn append(tx: &mut dyn CardTx, card: &CardInstance, scan: &VerifiedScan) -> TitanResult<ScanEvent> {
    let event = record(card, scan);
    tx.scan_event_insert(&event).await?;
    Ok(event)
}

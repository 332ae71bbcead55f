//! Replay Guard
//!
//! A tag's counter only grows on genuine taps, so a counter at or below the
//! last accepted value is either replayed proof material or a cloned chip.

use titan_core::{CardInstance, MintError, TitanResult};
use titan_storage::{CardTx, InstanceUpdate};

/// Accept `observed` only if it is strictly above the recorded counter.
pub fn check(card: &CardInstance, observed: i64) -> Result<(), MintError> {
    if observed > card.last_ctr {
        Ok(())
    } else {
        Err(MintError::Replay {
            tag_uid: card.tag_uid.clone(),
            observed,
            last: card.last_ctr,
        })
    }
}

/// Check `observed` and record it as the new counter.
///
/// `card` must have been read with `instance_lock*` in `tx`, so no
/// concurrent scan can advance the counter between check and update. On
/// rejection nothing is written.
pub async fn advance(tx: &mut dyn CardTx, card: &CardInstance, observed: i64) -> TitanResult<CardInstance> {
    check(card, observed)?;
    tx.instance_update(card.card_id, &InstanceUpdate::counter(observed))
        .await
}

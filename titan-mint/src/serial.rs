//! Serial Allocator
//!
//! `minted_count` is the single source of serial numbers. Reserving locks the
//! template row for the rest of the enclosing transaction, so first sightings
//! of one template serialize here while other templates mint concurrently.
//! A rolled back transaction takes its reservation with it, so serials stay
//! contiguous.

use titan_core::{MintError, StorageError, TemplateId, TitanResult};
use titan_storage::CardTx;

/// Reserve the next serial of `template_id` inside `tx`.
///
/// # Errors
/// - `MintError::EditionCapReached` when the template is capped and full;
///   nothing is written
/// - `StorageError::NotFound` when the template does not exist
pub async fn reserve(tx: &mut dyn CardTx, template_id: TemplateId) -> TitanResult<i64> {
    let template = tx
        .template_lock(template_id)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            entity: "template",
            id: template_id.to_string(),
        })?;

    let serial = template.next_serial().ok_or(MintError::EditionCapReached {
        template_id,
        cap: template.edition_cap.unwrap_or(template.minted_count),
    })?;

    tx.template_set_minted_count(template_id, serial).await?;
    Ok(serial)
}

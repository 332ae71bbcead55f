//! Ownership State Machine
//!
//! Business logic for the `unassigned → claimed → shipped` lifecycle. Every
//! transition runs against a row locked for update, so the "owner is null"
//! check and the write cannot interleave with a concurrent claim.

use crate::finish;
use titan_core::{CardId, CardInstance, CardStatus, MintError, PrincipalId, TitanResult};
use titan_storage::{CardStore, CardTx, InstanceUpdate};

/// Claim an unowned card for `principal`.
///
/// # Arguments
/// - `store`: Storage the transition runs against
/// - `card_id`: The card being claimed
/// - `principal`: Authenticated principal supplied by the session layer
///
/// # Errors
/// - `MintError::CardNotFound` if the card does not exist
/// - `MintError::AlreadyClaimed` if the card has any owner, including
///   `principal` itself
/// - `MintError::InvalidTransition` if the status forbids claiming
pub async fn claim(store: &dyn CardStore, card_id: CardId, principal: PrincipalId) -> TitanResult<CardInstance> {
    let mut tx = store.begin().await?;
    let result = claim_in(tx.as_mut(), card_id, principal).await;
    finish(tx, result).await
}

async fn claim_in(tx: &mut dyn CardTx, card_id: CardId, principal: PrincipalId) -> TitanResult<CardInstance> {
    let card = tx
        .instance_lock(card_id)
        .await?
        .ok_or(MintError::CardNotFound { card_id })?;

    if card.is_owned() {
        return Err(MintError::AlreadyClaimed { card_id }.into());
    }
    ensure_transition(&card, CardStatus::Claimed)?;

    let claimed = tx
        .instance_update(card_id, &InstanceUpdate::claim(principal))
        .await?;
    tracing::info!(card_id = %card_id, principal = %principal, "card claimed");
    Ok(claimed)
}

/// Mark a claimed card as shipped. Called by fulfillment, never by scanning.
///
/// # Errors
/// - `MintError::CardNotFound` if the card does not exist
/// - `MintError::InvalidTransition` unless the card is currently `claimed`
pub async fn mark_shipped(store: &dyn CardStore, card_id: CardId) -> TitanResult<CardInstance> {
    let mut tx = store.begin().await?;
    let result = ship_in(tx.as_mut(), card_id).await;
    finish(tx, result).await
}

async fn ship_in(tx: &mut dyn CardTx, card_id: CardId) -> TitanResult<CardInstance> {
    let card = tx
        .instance_lock(card_id)
        .await?
        .ok_or(MintError::CardNotFound { card_id })?;
    ensure_transition(&card, CardStatus::Shipped)?;

    let shipped = tx
        .instance_update(card_id, &InstanceUpdate::status(CardStatus::Shipped))
        .await?;
    tracing::info!(card_id = %card_id, "card shipped");
    Ok(shipped)
}

fn ensure_transition(card: &CardInstance, to: CardStatus) -> Result<(), MintError> {
    if card.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(MintError::InvalidTransition {
            card_id: card.card_id,
            from: card.status,
            to,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use titan_core::{AthleteId, CardTemplate, CardVersion, EntityIdType, TitanError};
    use titan_storage::MemoryStore;

    async fn store_with_card() -> (MemoryStore, CardId) {
        let store = MemoryStore::new();
        let t = CardTemplate::new(AthleteId::now_v7(), CardVersion::Regular);
        store.template_insert(&t).await.unwrap();
        let card = CardInstance::mint(t.template_id, 1, "04AA", "TAG-A", 1);
        let mut tx = store.begin().await.unwrap();
        tx.instance_insert(&card).await.unwrap();
        tx.commit().await.unwrap();
        (store, card.card_id)
    }

    #[tokio::test]
    async fn test_claim_sets_owner_and_status() {
        let (store, card_id) = store_with_card().await;
        let p1 = PrincipalId::now_v7();
        let card = claim(&store, card_id, p1).await.unwrap();
        assert_eq!(card.owner_principal_id, Some(p1));
        assert_eq!(card.status, CardStatus::Claimed);
    }

    #[tokio::test]
    async fn test_second_claim_fails_even_for_owner() {
        let (store, card_id) = store_with_card().await;
        let p1 = PrincipalId::now_v7();
        claim(&store, card_id, p1).await.unwrap();

        for requester in [PrincipalId::now_v7(), p1] {
            let err = claim(&store, card_id, requester).await.unwrap_err();
            assert_eq!(err, MintError::AlreadyClaimed { card_id }.into());
        }
        let card = store.instance_get(card_id).await.unwrap().unwrap();
        assert_eq!(card.owner_principal_id, Some(p1));
    }

    #[tokio::test]
    async fn test_claim_unknown_card() {
        let store = MemoryStore::new();
        let card_id = CardId::now_v7();
        let err = claim(&store, card_id, PrincipalId::now_v7()).await.unwrap_err();
        assert_eq!(err, MintError::CardNotFound { card_id }.into());
    }

    #[tokio::test]
    async fn test_ship_requires_claimed() {
        let (store, card_id) = store_with_card().await;
        let err = mark_shipped(&store, card_id).await.unwrap_err();
        assert!(matches!(
            err,
            TitanError::Mint(MintError::InvalidTransition {
                from: CardStatus::Unassigned,
                to: CardStatus::Shipped,
                ..
            })
        ));

        let owner = PrincipalId::now_v7();
        claim(&store, card_id, owner).await.unwrap();
        let shipped = mark_shipped(&store, card_id).await.unwrap();
        assert_eq!(shipped.status, CardStatus::Shipped);
        assert_eq!(shipped.owner_principal_id, Some(owner));

        assert!(mark_shipped(&store, card_id).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_have_one_winner() {
        let (store, card_id) = store_with_card().await;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                claim(store.as_ref(), card_id, PrincipalId::now_v7()).await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => wins += 1,
                Err(TitanError::Mint(MintError::AlreadyClaimed { .. })) => conflicts += 1,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 15);
    }
}

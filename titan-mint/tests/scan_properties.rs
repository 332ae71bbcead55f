//! End-to-end properties of the scan pipeline over the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;
use titan_core::{CardStatus, MintError, ScanState, TitanError};
use titan_mint::{claim, ScanService};
use titan_oracle::OracleRegistry;
use titan_test_utils::{
    scan_request, seeded_store, CardStore, EntityIdType, MemoryStore, MockOracle, OracleProvider,
    PrincipalId, TemplateFixture,
};

fn service_over(store: &MemoryStore, oracle: &MockOracle) -> ScanService {
    let registry = OracleRegistry::new().with(Arc::new(oracle.clone()));
    ScanService::new(Arc::new(store.clone()), registry)
}

fn is_mint_error(result: &Result<titan_core::ScanOutcome, TitanError>, pred: impl Fn(&MintError) -> bool) -> bool {
    matches!(result, Err(TitanError::Mint(e)) if pred(e))
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_scenario_edition_cap_and_replay() {
    let t = TemplateFixture::regular().sku("T").cap(2).build();
    let store = seeded_store(&[t.clone()]).await.unwrap();
    let oracle = MockOracle::new(OracleProvider::Etrnl);
    let service = service_over(&store, &oracle);

    // New tag A, counter 1: minted with serial 1.
    oracle.set_tag("TAG-A", "04000000000A", 1);
    let a = service.scan(&scan_request("TAG-A", Some("T"))).await.unwrap();
    assert_eq!(a.state, ScanState::Unclaimed);
    assert!(a.minted);
    assert_eq!(a.serial_no, 1);
    assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 1);

    // Same counter again: replay, nothing changes.
    let replay = service.scan(&scan_request("TAG-A", Some("T"))).await;
    assert!(is_mint_error(&replay, |e| matches!(e, MintError::Replay { .. })));
    assert_eq!(store.instance_get(a.card_id).await.unwrap().unwrap().last_ctr, 1);
    assert_eq!(store.scan_events_for_card(a.card_id).await.unwrap().len(), 1);

    // Counter 2: accepted, not minted.
    oracle.set_tag("TAG-A", "04000000000A", 2);
    let again = service.scan(&scan_request("TAG-A", Some("T"))).await.unwrap();
    assert_eq!(again.state, ScanState::Unclaimed);
    assert!(!again.minted);
    assert_eq!(store.instance_get(a.card_id).await.unwrap().unwrap().last_ctr, 2);

    // New tag B: serial 2.
    oracle.set_tag("TAG-B", "04000000000B", 1);
    let b = service.scan(&scan_request("TAG-B", Some("T"))).await.unwrap();
    assert_eq!(b.serial_no, 2);
    assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 2);

    // New tag C: cap reached, count stays at 2.
    oracle.set_tag("TAG-C", "04000000000C", 1);
    let c = service.scan(&scan_request("TAG-C", Some("T"))).await;
    assert!(is_mint_error(&c, |e| matches!(e, MintError::EditionCapReached { cap: 2, .. })));
    assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 2);
    assert!(store.instance_get_by_tag_uid("04000000000C").await.unwrap().is_none());
}

#[tokio::test]
async fn test_scenario_claim_then_conflicting_claim() {
    let t = TemplateFixture::regular().sku("T").cap(2).build();
    let store = seeded_store(&[t]).await.unwrap();
    let oracle = MockOracle::new(OracleProvider::Etrnl);
    let service = service_over(&store, &oracle);

    oracle.set_tag("TAG-A", "04000000000A", 1);
    let a = service.scan(&scan_request("TAG-A", Some("T"))).await.unwrap();

    let p1 = PrincipalId::now_v7();
    let p2 = PrincipalId::now_v7();
    claim(&store, a.card_id, p1).await.unwrap();

    let err = claim(&store, a.card_id, p2).await.unwrap_err();
    assert_eq!(err, MintError::AlreadyClaimed { card_id: a.card_id }.into());

    let card = store.instance_get(a.card_id).await.unwrap().unwrap();
    assert_eq!(card.owner_principal_id, Some(p1));
    assert_eq!(card.status, CardStatus::Claimed);

    oracle.set_tag("TAG-A", "04000000000A", 2);
    let scanned = service.scan(&scan_request("TAG-A", None)).await.unwrap();
    assert_eq!(scanned.state, ScanState::OwnedByOther);
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_sightings_get_contiguous_serials() {
    let t = TemplateFixture::diamond().sku("D").build();
    let other = TemplateFixture::regular().sku("R").build();
    let store = seeded_store(&[t.clone(), other.clone()]).await.unwrap();
    let oracle = MockOracle::new(OracleProvider::Etrnl);
    let service = Arc::new(service_over(&store, &oracle));

    let n = 48;
    for i in 0..n {
        oracle.set_tag(format!("TAG-{}", i), format!("04{:012X}", i), 1);
    }

    let mut handles = Vec::new();
    for i in 0..n {
        let service = Arc::clone(&service);
        let hint = if i % 4 == 0 { "R" } else { "D" };
        handles.push(tokio::spawn(async move {
            service.scan(&scan_request(&format!("TAG-{}", i), Some(hint))).await
        }));
    }
    for h in handles {
        assert!(h.await.unwrap().unwrap().minted);
    }

    for template in [&t, &other] {
        let cards = store.instances_for_template(template.template_id).await.unwrap();
        let serials: Vec<i64> = cards.iter().map(|c| c.serial_no).collect();
        let expected: Vec<i64> = (1..=cards.len() as i64).collect();
        assert_eq!(serials, expected);
        assert_eq!(
            store.template_get(template.template_id).await.unwrap().unwrap().minted_count,
            cards.len() as i64
        );
    }
    assert_eq!(store.instance_count(), n);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_sightings_respect_cap() {
    let t = TemplateFixture::regular().sku("CAP").cap(10).build();
    let store = seeded_store(&[t.clone()]).await.unwrap();
    let oracle = MockOracle::new(OracleProvider::Etrnl);
    let service = Arc::new(service_over(&store, &oracle));

    for i in 0..40 {
        oracle.set_tag(format!("TAG-{}", i), format!("04{:012X}", i), 1);
    }
    let mut handles = Vec::new();
    for i in 0..40 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.scan(&scan_request(&format!("TAG-{}", i), Some("CAP"))).await
        }));
    }

    let mut minted = 0;
    let mut capped = 0;
    for h in handles {
        let result = h.await.unwrap();
        if result.is_ok() {
            minted += 1;
        } else if is_mint_error(&result, |e| matches!(e, MintError::EditionCapReached { .. })) {
            capped += 1;
        } else {
            panic!("unexpected result {:?}", result);
        }
    }
    assert_eq!(minted, 10);
    assert_eq!(capped, 30);

    let serials: BTreeSet<i64> = store
        .instances_for_template(t.template_id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.serial_no)
        .collect();
    assert_eq!(serials, (1..=10).collect::<BTreeSet<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_scans_of_one_new_tag_bind_once() {
    let t = TemplateFixture::regular().sku("T").build();
    let store = seeded_store(&[t.clone()]).await.unwrap();
    let oracle = MockOracle::new(OracleProvider::Etrnl);
    oracle.set_tag("TAG-A", "04000000000A", 1);
    let service = Arc::new(service_over(&store, &oracle));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.scan(&scan_request("TAG-A", Some("T"))).await
        }));
    }

    let mut minted = 0;
    let mut replays = 0;
    for h in handles {
        let result = h.await.unwrap();
        match &result {
            Ok(outcome) if outcome.minted => minted += 1,
            _ if is_mint_error(&result, |e| matches!(e, MintError::Replay { .. })) => replays += 1,
            other => panic!("unexpected result {:?}", other),
        }
    }
    assert_eq!(minted, 1);
    assert_eq!(replays, 31);
    assert_eq!(store.instance_count(), 1);
    assert_eq!(store.scan_event_count(), 1);
    // Losers rolled their serial reservation back.
    assert_eq!(store.template_get(t.template_id).await.unwrap().unwrap().minted_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_repeat_scans_advance_counter_once() {
    let t = TemplateFixture::regular().sku("T").build();
    let store = seeded_store(&[t]).await.unwrap();
    let oracle = MockOracle::new(OracleProvider::Etrnl);
    oracle.set_tag("TAG-A", "04000000000A", 1);
    let service = Arc::new(service_over(&store, &oracle));
    let first = service.scan(&scan_request("TAG-A", Some("T"))).await.unwrap();

    oracle.set_tag("TAG-A", "04000000000A", 2);
    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.scan(&scan_request("TAG-A", None)).await
        }));
    }
    let accepted = count_accepted(handles).await;
    assert_eq!(accepted, 1);
    assert_eq!(store.instance_get(first.card_id).await.unwrap().unwrap().last_ctr, 2);
    assert_eq!(store.scan_events_for_card(first.card_id).await.unwrap().len(), 2);
}

async fn count_accepted(
    handles: Vec<tokio::task::JoinHandle<Result<titan_core::ScanOutcome, TitanError>>>,
) -> usize {
    let mut ok = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    ok
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use titan_test_utils::generators::arb_counters;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Over any sequence of observed counters, `last_ctr` only grows and
        /// exactly the strictly increasing scans are accepted and audited.
        #[test]
        fn prop_counter_history_is_monotonic(counters in arb_counters(24)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let t = TemplateFixture::regular().sku("T").build();
                let store = seeded_store(&[t]).await.unwrap();
                let oracle = MockOracle::new(OracleProvider::Etrnl);
                let service = service_over(&store, &oracle);

                let mut expected_last: Option<i64> = None;
                let mut accepted = 0usize;
                for ctr in counters {
                    oracle.set_tag("TAG-A", "04000000000A", ctr);
                    let result = service.scan(&scan_request("TAG-A", Some("T"))).await;
                    let should_accept = expected_last.map_or(true, |last| ctr > last);
                    prop_assert_eq!(result.is_ok(), should_accept);
                    if should_accept {
                        expected_last = Some(ctr);
                        accepted += 1;
                    }
                    let card = store.instance_get_by_tag_uid("04000000000A").await.unwrap();
                    prop_assert_eq!(card.map(|c| c.last_ctr), expected_last);
                }
                prop_assert_eq!(store.scan_event_count(), accepted);
                prop_assert_eq!(store.instance_count(), 1);
                Ok(())
            })?;
        }
    }
}

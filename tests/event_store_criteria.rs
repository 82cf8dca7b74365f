//! Integration tests for criteria queries against the in-memory event store.
//!
//! Fixture: five events E0..E4 where En belongs to aggregate `n`, has type
//! `event-type-n`, version `n + 1` and is created `n` milliseconds after E0.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use assetflow::adapters::InMemoryEventStore;
use assetflow::domain::foundation::{
    AggregateId, Criteria, Event, PayloadRegistry, PayloadType, Timestamp,
};
use assetflow::ports::EventStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

macro_rules! probe_payloads {
    ($($name:ident => $tag:literal),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Serialize, Deserialize)]
            struct $name {
                n: u64,
            }

            impl PayloadType for $name {
                const EVENT_TYPE: &'static str = $tag;
            }
        )*
    };
}

probe_payloads! {
    Probe0 => "event-type-0",
    Probe1 => "event-type-1",
    Probe2 => "event-type-2",
    Probe3 => "event-type-3",
    Probe4 => "event-type-4",
}

fn registry() -> PayloadRegistry {
    PayloadRegistry::new()
        .with::<Probe0>()
        .and_then(|r| r.with::<Probe1>())
        .and_then(|r| r.with::<Probe2>())
        .and_then(|r| r.with::<Probe3>())
        .and_then(|r| r.with::<Probe4>())
        .unwrap()
}

fn aggregate(n: u64) -> AggregateId {
    AggregateId::from_uuid(Uuid::from_u128(u128::from(n)))
}

fn probe(n: u64, base: Timestamp) -> Event {
    let id = aggregate(n);
    let version = n + 1;
    let event = match n {
        0 => Event::new(id, "probe", version, Probe0 { n }),
        1 => Event::new(id, "probe", version, Probe1 { n }),
        2 => Event::new(id, "probe", version, Probe2 { n }),
        3 => Event::new(id, "probe", version, Probe3 { n }),
        _ => Event::new(id, "probe", version, Probe4 { n }),
    };
    event.with_timestamp(base.plus_millis(n as i64))
}

async fn seeded_store() -> InMemoryEventStore {
    let store = InMemoryEventStore::new(Arc::new(registry()));
    let base = Timestamp::now().truncated_to_micros();
    // Saved out of order so results must be sorted by the store.
    let events: Vec<Event> = [3, 0, 4, 1, 2].into_iter().map(|n| probe(n, base)).collect();
    store.save(&events).await.unwrap();
    store
}

async fn query(store: &InMemoryEventStore, criteria: Criteria) -> Vec<u64> {
    store
        .get(&criteria)
        .await
        .unwrap()
        .iter()
        .map(|e| e.aggregate_version - 1)
        .collect()
}

// =============================================================================
// Laws
// =============================================================================

#[tokio::test]
async fn and_requires_every_child() {
    let store = seeded_store().await;

    let found = query(
        &store,
        Criteria::and([
            Criteria::aggregate_id(aggregate(1)),
            Criteria::event_type("event-type-1"),
        ]),
    )
    .await;

    assert_eq!(found, vec![1]);
}

#[tokio::test]
async fn and_with_disjoint_children_is_empty() {
    let store = seeded_store().await;

    let found = query(
        &store,
        Criteria::and([
            Criteria::aggregate_id(aggregate(1)),
            Criteria::event_type("event-type-2"),
        ]),
    )
    .await;

    assert!(found.is_empty());
}

#[tokio::test]
async fn or_accepts_any_child() {
    let store = seeded_store().await;

    let found = query(
        &store,
        Criteria::or([
            Criteria::aggregate_id(aggregate(1)),
            Criteria::event_type("event-type-2"),
        ]),
    )
    .await;

    assert_eq!(found, vec![1, 2]);
}

#[tokio::test]
async fn nested_not_excludes_its_matches() {
    let store = seeded_store().await;

    let found = query(
        &store,
        Criteria::and([
            Criteria::or([
                Criteria::aggregate_id(aggregate(4)),
                Criteria::event_type("event-type-4"),
            ]),
            Criteria::not([Criteria::aggregate_id(aggregate(4))]),
        ]),
    )
    .await;

    assert!(found.is_empty());
}

#[tokio::test]
async fn not_with_several_children_is_nor() {
    let store = seeded_store().await;

    let found = query(
        &store,
        Criteria::not([
            Criteria::aggregate_id(aggregate(0)),
            Criteria::aggregate_version(3),
        ]),
    )
    .await;

    assert_eq!(found, vec![1, 3, 4]);
}

#[tokio::test]
async fn not_is_the_complement_of_or() {
    let store = seeded_store().await;
    let children = || {
        [
            Criteria::event_type("event-type-0"),
            Criteria::aggregate_version(5),
        ]
    };

    let mut union = query(&store, Criteria::or(children())).await;
    union.extend(query(&store, Criteria::not(children())).await);
    union.sort_unstable();

    assert_eq!(union, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn empty_composites_have_fixed_meanings() {
    let store = seeded_store().await;

    assert_eq!(query(&store, Criteria::and([])).await, vec![0, 1, 2, 3, 4]);
    assert!(query(&store, Criteria::or([])).await.is_empty());
    assert_eq!(query(&store, Criteria::not([])).await, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn cross_aggregate_results_are_ordered_by_timestamp() {
    let store = seeded_store().await;

    let found = query(&store, Criteria::aggregate_type("probe")).await;

    assert_eq!(found, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn unknown_values_match_nothing() {
    let store = seeded_store().await;

    assert!(query(&store, Criteria::aggregate_type("asset")).await.is_empty());
    assert!(query(&store, Criteria::aggregate_id(aggregate(99))).await.is_empty());
    assert!(!store.exists_by_aggregate_id(aggregate(99)).await.unwrap());
    assert!(store.exists_by_aggregate_id(aggregate(2)).await.unwrap());
}

#[tokio::test]
async fn decoded_events_keep_their_payload() {
    let store = seeded_store().await;

    let events = store
        .get(&Criteria::aggregate_id(aggregate(3)))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "event-type-3");
    assert_eq!(events[0].payload_as::<Probe3>().map(|p| p.n), Some(3));
}

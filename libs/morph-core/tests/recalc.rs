//! Recalc pass tests against an in-memory collection.

mod common;

use chrono::Utc;
use pretty_assertions::assert_eq;

use common::fixtures::{self, db_of, item};
use common::MemoryStore;
use morph_core::{
    recalc, FrequencyList, MorphConfig, MorphDb, MorphError, MorphemizerRegistry, PassControl,
    RecalcInputs, RecalcOutcome,
};

fn collection() -> MemoryStore {
    MemoryStore::new(vec![
        item(1, "I have a cat.", 30.0),
        item(2, "A cat!", 30.0),
        item(3, "I have a dog.", 0.0),
        item(4, "Dog, bird, fish, tree.", 0.0),
    ])
}

fn run(store: &mut MemoryStore, external: &MorphDb, previous: Option<&MorphDb>) -> RecalcOutcome {
    run_with(store, external, &MorphDb::new(), &FrequencyList::default(), previous)
}

fn run_with(
    store: &mut MemoryStore,
    external: &MorphDb,
    priority: &MorphDb,
    frequency: &FrequencyList,
    previous: Option<&MorphDb>,
) -> RecalcOutcome {
    recalc(
        store,
        RecalcInputs {
            previous_all: previous,
            external,
            priority,
            frequency,
        },
        &MorphConfig::with_default_filters(),
        &MorphemizerRegistry::with_defaults(),
        &PassControl::default(),
        Utc::now(),
    )
    .unwrap()
}

/// Items introducing fewer unknowns get a lower index.
#[test]
fn test_recalc_orders_by_new_vocabulary() {
    let mut store = collection();
    let outcome = run(&mut store, &MorphDb::new(), None);

    assert_eq!(outcome.indices.len(), 4);
    assert!(store.index(3).unwrap() < store.index(4).unwrap());
    assert!(store.item(1).has_tag("mm_comprehension"));
    assert!(store.item(3).has_tag("mm_vocab"));
    assert!(store.item(4).has_tag("mm_notReady"));
}

/// Derived fields are written into the item's own fields.
#[test]
fn test_recalc_writes_fields() {
    let mut store = collection();
    run(&mut store, &MorphDb::new(), None);

    assert_eq!(store.field(3, "Morph_FocusMorph").as_deref(), Some("dog"));
    assert_eq!(store.field(3, "Morph_UnknownCount").as_deref(), Some("1"));
    assert_eq!(store.field(3, "Morph_Unknowns").as_deref(), Some("dog"));
    assert_eq!(
        store.field(4, "Morph_Unknowns").as_deref(),
        Some("bird, dog, fish, tree")
    );
    assert_eq!(store.field(4, "Morph_UnknownCount").as_deref(), Some("4"));
    assert_eq!(store.field(1, "Morph_UnknownCount").as_deref(), Some("0"));
    assert_eq!(store.item(3).field("Expression"), Some("I have a dog."));
}

/// The known view returned is derived from item maturities.
#[test]
fn test_recalc_returns_known_view() {
    let mut store = collection();
    let outcome = run(&mut store, &MorphDb::new(), None);

    assert!(outcome.known.matches(&fixtures::word("cat")));
    assert!(!outcome.known.matches(&fixtures::word("dog")));
    assert_eq!(outcome.all.location_count(), 4);
}

/// A second pass over unchanged items reuses every location.
#[test]
fn test_recalc_reuses_previous_locations() {
    let mut store = collection();
    let first = run(&mut store, &MorphDb::new(), None);
    let second = run(&mut store, &MorphDb::new(), Some(&first.all));

    assert_eq!(second.stats.reused, 4);
    assert_eq!(second.stats.tokenized, 0);
    assert_eq!(first.indices, second.indices);
}

/// Words known from the external database count as known.
#[test]
fn test_recalc_merges_external_db() {
    let mut store = collection();
    let external = db_of(&[("dog", 30.0)]);
    run(&mut store, &external, None);

    assert!(store.item(3).has_tag("mm_comprehension"));
    assert_eq!(store.field(4, "Morph_UnknownCount").as_deref(), Some("3"));
}

/// Priority and frequency lists pick the focus morpheme and tag the item.
#[test]
fn test_recalc_uses_priority_and_frequency() {
    let mut store = collection();
    let priority = db_of(&[("fish", 0.0)]);
    let frequency = FrequencyList::from_words(["tree", "bird"]);
    run_with(&mut store, &MorphDb::new(), &priority, &frequency, None);

    assert_eq!(store.field(4, "Morph_FocusMorph").as_deref(), Some("tree"));
    assert!(store.item(4).has_tag("mm_priority"));
    assert!(store.item(4).has_tag("mm_frequency"));
    assert!(!store.item(3).has_tag("mm_priority"));
}

/// A failing write skips that item only.
#[test]
fn test_recalc_survives_write_failure() {
    let mut store = collection();
    store.failing.push(3);
    let outcome = run(&mut store, &MorphDb::new(), None);

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.indices.len(), 3);
    assert_eq!(store.index(3), None);
    assert!(store.index(4).is_some());
}

/// Items whose filter does not modify are indexed but left untouched.
#[test]
fn test_recalc_respects_read_only_filters() {
    let mut store = collection();
    let mut config = MorphConfig::with_default_filters();
    config.filters[0].modify = false;

    let outcome = recalc(
        &mut store,
        RecalcInputs {
            previous_all: None,
            external: &MorphDb::new(),
            priority: &MorphDb::new(),
            frequency: &FrequencyList::default(),
        },
        &config,
        &MorphemizerRegistry::with_defaults(),
        &PassControl::default(),
        Utc::now(),
    )
    .unwrap();

    assert!(outcome.indices.is_empty());
    assert!(store.updates.is_empty());
    assert!(outcome.known.matches(&fixtures::word("cat")));
}

/// No eligible item aborts the whole pass.
#[test]
fn test_recalc_without_eligible_items() {
    let mut store = collection();
    let mut config = MorphConfig::with_default_filters();
    config.filters[0].tags = vec!["japanese".to_string()];

    let result = recalc(
        &mut store,
        RecalcInputs {
            previous_all: None,
            external: &MorphDb::new(),
            priority: &MorphDb::new(),
            frequency: &FrequencyList::default(),
        },
        &config,
        &MorphemizerRegistry::with_defaults(),
        &PassControl::default(),
        Utc::now(),
    );

    assert!(matches!(result, Err(MorphError::NoEligibleItems)));
    assert!(store.updates.is_empty());
}

/// A cancelled pass writes nothing.
#[test]
fn test_recalc_cancelled() {
    let mut store = collection();
    let control = PassControl::default();
    control.cancel.cancel();

    let result = recalc(
        &mut store,
        RecalcInputs {
            previous_all: None,
            external: &MorphDb::new(),
            priority: &MorphDb::new(),
            frequency: &FrequencyList::default(),
        },
        &MorphConfig::with_default_filters(),
        &MorphemizerRegistry::with_defaults(),
        &control,
        Utc::now(),
    );

    assert!(matches!(result, Err(MorphError::Cancelled)));
    assert!(store.updates.is_empty());
}

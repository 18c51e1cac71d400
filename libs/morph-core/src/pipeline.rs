//! Batch passes over the host collection.
//!
//! `build_all_db` turns every eligible item into locations; `recalc` builds,
//! derives the familiarity views and writes the ranking back through an
//! [`ItemStore`].

use crate::config::{ItemFilter, MorphConfig};
use crate::db::MorphDb;
use crate::error::{MorphError, Result};
use crate::frequency::FrequencyList;
use crate::morphemizer::{extract_morphemes, is_skipped, Morphemizer, MorphemizerRegistry};
use crate::progress::{PassControl, ProgressEvent, BATCH_SIZE};
use crate::scoring::{ScoringEngine, ScoringViews};
use crate::types::{ItemRecord, ItemUpdate, Location, LocationKey, Morpheme};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Narrow interface to the host collection.
pub trait ItemStore {
    /// Snapshot of every item.
    fn items(&self) -> Result<Vec<ItemRecord>>;

    /// Persist one item's derived fields and tags.
    fn apply(&mut self, update: ItemUpdate) -> Result<()>;
}

/// What happened to the locations during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub eligible_items: usize,
    /// Unchanged text and maturities.
    pub reused: usize,
    /// Unchanged text, new maturities.
    pub moved: usize,
    pub tokenized: usize,
    /// Items with no matching filter.
    pub skipped_items: usize,
}

/// Build the database of every eligible item.
///
/// Locations of `previous` are reused by key. When only the maturities changed
/// the morphemes move to a fresh location without re-tokenizing. Items absent
/// from `items` leave nothing behind.
pub fn build_all_db(
    items: &[ItemRecord],
    previous: Option<&MorphDb>,
    config: &MorphConfig,
    registry: &MorphemizerRegistry,
    control: &PassControl,
) -> Result<(MorphDb, BuildStats)> {
    let started = Instant::now();
    let mut db = MorphDb::new();
    let mut stats = BuildStats::default();
    let mut morphemizers: HashMap<String, Option<Arc<dyn Morphemizer>>> = HashMap::new();
    let total = items.len();

    for (n, item) in items.iter().enumerate() {
        if n % BATCH_SIZE == 0 {
            control.checkpoint(ProgressEvent::ScanningItems { n, total })?;
        }
        let Some(filter) = config.filter_for(item) else {
            stats.skipped_items += 1;
            continue;
        };
        stats.eligible_items += 1;

        let morphemizer = morphemizers
            .entry(filter.morphemizer.clone())
            .or_insert_with(|| match registry.require(&filter.morphemizer) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(error = %e, "Items using this filter are skipped");
                    None
                }
            });
        let Some(morphemizer) = morphemizer.as_deref() else {
            continue;
        };

        let maturities = if config.thresholds.ignore_maturity {
            vec![0.0; item.maturities.len()]
        } else {
            item.maturities.clone()
        };
        let always_known = item.has_tag(&config.tags.already_known);
        let skipped = is_skipped(&item.tags, &config.text);

        for field in &filter.fields {
            let Some(value) = item.field(field) else {
                continue;
            };
            let key = LocationKey {
                item_id: item.id,
                guid: item.guid.clone(),
                field: field.clone(),
            };
            let mut location = Location::new(key, value.to_string(), maturities.clone());
            location.always_known = always_known;
            location.tokenizer = filter.morphemizer.clone();
            location.skipped = skipped;

            let old = previous
                .and_then(|p| Some((p.location(&location.key)?, p.morphemes_at(&location.key)?)));
            match old {
                Some((old_loc, morphemes)) if old_loc.same_payload(&location) => {
                    db.add_location(Arc::clone(old_loc), morphemes.iter().cloned());
                    stats.reused += 1;
                }
                Some((old_loc, morphemes)) if old_loc.same_source(&location) => {
                    db.add_location(Arc::new(location), morphemes.iter().cloned());
                    stats.moved += 1;
                }
                _ => {
                    let morphemes =
                        extract_morphemes(morphemizer, value, &item.tags, &config.text);
                    db.add_location(Arc::new(location), morphemes);
                    stats.tokenized += 1;
                }
            }
        }
    }

    if stats.eligible_items == 0 {
        return Err(MorphError::NoEligibleItems);
    }
    control.checkpoint(ProgressEvent::ScanningItems { n: total, total })?;

    info!(
        items = total,
        eligible = stats.eligible_items,
        reused = stats.reused,
        moved = stats.moved,
        tokenized = stats.tokenized,
        morphemes = db.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Built all db"
    );
    Ok((db, stats))
}

/// Side databases a recalc pass reads.
#[derive(Clone, Copy)]
pub struct RecalcInputs<'a> {
    /// Result of the previous build, for location reuse.
    pub previous_all: Option<&'a MorphDb>,
    /// Externally maintained database merged before the views are derived.
    pub external: &'a MorphDb,
    pub priority: &'a MorphDb,
    pub frequency: &'a FrequencyList,
}

#[derive(Debug, Clone)]
pub struct RecalcOutcome {
    /// Built from the items alone, for the next pass to reuse.
    pub all: MorphDb,
    pub seen: MorphDb,
    pub known: MorphDb,
    pub mature: MorphDb,
    pub stats: BuildStats,
    /// `(item id, new index)` for every item written back.
    pub indices: Vec<(i64, i64)>,
    /// Items skipped by the lite-update rule.
    pub unchanged: usize,
    pub failed: usize,
}

/// Rebuild the database, rank every modifiable item and write it back.
pub fn recalc<S: ItemStore + ?Sized>(
    store: &mut S,
    inputs: RecalcInputs<'_>,
    config: &MorphConfig,
    registry: &MorphemizerRegistry,
    control: &PassControl,
    now: DateTime<Utc>,
) -> Result<RecalcOutcome> {
    let started = Instant::now();
    let items = store.items()?;
    let (all, stats) = build_all_db(&items, inputs.previous_all, config, registry, control)?;

    let mut merged = all.clone();
    merged.merge(inputs.external);
    let seen = merged.filter_by_maturity(config.thresholds.seen);
    let known = merged.filter_by_maturity(config.thresholds.known);
    let mature = merged.filter_by_maturity(config.thresholds.mature);
    debug!(
        all = merged.len(),
        seen = seen.len(),
        known = known.len(),
        mature = mature.len(),
        "Derived familiarity views"
    );

    let engine = ScoringEngine::new(
        config,
        ScoringViews {
            all: &merged,
            seen: &seen,
            known: &known,
            mature: &mature,
            priority: inputs.priority,
            frequency: inputs.frequency,
        },
    );

    let mut indices = Vec::new();
    let mut unchanged = 0;
    let mut failed = 0;
    let total = items.len();

    for (n, item) in items.iter().enumerate() {
        if n % BATCH_SIZE == 0 {
            control.checkpoint(ProgressEvent::ScoringItems { n, total })?;
        }
        let Some(filter) = config.filter_for(item).filter(|f| f.modify) else {
            continue;
        };
        let morphemes = item_morphemes(&all, item, filter);
        let Some(update) = engine.process(item, &morphemes, now) else {
            unchanged += 1;
            continue;
        };
        let index = update.index;
        match store.apply(update) {
            Ok(()) => indices.push((item.id, index)),
            Err(e) => {
                warn!(item = item.id, error = %e, "Failed to write item, skipping");
                failed += 1;
            }
        }
    }
    control.checkpoint(ProgressEvent::ScoringItems { n: total, total })?;

    info!(
        updated = indices.len(),
        unchanged,
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Recalc finished"
    );
    Ok(RecalcOutcome {
        all,
        seen,
        known,
        mature,
        stats,
        indices,
        unchanged,
        failed,
    })
}

/// Morphemes recorded for an item's filter fields, sorted and deduplicated.
fn item_morphemes(db: &MorphDb, item: &ItemRecord, filter: &ItemFilter) -> Vec<Morpheme> {
    let mut out: Vec<Morpheme> = filter
        .fields
        .iter()
        .filter_map(|field| {
            db.morphemes_at(&LocationKey {
                item_id: item.id,
                guid: item.guid.clone(),
                field: field.clone(),
            })
        })
        .flatten()
        .cloned()
        .collect();
    out.sort();
    out.dedup();
    out
}

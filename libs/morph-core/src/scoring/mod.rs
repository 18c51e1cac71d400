//! Per-item ranking: classify morphemes, pick a focus morpheme, compute the
//! ranking index and derive the item's write-back.
//!
//! Each item goes through EXTRACT -> CLASSIFY -> SCORE -> TAG-AND-WRITE once.
//! The familiarity views are fixed for the whole pass, so items never affect
//! each other's results.

pub mod penalty;

use crate::config::MorphConfig;
use crate::db::MorphDb;
use crate::frequency::FrequencyList;
use crate::types::{ItemRecord, ItemUpdate, Morpheme};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

pub use penalty::{clamp_index, tag_penalty, TagPenaltyBreakdown, Urgency};

/// Databases every item is scored against. Snapshots for a whole pass.
#[derive(Clone, Copy)]
pub struct ScoringViews<'a> {
    pub all: &'a MorphDb,
    pub seen: &'a MorphDb,
    pub known: &'a MorphDb,
    pub mature: &'a MorphDb,
    pub priority: &'a MorphDb,
    pub frequency: &'a FrequencyList,
}

/// Morphemes of one item split by familiarity. Each list keeps input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub unseen: Vec<Morpheme>,
    pub unknown: Vec<Morpheme>,
    pub unmature: Vec<Morpheme>,
    /// Known but not yet mature.
    pub new_known: Vec<Morpheme>,
}

/// Rounded-up counts of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MorphCounts {
    /// Single-word morphemes.
    pub n: i64,
    pub unseen: i64,
    /// Unknown single-word morphemes.
    pub unknown: i64,
    /// Weighted unknown multi-word units.
    pub unknown_pairs: i64,
    pub unmature: i64,
}

/// Everything the scorer derived for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemScore {
    pub classification: Classification,
    pub counts: MorphCounts,
    pub focus: Option<Morpheme>,
    pub is_priority: bool,
    pub is_frequency: bool,
    pub unknown_freq_avg: i64,
    pub usefulness: f64,
    /// Negative when too short, positive when too long.
    pub len_diff_raw: i64,
    pub tag_penalty: TagPenaltyBreakdown,
    /// Unclamped, rounded index.
    pub raw_index: i64,
    /// Index after compression, as written to the host's ordering field.
    pub index: i64,
}

pub struct ScoringEngine<'a> {
    config: &'a MorphConfig,
    views: ScoringViews<'a>,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(config: &'a MorphConfig, views: ScoringViews<'a>) -> Self {
        Self { config, views }
    }

    /// Sort unknown, unseen and unmature morphemes out of `morphemes`.
    ///
    /// Duplicates are dropped; proper nouns are skipped when configured as known.
    pub fn classify(&self, morphemes: &[Morpheme]) -> Classification {
        let proper_nouns_known = self.config.scoring.proper_nouns_known;
        let mut seen_once = HashSet::new();
        let mut out = Classification::default();

        for m in morphemes {
            if !seen_once.insert(m) {
                continue;
            }
            if proper_nouns_known && m.is_proper_noun() {
                continue;
            }
            let known = self.views.known.matches(m);
            if !self.views.seen.matches(m) {
                out.unseen.push(m.clone());
            }
            if !known {
                out.unknown.push(m.clone());
            }
            if !self.views.mature.matches(m) {
                out.unmature.push(m.clone());
                if known {
                    out.new_known.push(m.clone());
                }
            }
        }
        out
    }

    /// Weight of one morpheme in the counts: 1 for a word, less for each extra
    /// word of a multi-word unit.
    pub fn combo_equiv(&self, morpheme: &Morpheme) -> f64 {
        if morpheme.is_multi_word() {
            self.config.scoring.combo_weight * (morpheme.word_count() - 1) as f64
        } else {
            1.0
        }
    }

    pub fn counts(&self, morphemes: &[Morpheme], class: &Classification) -> MorphCounts {
        let unique: HashSet<&Morpheme> = morphemes.iter().collect();
        let weighted = |list: &[Morpheme]| -> i64 {
            list.iter().map(|m| self.combo_equiv(m)).sum::<f64>().ceil() as i64
        };
        let unknown_pairs: f64 = class
            .unknown
            .iter()
            .filter(|m| m.is_multi_word())
            .map(|m| self.combo_equiv(m))
            .sum();

        MorphCounts {
            n: unique.iter().filter(|m| !m.is_multi_word()).count() as i64,
            unseen: weighted(&class.unseen),
            unknown: class.unknown.iter().filter(|m| !m.is_multi_word()).count() as i64,
            unknown_pairs: unknown_pairs.ceil() as i64,
            unmature: weighted(&class.unmature),
        }
    }

    fn priority_usefulness(&self, morpheme: &Morpheme) -> Option<f64> {
        self.views
            .priority
            .contains(morpheme)
            .then_some(self.config.scoring.priority_weight)
    }

    fn frequency_usefulness(&self, morpheme: &Morpheme) -> Option<f64> {
        self.views
            .frequency
            .rank_bonus(&morpheme.base, self.config.scoring.frequency_bonus)
            .map(|b| b as f64)
    }

    /// Score one item's (already extracted) morphemes.
    pub fn score(&self, item: &ItemRecord, morphemes: &[Morpheme]) -> ItemScore {
        let scoring = &self.config.scoring;
        let class = self.classify(morphemes);
        let counts = self.counts(morphemes, &class);

        let mut is_priority = false;
        let mut is_frequency = false;

        let mut best_unknown: Option<(&Morpheme, f64)> = None;
        for m in &class.unknown {
            let priority = self.priority_usefulness(m);
            let frequency = self.frequency_usefulness(m);
            is_priority |= priority.is_some();
            is_frequency |= frequency.is_some();
            if m.is_multi_word() || (priority.is_none() && frequency.is_none()) {
                continue;
            }
            let u = priority.unwrap_or(0.0) + frequency.unwrap_or(0.0);
            if best_unknown.map_or(true, |(_, best)| u > best) {
                best_unknown = Some((m, u));
            }
        }

        let mut best_unmature: Option<(&Morpheme, f64)> = None;
        for m in &class.unmature {
            let Some(u) = self.frequency_usefulness(m) else {
                continue;
            };
            is_frequency = true;
            if m.is_multi_word() {
                continue;
            }
            if best_unmature.map_or(true, |(_, best)| u > best) {
                best_unmature = Some((m, u));
            }
        }

        let (focus, mut usefulness) = match (best_unknown, best_unmature) {
            (Some((k, uk)), Some((_, um))) if um > uk => (Some(k), (uk + um) / 2.0),
            (Some((k, uk)), _) => (Some(k), uk),
            (None, Some((m, um))) => (Some(m), um),
            (None, None) => (fallback_focus(&class), 0.0),
        };

        let f_k: usize = class.unknown.iter().map(|m| self.views.all.frequency(m)).sum();
        let divisor = counts.unknown + counts.unknown_pairs;
        let unknown_freq_avg = if divisor > 0 {
            f_k as i64 / divisor
        } else {
            f_k as i64
        };
        usefulness += unknown_freq_avg as f64;

        for m in &class.new_known {
            if let Some(maturity) = self.views.known.matching_maturity(m) {
                usefulness += scoring.reinforce_weight / maturity.max(1.0);
            }
        }

        let mut uselessness =
            scoring.usefulness_base - usefulness.min(scoring.usefulness_cap);
        if !(is_priority || is_frequency) {
            uselessness += scoring.no_priority_penalty;
        }

        let tag_penalty = tag_penalty(&item.tags, &item.category, scoring);
        let language = tag_penalty.language_multiplier;

        let (min_len, max_len, base_len_penalty, unknown_multiplier) =
            scoring.length_profile(&item.category);
        let lendiff_penalty = base_len_penalty * language;
        let n = counts.n;
        let len_diff_raw = (n - min_len).min((n - max_len).max(0));
        let len_diff = len_diff_raw.abs().min(50);
        let len_penalty = lendiff_penalty / 20.0;
        let standard = lendiff_penalty * len_diff as f64 + len_penalty * n as f64 + uselessness;

        let unknown_value = (scoring.unknown_value_base
            + scoring.unknown_value_language_factor * language)
            * unknown_multiplier;
        let raw = (unknown_value * (counts.unknown + counts.unknown_pairs) as f64
            + standard
            + tag_penalty.total)
            .round();
        let index = clamp_index(raw, scoring.clamp_ceiling, scoring.clamp_cap).round() as i64;

        debug!(
            item = item.id,
            n,
            unknown = counts.unknown,
            unknown_pairs = counts.unknown_pairs,
            unmature = counts.unmature,
            focus = focus.map(|m| m.base.as_str()),
            raw_index = raw,
            index,
            "Scored item"
        );

        ItemScore {
            focus: focus.cloned(),
            classification: class.clone(),
            counts,
            is_priority,
            is_frequency,
            unknown_freq_avg,
            usefulness,
            len_diff_raw,
            tag_penalty,
            raw_index: raw as i64,
            index,
        }
    }

    /// Fields and tags to write back for a scored item.
    ///
    /// Only fields the item actually has are written.
    pub fn write_back(&self, item: &ItemRecord, score: &ItemScore, now: DateTime<Utc>) -> ItemUpdate {
        let tag_names = &self.config.tags;
        let names = &self.config.fields;
        let class = &score.classification;
        let counts = &score.counts;

        let mut tags: Vec<String> = item
            .tags
            .iter()
            .filter(|t| {
                ![
                    &tag_names.not_ready,
                    &tag_names.comprehension,
                    &tag_names.vocab,
                    &tag_names.fresh,
                ]
                .contains(t)
            })
            .cloned()
            .collect();

        let mut fields: Vec<(String, String)> = Vec::new();
        let mut focus = score.focus.clone();
        let mut with_pos = false;
        let unknown_pairs = class.unknown.iter().filter(|m| m.is_multi_word()).count();

        if counts.unmature == 0 {
            tags.push(tag_names.comprehension.clone());
        } else if counts.unknown == 1 {
            tags.push(tag_names.vocab.clone());
            with_pos = true;
        } else if counts.unknown > 1 {
            tags.push(tag_names.not_ready.clone());
        } else if unknown_pairs == 1 {
            tags.push(tag_names.vocab.clone());
            with_pos = true;
        } else if unknown_pairs > 1 {
            tags.push(tag_names.not_ready.clone());
        } else {
            tags.push(tag_names.fresh.clone());
            if focus.is_none() {
                focus = class.unmature.first().cloned();
            }
            with_pos = true;
        }

        if let Some(f) = &focus {
            fields.push((names.focus_morph.clone(), f.base.clone()));
            if with_pos {
                fields.push((names.focus_morph_pos.clone(), f.pos.clone()));
            }
        }
        fields.push((names.unknown_count.clone(), counts.unknown.to_string()));
        fields.push((names.unmature_count.clone(), counts.unmature.to_string()));
        fields.push((names.index.clone(), score.index.to_string()));
        fields.push((names.unknowns.clone(), join_bases(&class.unknown)));
        fields.push((names.unmatures.clone(), join_bases(&class.unmature)));
        fields.push((names.unknown_freq.clone(), score.unknown_freq_avg.to_string()));
        fields.retain(|(name, _)| item.has_field(name));

        if let Some(bad) = &tag_names.bad_length {
            tags.retain(|t| t != bad);
        }
        set_tag(&mut tags, &tag_names.priority, score.is_priority);
        set_tag(&mut tags, &tag_names.frequency, score.is_frequency);
        set_tag(&mut tags, &tag_names.too_short, score.len_diff_raw < 0);
        set_tag(&mut tags, &tag_names.too_long, score.len_diff_raw > 0);
        if !tag_names.set_not_required_tags {
            tags.retain(|t| {
                *t != tag_names.priority && *t != tag_names.too_short && *t != tag_names.too_long
            });
        }
        let mut seen = HashSet::new();
        tags.retain(|t| seen.insert(t.clone()));

        ItemUpdate {
            item_id: item.id,
            fields,
            tags,
            index: score.index,
            modified_at: now,
        }
    }

    /// Score and derive the write-back. `None` when the item is skipped.
    pub fn process(
        &self,
        item: &ItemRecord,
        morphemes: &[Morpheme],
        now: DateTime<Utc>,
    ) -> Option<ItemUpdate> {
        let score = self.score(item, morphemes);
        if self.config.scoring.only_update_k2_and_below && score.counts.unknown > 2 {
            debug!(item = item.id, unknown = score.counts.unknown, "Skipping item with k+3 or more");
            return None;
        }
        Some(self.write_back(item, &score, now))
    }
}

/// First unknown single word, then first unmature single word, then any
/// unknown or unmature multi-word unit.
fn fallback_focus(class: &Classification) -> Option<&Morpheme> {
    first_single(&class.unknown)
        .or_else(|| first_single(&class.unmature))
        .or_else(|| class.unknown.first())
        .or_else(|| class.unmature.first())
}

fn first_single(morphemes: &[Morpheme]) -> Option<&Morpheme> {
    morphemes.iter().find(|m| !m.is_multi_word())
}

fn join_bases(morphemes: &[Morpheme]) -> String {
    morphemes
        .iter()
        .map(|m| m.base.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn set_tag(tags: &mut Vec<String>, tag: &str, on: bool) {
    tags.retain(|t| t != tag);
    if on {
        tags.push(tag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{pos, Location, LocationKey};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn word(w: &str) -> Morpheme {
        Morpheme::uniform(w, pos::UNKNOWN)
    }

    fn pair(a: &str, b: &str) -> Morpheme {
        Morpheme::uniform(&format!("{} {}", a, b), pos::PAIR)
    }

    fn words(list: &[&str]) -> Vec<Morpheme> {
        list.iter().map(|w| word(w)).collect()
    }

    fn db_with(list: &[&str], maturity: f64) -> MorphDb {
        let mut db = MorphDb::new();
        for (i, w) in list.iter().enumerate() {
            let key = LocationKey {
                item_id: 100 + i as i64,
                guid: format!("k{}", i),
                field: "Expression".to_string(),
            };
            db.add(
                word(w),
                Arc::new(Location::new(key, w.to_string(), vec![maturity])),
            );
        }
        db
    }

    fn item(tags: &[&str]) -> ItemRecord {
        ItemRecord {
            id: 1,
            guid: "g1".to_string(),
            category: "Basic".to_string(),
            fields: vec![
                ("Expression".to_string(), "I have a cat.".to_string()),
                ("Morph_FocusMorph".to_string(), String::new()),
                ("Morph_UnknownCount".to_string(), String::new()),
                ("Morph_Index".to_string(), String::new()),
            ],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            maturities: vec![0.0],
        }
    }

    struct Fixture {
        config: MorphConfig,
        all: MorphDb,
        seen: MorphDb,
        known: MorphDb,
        mature: MorphDb,
        priority: MorphDb,
        frequency: FrequencyList,
    }

    impl Fixture {
        fn new(known: &[&str]) -> Self {
            let known_db = db_with(known, 30.0);
            Self {
                config: MorphConfig::with_default_filters(),
                all: known_db.clone(),
                seen: known_db.clone(),
                known: known_db.clone(),
                mature: known_db,
                priority: MorphDb::new(),
                frequency: FrequencyList::default(),
            }
        }

        fn engine(&self) -> ScoringEngine<'_> {
            ScoringEngine::new(
                &self.config,
                ScoringViews {
                    all: &self.all,
                    seen: &self.seen,
                    known: &self.known,
                    mature: &self.mature,
                    priority: &self.priority,
                    frequency: &self.frequency,
                },
            )
        }
    }

    #[test]
    fn known_cat_leaves_three_unknowns() {
        let fx = Fixture::new(&["cat"]);
        let ms = words(&["i", "have", "a", "cat"]);
        let score = fx.engine().score(&item(&[]), &ms);
        assert_eq!(score.counts.n, 4);
        assert_eq!(score.counts.unknown, 3);
        assert_eq!(
            score.classification.unknown,
            words(&["i", "have", "a"])
        );
    }

    #[test]
    fn pairs_count_fractionally() {
        let fx = Fixture::new(&["cat", "run"]);
        let ms = vec![word("cat"), word("run"), pair("cat", "run"), pair("run", "cat")];
        let score = fx.engine().score(&item(&[]), &ms);
        assert_eq!(score.counts.n, 2);
        assert_eq!(score.counts.unknown, 0);
        // two pairs at 0.5 each
        assert_eq!(score.counts.unknown_pairs, 1);
        assert_eq!(score.counts.unmature, 1);
    }

    #[test]
    fn focus_prefers_the_most_frequent_unknown() {
        let mut fx = Fixture::new(&["cat"]);
        fx.frequency = FrequencyList::from_words(["the", "have", "i"]);
        let ms = words(&["i", "have", "a", "cat"]);
        let score = fx.engine().score(&item(&[]), &ms);
        assert_eq!(score.focus, Some(word("have")));
        assert!(score.is_frequency);
        assert!(!score.is_priority);
    }

    #[test]
    fn priority_db_adds_usefulness() {
        let mut fx = Fixture::new(&["cat"]);
        fx.priority = db_with(&["a"], 0.0);
        let ms = words(&["i", "have", "a", "cat"]);
        let score = fx.engine().score(&item(&[]), &ms);
        assert_eq!(score.focus, Some(word("a")));
        assert!(score.is_priority);
    }

    #[test]
    fn fallback_focus_is_first_unknown_single_word() {
        let fx = Fixture::new(&["cat"]);
        let ms = vec![pair("i", "have"), word("i"), word("have")];
        let score = fx.engine().score(&item(&[]), &ms);
        assert_eq!(score.focus, Some(word("i")));
    }

    #[test]
    fn no_priority_penalty_raises_the_index() {
        let mut fx = Fixture::new(&["cat"]);
        let ms = words(&["i", "have", "a", "cat"]);
        let plain = fx.engine().score(&item(&[]), &ms);
        fx.config.scoring.no_priority_penalty = 0.0;
        let waived = fx.engine().score(&item(&[]), &ms);
        assert!(waived.raw_index < plain.raw_index);
    }

    #[test]
    fn more_unknowns_rank_later() {
        let fx = Fixture::new(&["cat", "have"]);
        let one = fx.engine().score(&item(&[]), &words(&["have", "a", "cat"]));
        let two = fx.engine().score(&item(&[]), &words(&["i", "have", "a", "cat"]));
        assert!(one.raw_index < two.raw_index);
    }

    #[test]
    fn length_outside_range_is_tagged() {
        let fx = Fixture::new(&["cat"]);
        let short = fx.engine().score(&item(&[]), &words(&["cat"]));
        assert_eq!(short.len_diff_raw, -1);
        let long_words: Vec<String> = (0..10).map(|i| format!("w{}", i)).collect();
        let refs: Vec<&str> = long_words.iter().map(String::as_str).collect();
        let long = fx.engine().score(&item(&[]), &words(&refs));
        assert_eq!(long.len_diff_raw, 2);
    }

    #[test]
    fn index_is_clamped_above_ceiling() {
        let mut fx = Fixture::new(&[]);
        fx.config.scoring.clamp_ceiling = 1000.0;
        let engine = fx.engine();
        let it = item(&[]);
        let ms = words(&["i", "have"]);
        let score = engine.score(&it, &ms);
        assert!(score.raw_index > 1000);
        let expected = (1000.0 + ((score.raw_index - 1000) as f64).sqrt()).round() as i64;
        assert_eq!(score.index, expected);

        // the written field carries the clamped value too
        let update = engine.process(&it, &ms, Utc::now()).unwrap();
        let field = update
            .fields
            .iter()
            .find(|(n, _)| n == "Morph_Index")
            .map(|(_, v)| v.clone());
        assert_eq!(field, Some(score.index.to_string()));
        assert_eq!(update.index, score.index);
    }

    #[test]
    fn write_back_vocab_item() {
        let fx = Fixture::new(&["i", "have", "a"]);
        let it = item(&["mm_notReady", "mm_badLength", "keep"]);
        let ms = words(&["i", "have", "a", "cat"]);
        let engine = fx.engine();
        let update = engine.process(&it, &ms, Utc::now()).unwrap();

        assert!(update.tags.contains(&"mm_vocab".to_string()));
        assert!(update.tags.contains(&"keep".to_string()));
        assert!(!update.tags.contains(&"mm_notReady".to_string()));
        assert!(!update.tags.contains(&"mm_badLength".to_string()));

        let field = |name: &str| {
            update
                .fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(field("Morph_FocusMorph"), Some("cat".to_string()));
        assert_eq!(field("Morph_UnknownCount"), Some("1".to_string()));
        assert!(field("Morph_Index").is_some());
        // the item has no such field
        assert_eq!(field("Morph_Unknowns"), None);
    }

    #[test]
    fn write_back_categories() {
        let fx = Fixture::new(&["i", "have", "a", "cat"]);
        let engine = fx.engine();
        let now = Utc::now();

        let comp = engine
            .process(&item(&[]), &words(&["i", "have", "a", "cat"]), now)
            .unwrap();
        assert!(comp.tags.contains(&"mm_comprehension".to_string()));

        let not_ready = engine
            .process(&item(&[]), &words(&["dog", "bird"]), now)
            .unwrap();
        assert!(not_ready.tags.contains(&"mm_notReady".to_string()));

        let one_pair = engine
            .process(&item(&[]), &[word("i"), word("cat"), pair("i", "cat")], now)
            .unwrap();
        assert!(one_pair.tags.contains(&"mm_vocab".to_string()));
    }

    #[test]
    fn fresh_when_only_unmature() {
        let mut fx = Fixture::new(&["cat"]);
        fx.mature = MorphDb::new();
        let update = fx
            .engine()
            .process(&item(&[]), &words(&["cat"]), Utc::now())
            .unwrap();
        assert!(update.tags.contains(&"mm_fresh".to_string()));
        assert!(update
            .fields
            .contains(&("Morph_FocusMorph".to_string(), "cat".to_string())));
    }

    #[test]
    fn lite_update_skips_k3() {
        let mut fx = Fixture::new(&[]);
        fx.config.scoring.only_update_k2_and_below = true;
        let engine = fx.engine();
        assert!(engine
            .process(&item(&[]), &words(&["a", "b", "c"]), Utc::now())
            .is_none());
        assert!(engine
            .process(&item(&[]), &words(&["a", "b"]), Utc::now())
            .is_some());
    }

    #[test]
    fn proper_nouns_can_count_as_known() {
        let mut fx = Fixture::new(&[]);
        fx.config.scoring.proper_nouns_known = true;
        let name = Morpheme::new("tokyo", "tokyo", "tokyo", "tokyo", pos::PROPER_NOUN, pos::UNKNOWN);
        let score = fx.engine().score(&item(&[]), &[name, word("go")]);
        assert_eq!(score.counts.unknown, 1);
        assert_eq!(score.counts.n, 2);
    }
}

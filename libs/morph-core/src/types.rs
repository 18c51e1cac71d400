//! Core value types: morphemes, locations and host items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Part-of-speech labels attached by the built-in morphemizers.
pub mod pos {
    pub const UNKNOWN: &str = "UNKNOWN";
    pub const PAIR: &str = "PAIR";
    pub const CJK_CHAR: &str = "CJK_CHAR";
    pub const PROPER_NOUN: &str = "PROPN";
    /// Sub-tag used by Japanese segmenters for proper nouns.
    pub const PROPER_NOUN_JA: &str = "固有名詞";
}

/// A normalized lexical unit.
///
/// Equality and hashing use `(norm, base, pos, sub_pos)`; `inflected` and `read`
/// are informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Morpheme {
    pub norm: String,
    pub base: String,
    pub inflected: String,
    pub read: String,
    pub pos: String,
    pub sub_pos: String,
}

impl Morpheme {
    pub fn new(
        norm: impl Into<String>,
        base: impl Into<String>,
        inflected: impl Into<String>,
        read: impl Into<String>,
        pos: impl Into<String>,
        sub_pos: impl Into<String>,
    ) -> Self {
        Self {
            norm: norm.into(),
            base: base.into(),
            inflected: inflected.into(),
            read: read.into(),
            pos: pos.into(),
            sub_pos: sub_pos.into(),
        }
    }

    /// Morpheme whose four form fields are all `word`.
    pub fn uniform(word: &str, pos: &str) -> Self {
        Self::new(word, word, word, word, pos, pos::UNKNOWN)
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            base: self.base.clone(),
            pos: self.pos.clone(),
        }
    }

    pub fn is_proper_noun(&self) -> bool {
        self.pos == pos::PROPER_NOUN
            || self.sub_pos == pos::PROPER_NOUN
            || self.sub_pos == pos::PROPER_NOUN_JA
    }

    /// True for adjacent-word pairs and any other unit spanning several words.
    pub fn is_multi_word(&self) -> bool {
        self.base.contains(' ')
    }

    pub fn word_count(&self) -> usize {
        self.base.split(' ').filter(|w| !w.is_empty()).count().max(1)
    }

    /// Whether this (stored) morpheme satisfies a query for `query`.
    ///
    /// Both are assumed to share a group key. A stored form satisfies the query
    /// when the normalized forms agree or one surface form contains the other.
    /// An empty surface form only matches through the normalized form.
    pub fn includes(&self, query: &Morpheme) -> bool {
        if self.norm == query.norm {
            return true;
        }
        if self.inflected.is_empty() || query.inflected.is_empty() {
            return false;
        }
        query.inflected.contains(self.inflected.as_str())
            || self.inflected.contains(query.inflected.as_str())
    }

    /// One-line rendering used in study plans and logs.
    pub fn show(&self) -> String {
        format!(
            "{}\t[{},{},{},{}]",
            self.base, self.norm, self.read, self.pos, self.sub_pos
        )
    }

    fn identity(&self) -> (&str, &str, &str, &str) {
        (&self.norm, &self.base, &self.pos, &self.sub_pos)
    }
}

impl PartialEq for Morpheme {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Morpheme {}

impl Hash for Morpheme {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for Morpheme {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Morpheme {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// Coarse key used for fuzzy matching of variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub base: String,
    pub pos: String,
}

/// Identity of a location: one field of one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
    pub item_id: i64,
    pub guid: String,
    pub field: String,
}

/// Where a morpheme was observed, plus how mature that observation is.
///
/// Identity is the [`LocationKey`]; the payload is replaced, never mutated,
/// when the source item changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub key: LocationKey,
    pub field_value: String,
    pub maturities: Vec<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_known: bool,
    /// Morphemizer that produced this location's morphemes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tokenizer: String,
    /// The item carried a skip tag, so no morphemes were extracted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl Location {
    pub fn new(key: LocationKey, field_value: String, maturities: Vec<f64>) -> Self {
        Self {
            key,
            field_value,
            maturities,
            always_known: false,
            tokenizer: String::new(),
            skipped: false,
        }
    }

    /// Highest maturity across the item's cards; infinite when always known.
    pub fn maturity(&self) -> f64 {
        if self.always_known {
            return f64::INFINITY;
        }
        self.maturities.iter().copied().fold(0.0, f64::max)
    }

    /// Same text, extracted the same way, so the morphemes still hold.
    pub fn same_source(&self, other: &Location) -> bool {
        self.field_value == other.field_value
            && self.tokenizer == other.tokenizer
            && self.skipped == other.skipped
    }

    /// Same source and same maturity payload.
    pub fn same_payload(&self, other: &Location) -> bool {
        self.same_source(other)
            && self.maturities == other.maturities
            && self.always_known == other.always_known
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Maturity of one card given its interval.
///
/// Cards still in learning with no interval count as half a day.
pub fn card_maturity(interval_days: f64, learning: bool) -> f64 {
    if interval_days == 0.0 && learning {
        0.5
    } else {
        interval_days
    }
}

/// Item supplied by the host collection. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: i64,
    pub guid: String,
    /// Item type name; selects filters and length profiles.
    pub category: String,
    /// Ordered `(name, value)` pairs.
    pub fields: Vec<(String, String)>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// One maturity per card generated from this item.
    #[serde(default)]
    pub maturities: Vec<f64>,
}

impl ItemRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Derived values written back to one host item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub item_id: i64,
    /// Only fields the item actually has are listed.
    pub fields: Vec<(String, String)>,
    /// Complete replacement tag list.
    pub tags: Vec<String>,
    /// Clamped ranking index, used by the host to order new cards.
    pub index: i64,
    pub modified_at: DateTime<Utc>,
}

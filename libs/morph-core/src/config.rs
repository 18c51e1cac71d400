//! Configuration for the recalc and readability passes.
//!
//! Loaded once per pass and threaded through every call; nothing reads
//! configuration ad hoc. Every section falls back to its defaults, so a partial
//! (or absent) JSON file is valid.

use crate::error::{MorphError, Result};
use crate::morphemizer::TextOptions;
use crate::types::ItemRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    pub thresholds: Thresholds,
    pub tags: TagNames,
    pub fields: FieldNames,
    pub filters: Vec<ItemFilter>,
    pub text: TextOptions,
    pub scoring: ScoringConfig,
    pub readability: ReadabilityConfig,
}

impl MorphConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<MorphConfig> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                return Ok(MorphConfig::with_default_filters());
            }
            Err(e) => return Err(MorphError::io(path, e)),
        };
        let mut config: MorphConfig = serde_json::from_str(&text)?;
        if config.filters.is_empty() {
            config.filters = default_filters();
        }
        Ok(config)
    }

    /// Defaults plus a catch-all filter reading the `Expression` field.
    pub fn with_default_filters() -> Self {
        Self {
            filters: default_filters(),
            ..Default::default()
        }
    }

    /// First filter whose category and tags match the item.
    pub fn filter_for(&self, item: &ItemRecord) -> Option<&ItemFilter> {
        self.filters.iter().find(|f| f.matches(item))
    }
}

fn default_filters() -> Vec<ItemFilter> {
    vec![ItemFilter::default()]
}

/// Maturity thresholds (in days) deriving the seen/known/mature views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub seen: f64,
    pub known: f64,
    pub mature: f64,
    /// Treat every card as new when building the database.
    pub ignore_maturity: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            seen: 1.0,
            known: 10.0,
            mature: 21.0,
            ignore_maturity: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagNames {
    pub comprehension: String,
    pub vocab: String,
    pub not_ready: String,
    pub fresh: String,
    pub already_known: String,
    pub priority: String,
    pub too_short: String,
    pub too_long: String,
    pub frequency: String,
    /// Retired tag, removed from every processed item.
    pub bad_length: Option<String>,
    /// Keep the priority/too-short/too-long tags on items.
    pub set_not_required_tags: bool,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            comprehension: "mm_comprehension".to_string(),
            vocab: "mm_vocab".to_string(),
            not_ready: "mm_notReady".to_string(),
            fresh: "mm_fresh".to_string(),
            already_known: "mm_alreadyKnown".to_string(),
            priority: "mm_priority".to_string(),
            too_short: "mm_tooShort".to_string(),
            too_long: "mm_tooLong".to_string(),
            frequency: "mm_frequency".to_string(),
            bad_length: Some("mm_badLength".to_string()),
            set_not_required_tags: true,
        }
    }
}

/// Names of the item fields written back by the recalc pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub focus_morph: String,
    pub focus_morph_pos: String,
    pub unknown_count: String,
    pub unmature_count: String,
    pub index: String,
    pub unknowns: String,
    pub unmatures: String,
    pub unknown_freq: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            focus_morph: "Morph_FocusMorph".to_string(),
            focus_morph_pos: "Morph_FocusMorphPos".to_string(),
            unknown_count: "Morph_UnknownCount".to_string(),
            unmature_count: "Morph_UnmatureCount".to_string(),
            index: "Morph_Index".to_string(),
            unknowns: "Morph_Unknowns".to_string(),
            unmatures: "Morph_Unmatures".to_string(),
            unknown_freq: "Morph_UnknownFreq".to_string(),
        }
    }
}

/// Decides whether and how an item is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    /// Item category to match; `None` matches any.
    pub category: Option<String>,
    /// Tags the item must all carry.
    pub tags: Vec<String>,
    /// Fields to tokenize, in order.
    pub fields: Vec<String>,
    /// Registry name of the morphemizer.
    pub morphemizer: String,
    /// Whether matching items get scored and written back.
    pub modify: bool,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            category: None,
            tags: Vec::new(),
            fields: vec!["Expression".to_string()],
            morphemizer: "space".to_string(),
            modify: true,
        }
    }
}

impl ItemFilter {
    pub fn matches(&self, item: &ItemRecord) -> bool {
        self.category.as_ref().map_or(true, |c| *c == item.category)
            && self.tags.iter().all(|t| item.has_tag(t))
    }
}

/// Acceptable length range for one item category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthProfile {
    pub category: String,
    /// Match `category` as a prefix instead of exactly.
    #[serde(default)]
    pub prefix: bool,
    pub min: i64,
    pub max: i64,
    pub penalty: f64,
    #[serde(default = "default_unknown_multiplier")]
    pub unknown_multiplier: f64,
}

fn default_unknown_multiplier() -> f64 {
    1.0
}

impl LengthProfile {
    pub fn matches(&self, category: &str) -> bool {
        if self.prefix {
            category.starts_with(&self.category)
        } else {
            category == self.category
        }
    }
}

/// Tag names marking an item's urgency, and the bonus each state earns.
///
/// Bonuses are added to the penalty, so negative values move items forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyConfig {
    pub important_tag: String,
    pub not_important_tag: String,
    pub urgent_tag: String,
    pub not_urgent_tag: String,
    /// Implies urgent.
    pub immediate_tag: String,
    pub important_bonus: f64,
    pub urgent_bonus: f64,
    pub immediate_bonus: f64,
}

impl Default for UrgencyConfig {
    fn default() -> Self {
        Self {
            important_tag: "mm_imp".to_string(),
            not_important_tag: "mm_notimp".to_string(),
            urgent_tag: "mm_urg".to_string(),
            not_urgent_tag: "mm_noturg".to_string(),
            immediate_tag: "mm_now".to_string(),
            important_bonus: -50_000.0,
            urgent_bonus: -100_000.0,
            immediate_bonus: -300_000.0,
        }
    }
}

/// How the matching entries of a [`TagPenaltyRule`] are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    #[default]
    Sum,
    Max,
    Min,
    /// Entry order decides; the first matching tag wins.
    First,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPenalty {
    pub tag: String,
    pub penalty: f64,
}

/// Named tag-driven penalty term. Tags compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPenaltyRule {
    pub name: String,
    pub entries: Vec<TagPenalty>,
    #[serde(default)]
    pub combine: Combine,
    /// Value when no entry matches.
    #[serde(default)]
    pub otherwise: f64,
}

/// Language flag: scales length and unknown-word weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageRule {
    pub tag: String,
    pub multiplier: f64,
    /// Added unless the item is marked immediate.
    #[serde(default)]
    pub prio_malus: f64,
}

/// Fixed penalty for item categories starting with `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPenalty {
    pub prefix: String,
    pub penalty: f64,
}

/// Weights of the ranking index. The defaults are tuned values, not derived ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier of the frequency-list rank bonus.
    pub frequency_bonus: f64,
    pub priority_weight: f64,
    pub reinforce_weight: f64,
    /// Added when neither the priority db nor the frequency list applied.
    pub no_priority_penalty: f64,
    pub usefulness_base: f64,
    pub usefulness_cap: f64,
    /// Equivalence of each extra word in a multi-word unit.
    pub combo_weight: f64,
    pub min_good_length: i64,
    pub max_good_length: i64,
    pub default_length_penalty: f64,
    pub length_profiles: Vec<LengthProfile>,
    /// Per unit of language multiplier, added to the tag penalty.
    pub language_base_penalty: f64,
    pub unknown_value_base: f64,
    pub unknown_value_language_factor: f64,
    pub urgency: UrgencyConfig,
    pub tag_rules: Vec<TagPenaltyRule>,
    pub languages: Vec<LanguageRule>,
    pub category_penalties: Vec<CategoryPenalty>,
    /// Indices up to here pass unchanged.
    pub clamp_ceiling: f64,
    /// Largest index ever written.
    pub clamp_cap: f64,
    /// Skip write-back for items with more than two unknowns.
    pub only_update_k2_and_below: bool,
    /// Off by default: a name in an item still counts as new vocabulary.
    pub proper_nouns_known: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            frequency_bonus: 100_000.0,
            priority_weight: 200.0,
            reinforce_weight: 5.0,
            no_priority_penalty: 1_000_000.0,
            usefulness_base: 399_999.0,
            usefulness_cap: 599_999.0,
            combo_weight: 0.5,
            min_good_length: 2,
            max_good_length: 8,
            default_length_penalty: 10_000.0,
            length_profiles: vec![
                LengthProfile {
                    category: "IR3".to_string(),
                    prefix: false,
                    min: 3,
                    max: 500,
                    penalty: 133.0,
                    unknown_multiplier: 1.0,
                },
                LengthProfile {
                    category: "C-Clz-pron".to_string(),
                    prefix: true,
                    min: 1,
                    max: 4,
                    penalty: 40_000.0,
                    unknown_multiplier: 1.0,
                },
                LengthProfile {
                    category: "movies2anki".to_string(),
                    prefix: true,
                    min: 1,
                    max: 4,
                    penalty: 80_000.0,
                    unknown_multiplier: 10.0,
                },
            ],
            language_base_penalty: 10_000.0,
            unknown_value_base: 30_000.0,
            unknown_value_language_factor: 35_000.0,
            urgency: UrgencyConfig::default(),
            tag_rules: vec![
                TagPenaltyRule {
                    name: "role".to_string(),
                    entries: vec![
                        TagPenalty {
                            tag: "role_main".to_string(),
                            penalty: -20_000.0,
                        },
                        TagPenalty {
                            tag: "role_minor".to_string(),
                            penalty: 20_000.0,
                        },
                    ],
                    combine: Combine::First,
                    otherwise: 0.0,
                },
                TagPenaltyRule {
                    name: "fiction".to_string(),
                    entries: vec![TagPenalty {
                        tag: "fiction".to_string(),
                        penalty: 30_000.0,
                    }],
                    combine: Combine::Sum,
                    otherwise: 0.0,
                },
            ],
            languages: Vec::new(),
            category_penalties: Vec::new(),
            clamp_ceiling: 10_000_000.0,
            clamp_cap: 99_999_999.0,
            only_update_k2_and_below: false,
            proper_nouns_known: false,
        }
    }
}

impl ScoringConfig {
    /// `(min, max, penalty, unknown multiplier)` for an item category.
    pub fn length_profile(&self, category: &str) -> (i64, i64, f64, f64) {
        match self.length_profiles.iter().find(|p| p.matches(category)) {
            Some(p) => (p.min, p.max, p.penalty, p.unknown_multiplier),
            None => (
                self.min_good_length,
                self.max_good_length,
                self.default_length_penalty,
                1.0,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityConfig {
    pub source_score_power: f64,
    pub source_score_multiplier: f64,
    /// Candidates rarer than this in the master table are never planned.
    pub min_master_frequency: u64,
    /// Instance coverage, in percent, each source is planned up to.
    pub target_percent: f64,
    /// Append every remaining candidate to the frequency list output.
    pub fill_all_morphs_in_plan: bool,
    /// Base forms starting with any of these stay out of the frequency list output.
    pub excluded_prefixes: Vec<String>,
    /// On by default: names in a corpus are easy to pick up while reading,
    /// so they count toward readability and are never planned.
    pub proper_nouns_known: bool,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            source_score_power: 2.0,
            source_score_multiplier: 10.0,
            min_master_frequency: 0,
            target_percent: 98.0,
            fill_all_morphs_in_plan: false,
            excluded_prefixes: Vec::new(),
            proper_nouns_known: true,
        }
    }
}

//! Tag-driven penalty terms and the index clamp.
//!
//! Every term is computed by its own named rule. A term that comes out
//! undefined (NaN or infinite) counts as zero and is logged.

use crate::config::{Combine, ScoringConfig, TagPenaltyRule, UrgencyConfig};
use std::collections::HashSet;
use tracing::warn;

/// Urgency state read from an item's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Urgency {
    pub important: bool,
    pub urgent: bool,
    pub immediate: bool,
}

impl Urgency {
    pub fn from_tags(tags: &HashSet<String>, config: &UrgencyConfig) -> Self {
        let has = |t: &str| tags.contains(&t.to_lowercase());
        let immediate = has(&config.immediate_tag);
        Self {
            important: has(&config.important_tag) && !has(&config.not_important_tag),
            urgent: immediate || (has(&config.urgent_tag) && !has(&config.not_urgent_tag)),
            immediate,
        }
    }
}

/// Every term of the tag penalty, kept for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPenaltyBreakdown {
    pub urgency: Urgency,
    pub prio: f64,
    pub rules: Vec<(String, f64)>,
    pub language_multiplier: f64,
    pub language_malus: f64,
    pub category: f64,
    pub total: f64,
}

/// Lower-cased tag set used for every rule.
pub fn tag_set(tags: &[String]) -> HashSet<String> {
    tags.iter().map(|t| t.to_lowercase()).collect()
}

pub fn tag_penalty(tags: &[String], category: &str, config: &ScoringConfig) -> TagPenaltyBreakdown {
    let tags = tag_set(tags);
    let urgency = Urgency::from_tags(&tags, &config.urgency);

    let prio = defined("prio", prio_penalty(urgency, &config.urgency));
    let rules: Vec<(String, f64)> = config
        .tag_rules
        .iter()
        .map(|rule| (rule.name.clone(), defined(&rule.name, rule_value(rule, &tags))))
        .collect();

    let language_multiplier = language_multiplier(&tags, config);
    let language_malus = defined("language_malus", language_malus(&tags, urgency, config));
    let category = defined("category", category_penalty(category, config));

    let total = prio
        + rules.iter().map(|(_, v)| v).sum::<f64>()
        + language_multiplier * config.language_base_penalty
        + language_malus
        + category;

    TagPenaltyBreakdown {
        urgency,
        prio,
        rules,
        language_multiplier,
        language_malus,
        category,
        total,
    }
}

fn prio_penalty(urgency: Urgency, config: &UrgencyConfig) -> f64 {
    let mut penalty = 0.0;
    if urgency.immediate {
        penalty += config.immediate_bonus;
    } else if urgency.urgent {
        penalty += config.urgent_bonus;
    }
    if urgency.important {
        penalty += config.important_bonus;
    }
    penalty
}

/// Value of one rule over a lower-cased tag set.
pub fn rule_value(rule: &TagPenaltyRule, tags: &HashSet<String>) -> f64 {
    let mut hits = rule
        .entries
        .iter()
        .filter(|e| tags.contains(&e.tag.to_lowercase()))
        .map(|e| e.penalty)
        .peekable();
    if hits.peek().is_none() {
        return rule.otherwise;
    }
    match rule.combine {
        Combine::Sum => hits.sum(),
        Combine::Max => hits.fold(f64::NEG_INFINITY, f64::max),
        Combine::Min => hits.fold(f64::INFINITY, f64::min),
        Combine::First => hits.next().unwrap_or(rule.otherwise),
    }
}

/// Largest multiplier among the item's language tags, 1.0 without any.
fn language_multiplier(tags: &HashSet<String>, config: &ScoringConfig) -> f64 {
    let multiplier = config
        .languages
        .iter()
        .filter(|l| tags.contains(&l.tag.to_lowercase()))
        .map(|l| l.multiplier)
        .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))))
        .unwrap_or(1.0);
    if multiplier.is_finite() {
        multiplier
    } else {
        warn!(rule = "language_multiplier", "Penalty rule is undefined, using 1");
        1.0
    }
}

fn language_malus(tags: &HashSet<String>, urgency: Urgency, config: &ScoringConfig) -> f64 {
    if urgency.immediate {
        return 0.0;
    }
    config
        .languages
        .iter()
        .filter(|l| tags.contains(&l.tag.to_lowercase()))
        .map(|l| l.prio_malus)
        .sum()
}

fn category_penalty(category: &str, config: &ScoringConfig) -> f64 {
    config
        .category_penalties
        .iter()
        .find(|c| category.starts_with(&c.prefix))
        .map_or(0.0, |c| c.penalty)
}

fn defined(rule: &str, value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!(rule, value, "Penalty rule is undefined, using 0");
        0.0
    }
}

/// Compress indices above `ceiling` so large values still sort but stay below `cap`.
///
/// The identity up to `ceiling`, then `ceiling + sqrt(x - ceiling)`, capped.
pub fn clamp_index(x: f64, ceiling: f64, cap: f64) -> f64 {
    if x <= ceiling {
        x
    } else {
        (ceiling + (x - ceiling).sqrt()).min(cap)
    }
}

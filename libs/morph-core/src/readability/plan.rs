//! Greedy study plan.
//!
//! Each source, in corpus order, picks its unknown morphemes by descending
//! score until its instance coverage reaches the target. Learned morphemes
//! carry over to later sources. The result is a heuristic, not a minimum set.

use super::{percent, CorpusMeasurement, MeasuredSource, ReadabilityAnalyzer};
use crate::config::ReadabilityConfig;
use crate::counting::CountingDb;
use crate::db::MorphDb;
use crate::error::Result;
use crate::progress::{PassControl, ProgressEvent};
use crate::types::Morpheme;
use std::collections::HashSet;
use tracing::{debug, info};

/// An unknown morpheme considered for the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMorph {
    pub morpheme: Morpheme,
    /// Instances in its source.
    pub instances: u64,
    /// Fuzzy count among the source's unknowns.
    pub source_count: u64,
    /// Fuzzy count among the corpus' unknowns.
    pub corpus_count: u64,
    /// Fuzzy count in the master table.
    pub master_count: u64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourcePlan {
    pub name: String,
    pub learned: Vec<PlannedMorph>,
    /// Morphemes learned up to and including this source.
    pub cumulative: usize,
    pub readability_before: f64,
    pub readability_after: f64,
    pub line_readability_before: f64,
    pub line_readability_after: f64,
}

#[derive(Debug, Clone)]
pub struct StudyPlan {
    pub sources: Vec<SourcePlan>,
    /// Every candidate of every source, in source order.
    pub candidates: Vec<PlannedMorph>,
    /// Known database plus every planned morpheme.
    pub known_after: MorphDb,
    /// Master frequency below which candidates were passed over.
    pub min_master_frequency: u64,
}

impl StudyPlan {
    pub fn learned(&self) -> impl Iterator<Item = &PlannedMorph> {
        self.sources.iter().flat_map(|s| s.learned.iter())
    }

    /// Entries of the output vocabulary list: the plan in order, then (when
    /// configured) every other candidate by score. One entry per base form.
    pub fn vocabulary(&self, config: &ReadabilityConfig) -> Vec<&PlannedMorph> {
        let mut bases = HashSet::new();
        let mut out: Vec<&PlannedMorph> = self
            .learned()
            .filter(|p| bases.insert(p.morpheme.base.as_str()))
            .collect();

        if config.fill_all_morphs_in_plan {
            let mut rest: Vec<&PlannedMorph> = self.candidates.iter().collect();
            rest.sort_by(|a, b| b.score.total_cmp(&a.score));
            for p in rest {
                let base = p.morpheme.base.as_str();
                if config.excluded_prefixes.iter().any(|x| base.starts_with(x.as_str()))
                    || p.master_count < self.min_master_frequency
                    || !bases.insert(base)
                {
                    continue;
                }
                out.push(p);
            }
        }
        out
    }
}

/// `(source + corpus)^power * multiplier + master`.
pub fn candidate_score(source: u64, corpus: u64, master: u64, config: &ReadabilityConfig) -> f64 {
    ((source + corpus) as f64).powf(config.source_score_power) * config.source_score_multiplier
        + master as f64
}

/// Plan, source by source, which unknown morphemes to learn.
///
/// Without a master table there is no minimum master frequency.
pub fn build_study_plan(
    corpus: &CorpusMeasurement,
    analyzer: &ReadabilityAnalyzer<'_>,
    master: &CountingDb,
    control: &PassControl,
) -> Result<StudyPlan> {
    let config = analyzer.config();
    let min_master_frequency = if master.total_instances() == 0 {
        0
    } else {
        config.min_master_frequency
    };
    let mut known = analyzer.known().clone();
    let mut queued: HashSet<Morpheme> = HashSet::new();
    let mut plan = StudyPlan {
        sources: Vec::new(),
        candidates: Vec::new(),
        known_after: MorphDb::new(),
        min_master_frequency,
    };
    let mut cumulative = 0;
    let total = corpus.sources.len();

    for (n, source) in corpus.sources.iter().enumerate() {
        control.checkpoint(ProgressEvent::PlanningSource {
            name: source.counts.name.clone(),
            n,
            total,
        })?;

        let line_before = line_readability(source, &known);
        let mut seen_i: u64 = 0;
        let mut known_i: u64 = 0;
        let mut candidates = Vec::new();
        for (morpheme, count) in source.morphs.iter() {
            seen_i += *count;
            if analyzer.is_known(morpheme, &known) {
                known_i += *count;
                continue;
            }
            let source_count = source.unknown.fuzzy_count(morpheme, &known);
            let corpus_count = corpus.unknown.fuzzy_count(morpheme, &known);
            let master_count = master.fuzzy_count(morpheme, &known);
            candidates.push(PlannedMorph {
                morpheme: morpheme.clone(),
                instances: *count,
                source_count,
                corpus_count,
                master_count,
                score: candidate_score(source_count, corpus_count, master_count, config),
            });
        }

        let before = percent(known_i, seen_i);
        let mut readability = before;
        let mut ranked: Vec<&PlannedMorph> = candidates.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut learned = Vec::new();
        for candidate in ranked {
            if readability >= config.target_percent {
                debug!(source = %source.counts.name, readability, "Target reached");
                break;
            }
            if known.matches(&candidate.morpheme)
                || candidate.master_count < min_master_frequency
                || queued.contains(&candidate.morpheme)
            {
                continue;
            }
            known_i += source.unknown.fuzzy_count(&candidate.morpheme, &known);
            readability = percent(known_i, seen_i);
            known.insert_known(candidate.morpheme.clone());
            queued.insert(candidate.morpheme.clone());
            learned.push(candidate.clone());
        }

        cumulative += learned.len();
        plan.sources.push(SourcePlan {
            name: source.counts.name.clone(),
            learned,
            cumulative,
            readability_before: before,
            readability_after: readability,
            line_readability_before: line_before,
            line_readability_after: line_readability(source, &known),
        });
        plan.candidates.extend(candidates);
    }

    info!(sources = plan.sources.len(), learned = cumulative, "Study plan built");
    plan.known_after = known;
    Ok(plan)
}

/// Share of a source's lines whose unknowns are all matched by `known`.
fn line_readability(source: &MeasuredSource, known: &MorphDb) -> f64 {
    let clear = source
        .line_unknowns
        .iter()
        .filter(|line| line.iter().all(|m| known.matches(m)))
        .count();
    percent(clear as u64, source.line_unknowns.len() as u64)
}

//! Corpus readability: how much of a text corpus the known database covers,
//! and which unknown morphemes to learn next.
//!
//! The corpus is independent of the item collection. It goes through the
//! same morphemizers and the same fuzzy matching as item text.

pub mod plan;
pub mod report;
pub mod source;

use crate::config::ReadabilityConfig;
use crate::counting::CountingDb;
use crate::db::MorphDb;
use crate::error::Result;
use crate::morphemizer::{extract_morphemes, Morphemizer, TextOptions};
use crate::progress::{PassControl, ProgressEvent};
use crate::types::Morpheme;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub use plan::{build_study_plan, PlannedMorph, SourcePlan, StudyPlan};
pub use source::{discover_sources, read_source, text_blocks, SourceKind};

/// `100 * part / whole`, or 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Counts keeping the order morphemes were first seen in.
#[derive(Debug, Clone, Default)]
pub struct OrderedCounts {
    index: HashMap<Morpheme, usize>,
    entries: Vec<(Morpheme, u64)>,
}

impl OrderedCounts {
    pub fn add(&mut self, morpheme: &Morpheme, count: u64) {
        match self.index.get(morpheme) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.index.insert(morpheme.clone(), self.entries.len());
                self.entries.push((morpheme.clone(), count));
            }
        }
    }

    pub fn get(&self, morpheme: &Morpheme) -> u64 {
        self.index.get(morpheme).map_or(0, |&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Morpheme, u64)> {
        self.entries.iter()
    }
}

/// Counters of one source, or of the whole corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadabilityCounts {
    pub name: String,
    pub total_morphs: u64,
    pub known_morphs: u64,
    pub instances: u64,
    pub known_instances: u64,
    pub proper_noun_instances: u64,
    pub lines: u64,
    pub known_lines: u64,
    /// Lines with exactly one unknown instance.
    pub iplus1_lines: u64,
}

impl ReadabilityCounts {
    pub fn known_morph_percent(&self) -> f64 {
        percent(self.known_morphs, self.total_morphs)
    }

    /// Known share of morpheme instances.
    pub fn readability(&self) -> f64 {
        percent(self.known_instances, self.instances)
    }

    pub fn proper_noun_percent(&self) -> f64 {
        percent(self.proper_noun_instances, self.instances)
    }

    pub fn line_readability(&self) -> f64 {
        percent(self.known_lines, self.lines)
    }

    pub fn iplus1_percent(&self) -> f64 {
        percent(self.iplus1_lines, self.lines)
    }

    fn absorb(&mut self, other: &ReadabilityCounts) {
        self.instances += other.instances;
        self.known_instances += other.known_instances;
        self.proper_noun_instances += other.proper_noun_instances;
        self.lines += other.lines;
        self.known_lines += other.known_lines;
        self.iplus1_lines += other.iplus1_lines;
    }
}

/// One measured source with what the study plan needs from it.
#[derive(Debug, Clone, Default)]
pub struct MeasuredSource {
    pub counts: ReadabilityCounts,
    /// Every morpheme of the source with its instance count.
    pub morphs: OrderedCounts,
    /// Unknown morphemes of each measured line.
    pub line_unknowns: Vec<HashSet<Morpheme>>,
    /// Unknown instances of this source only.
    pub unknown: CountingDb,
}

/// Measurement of a whole corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusMeasurement {
    pub sources: Vec<MeasuredSource>,
    pub totals: ReadabilityCounts,
    /// Instance counts of every morpheme in the corpus.
    pub all_morphs: OrderedCounts,
    /// Unknown instances across all sources.
    pub unknown: CountingDb,
}

pub struct ReadabilityAnalyzer<'a> {
    morphemizer: &'a dyn Morphemizer,
    text: &'a TextOptions,
    config: &'a ReadabilityConfig,
    known: &'a MorphDb,
}

impl<'a> ReadabilityAnalyzer<'a> {
    pub fn new(
        morphemizer: &'a dyn Morphemizer,
        text: &'a TextOptions,
        config: &'a ReadabilityConfig,
        known: &'a MorphDb,
    ) -> Self {
        Self {
            morphemizer,
            text,
            config,
            known,
        }
    }

    pub fn config(&self) -> &ReadabilityConfig {
        self.config
    }

    pub fn known(&self) -> &MorphDb {
        self.known
    }

    fn is_known(&self, morpheme: &Morpheme, known: &MorphDb) -> bool {
        (self.config.proper_nouns_known && morpheme.is_proper_noun()) || known.matches(morpheme)
    }

    /// Measure one source's text. Corpus-wide tallies go into `corpus`.
    pub fn measure_text(
        &self,
        name: &str,
        kind: SourceKind,
        text: &str,
        corpus: &mut CorpusMeasurement,
    ) -> MeasuredSource {
        let mut source = MeasuredSource {
            counts: ReadabilityCounts {
                name: name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut known_morphs = HashSet::new();

        for block in text_blocks(kind, text) {
            let morphemes = extract_morphemes(self.morphemizer, &block, &[], self.text);
            if morphemes.is_empty() {
                continue;
            }
            let mut unknown_here = 0;
            let mut missing = HashSet::new();
            for m in &morphemes {
                corpus.all_morphs.add(m, 1);
                source.morphs.add(m, 1);
                source.counts.instances += 1;
                if m.is_proper_noun() {
                    source.counts.proper_noun_instances += 1;
                }
                if self.is_known(m, self.known) {
                    source.counts.known_instances += 1;
                    known_morphs.insert(m.clone());
                } else {
                    corpus.unknown.add_morph(m, 1);
                    source.unknown.add_morph(m, 1);
                    missing.insert(m.clone());
                    unknown_here += 1;
                }
            }
            source.counts.lines += 1;
            match unknown_here {
                0 => source.counts.known_lines += 1,
                1 => source.counts.iplus1_lines += 1,
                _ => {}
            }
            source.line_unknowns.push(missing);
        }

        source.counts.total_morphs = source.morphs.len() as u64;
        source.counts.known_morphs = known_morphs.len() as u64;
        source
    }

    /// Measure every file in `paths`, in order.
    ///
    /// A file that cannot be read is logged and left out.
    pub fn measure_corpus(
        &self,
        paths: &[PathBuf],
        control: &PassControl,
    ) -> Result<CorpusMeasurement> {
        let started = Instant::now();
        let mut corpus = CorpusMeasurement {
            totals: ReadabilityCounts {
                name: "total".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let total = paths.len();

        for (n, path) in paths.iter().enumerate() {
            let name = source_name(path);
            control.checkpoint(ProgressEvent::MeasuringSource {
                name: name.clone(),
                n,
                total,
            })?;
            let Some(kind) = SourceKind::from_path(path) else {
                debug!(path = %path.display(), "Not a corpus file, skipping");
                continue;
            };
            let text = match read_source(path) {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, "Failed to read source, skipping");
                    continue;
                }
            };
            let source = self.measure_text(&name, kind, &text, &mut corpus);
            debug!(
                source = %name,
                instances = source.counts.instances,
                readability = source.counts.readability(),
                "Measured source"
            );
            corpus.totals.absorb(&source.counts);
            corpus.sources.push(source);
        }

        corpus.totals.total_morphs = corpus.all_morphs.len() as u64;
        corpus.totals.known_morphs = corpus
            .all_morphs
            .iter()
            .filter(|(m, _)| self.is_known(m, self.known))
            .count() as u64;

        info!(
            sources = corpus.sources.len(),
            instances = corpus.totals.instances,
            readability = corpus.totals.readability(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Measured corpus"
        );
        Ok(corpus)
    }
}

/// File name shown in reports.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Percentage of master-table instances `known` covers, or `None` for an empty table.
///
/// Matched entries are marked, so later fuzzy counts skip them.
pub fn master_readability(master: &mut CountingDb, known: &MorphDb) -> Option<f64> {
    let total = master.total_instances();
    if total == 0 {
        return None;
    }
    Some(percent(master.mark_matched(known), total))
}

/// Everything one readability run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub measurement: CorpusMeasurement,
    pub plan: Option<StudyPlan>,
    pub master_before: Option<f64>,
    pub master_after: Option<f64>,
}

/// Measure every corpus file under `dir` and optionally plan what to learn.
pub fn analyze_corpus(
    dir: &Path,
    analyzer: &ReadabilityAnalyzer<'_>,
    master: &mut CountingDb,
    with_plan: bool,
    control: &PassControl,
) -> Result<Analysis> {
    let paths = discover_sources(dir)?;
    info!(dir = %dir.display(), files = paths.len(), "Analyzing corpus");

    let master_before = master_readability(master, analyzer.known());
    let measurement = analyzer.measure_corpus(&paths, control)?;

    let (plan, master_after) = if with_plan {
        let plan = build_study_plan(&measurement, analyzer, master, control)?;
        let after = master_readability(master, &plan.known_after);
        (Some(plan), after)
    } else {
        (None, None)
    };

    Ok(Analysis {
        measurement,
        plan,
        master_before,
        master_after,
    })
}

//! Text reports of a readability run.

use super::plan::{PlannedMorph, StudyPlan};
use super::{Analysis, CorpusMeasurement, ReadabilityCounts};
use crate::config::ReadabilityConfig;
use crate::db::MorphDb;
use crate::error::{MorphError, Result};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const READABILITY_FILE: &str = "readability.tsv";
pub const STUDY_PLAN_FILE: &str = "study_plan.txt";
pub const WORD_REPORT_FILE: &str = "word_freq_report.txt";
pub const FREQUENCY_FILE: &str = "frequency.txt";

const TABLE_HEADER: &str = "Input\tTotal Morphs\tKnown Morphs\t% Known Morphs\tTotal Instances\t\
                            Known Instances\t% Readability\t% Proper Nouns\t% Known Lines\t% i+1 Lines";

pub fn write_readability_table<W: Write>(out: &mut W, corpus: &CorpusMeasurement) -> io::Result<()> {
    writeln!(out, "{}", TABLE_HEADER)?;
    for source in &corpus.sources {
        write_row(out, &source.counts)?;
    }
    write_row(out, &corpus.totals)
}

fn write_row<W: Write>(out: &mut W, c: &ReadabilityCounts) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{:.2}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
        c.name,
        c.total_morphs,
        c.known_morphs,
        c.known_morph_percent(),
        c.instances,
        c.known_instances,
        c.readability(),
        c.proper_noun_percent(),
        c.line_readability(),
        c.iplus1_percent()
    )
}

fn breakdown(p: &PlannedMorph) -> String {
    format!(
        "[score {:.0} ep_freq {} all_freq {} master_freq {}]",
        p.score, p.source_count, p.corpus_count, p.master_count
    )
}

pub fn write_study_plan<W: Write>(out: &mut W, plan: &StudyPlan) -> io::Result<()> {
    for source in &plan.sources {
        writeln!(
            out,
            "'{}' study goal: ({:3}/{:4}) morph readability: {:.2} -> {:.2} line readability: {:.2} -> {:.2}",
            source.name,
            source.learned.len(),
            source.cumulative,
            source.readability_before,
            source.readability_after,
            source.line_readability_before,
            source.line_readability_after
        )?;
        for p in &source.learned {
            writeln!(out, "\t{}\t{}", p.morpheme.show(), breakdown(p))?;
        }
    }
    Ok(())
}

/// Every corpus morpheme by descending count.
///
/// Columns: count, norm, base, reading, pos, sub-pos, count rank, overall
/// rank, share %, cumulative %, known.
pub fn write_word_report<W: Write>(
    out: &mut W,
    corpus: &CorpusMeasurement,
    known: &MorphDb,
) -> io::Result<()> {
    let mut entries: Vec<_> = corpus.all_morphs.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    let total = corpus.all_morphs.total();

    let mut last_count = 0;
    let mut group = 0;
    let mut cumulative = 0.0;
    for (index, (m, count)) in entries.into_iter().enumerate() {
        if *count != last_count {
            last_count = *count;
            group += 1;
        }
        let share = super::percent(*count, total);
        cumulative += share;
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.8}\t{:.8}\t{}",
            count,
            m.norm,
            m.base,
            m.read,
            m.pos,
            m.sub_pos,
            group,
            index + 1,
            share,
            cumulative,
            u8::from(known.matches(m))
        )?;
    }
    Ok(())
}

/// Vocabulary list readable as a frequency list: base form first.
pub fn write_frequency_list<W: Write>(out: &mut W, entries: &[&PlannedMorph]) -> io::Result<()> {
    for p in entries {
        writeln!(out, "{}\t{}", p.morpheme.base, breakdown(p))?;
    }
    Ok(())
}

/// Create `path` and hand a buffered writer to `write`.
pub fn save_report<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> io::Result<()>,
{
    let file = fs::File::create(path).map_err(|e| MorphError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|_| out.flush())
        .map_err(|e| MorphError::io(path, e))
}

/// Files written by [`write_reports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPaths {
    pub readability: PathBuf,
    pub word_report: PathBuf,
    pub study_plan: Option<PathBuf>,
    pub frequency: Option<PathBuf>,
}

/// Write every report of `analysis` into `dir`.
pub fn write_reports(
    dir: &Path,
    analysis: &Analysis,
    known: &MorphDb,
    config: &ReadabilityConfig,
) -> Result<ReportPaths> {
    fs::create_dir_all(dir).map_err(|e| MorphError::io(dir, e))?;

    let mut paths = ReportPaths {
        readability: dir.join(READABILITY_FILE),
        word_report: dir.join(WORD_REPORT_FILE),
        ..Default::default()
    };
    save_report(&paths.readability, |w| {
        write_readability_table(w, &analysis.measurement)
    })?;
    save_report(&paths.word_report, |w| {
        write_word_report(w, &analysis.measurement, known)
    })?;

    if let Some(plan) = &analysis.plan {
        let plan_path = dir.join(STUDY_PLAN_FILE);
        save_report(&plan_path, |w| {
            write_study_plan(w, plan)?;
            if let (Some(before), Some(after)) = (analysis.master_before, analysis.master_after) {
                writeln!(w, "master frequency readability: {:.2} -> {:.2}", before, after)?;
            }
            Ok(())
        })?;
        let freq_path = dir.join(FREQUENCY_FILE);
        save_report(&freq_path, |w| {
            write_frequency_list(w, &plan.vocabulary(config))
        })?;
        paths.study_plan = Some(plan_path);
        paths.frequency = Some(freq_path);
    }

    info!(dir = %dir.display(), "Reports written");
    Ok(paths)
}

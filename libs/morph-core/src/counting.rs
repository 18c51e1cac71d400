//! Occurrence-count tables keyed by morpheme group.
//!
//! Used wherever a plain count per morpheme is enough: corpus-wide unknown
//! counts, per-source unknown counts and the master frequency table.

use crate::db::MorphDb;
use crate::error::{MorphError, Result};
use crate::text::strip_bom;
use crate::types::{GroupKey, Morpheme};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    count: u64,
    /// Already matched against a known database; skipped by fuzzy counts.
    marked: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CountingDb {
    groups: HashMap<GroupKey, HashMap<Morpheme, Tally>>,
}

impl CountingDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_morph(&mut self, morpheme: &Morpheme, count: u64) {
        self.groups
            .entry(morpheme.group_key())
            .or_default()
            .entry(morpheme.clone())
            .or_default()
            .count += count;
    }

    /// Number of distinct groups.
    pub fn total_norms(&self) -> usize {
        self.groups.len()
    }

    /// Number of distinct morphemes across all groups.
    pub fn total_variations(&self) -> usize {
        self.groups.values().map(HashMap::len).sum()
    }

    /// Sum of all counts.
    pub fn total_instances(&self) -> u64 {
        self.groups
            .values()
            .flat_map(HashMap::values)
            .map(|t| t.count)
            .sum()
    }

    pub fn count(&self, morpheme: &Morpheme) -> u64 {
        self.groups
            .get(&morpheme.group_key())
            .and_then(|g| g.get(morpheme))
            .map_or(0, |t| t.count)
    }

    /// Counts of unmarked group-mates that include `morpheme` and that
    /// `exclude` does not match.
    pub fn fuzzy_count(&self, morpheme: &Morpheme, exclude: &MorphDb) -> u64 {
        let Some(group) = self.groups.get(&morpheme.group_key()) else {
            return 0;
        };
        group
            .iter()
            .filter(|(_, t)| !t.marked)
            .filter(|(alt, _)| !exclude.matches(alt))
            .filter(|(alt, _)| alt.includes(morpheme))
            .map(|(_, t)| t.count)
            .sum()
    }

    /// Mark every entry `known` matches and return the summed count of all
    /// matching entries, marked before or not.
    pub fn mark_matched(&mut self, known: &MorphDb) -> u64 {
        let mut score = 0;
        for (morpheme, tally) in self.groups.values_mut().flat_map(|g| g.iter_mut()) {
            if known.matches(morpheme) {
                score += tally.count;
                tally.marked = true;
            }
        }
        score
    }

    /// Load a master frequency table: `count\tnorm\tbase\treading\tpos\tsubPos` per line.
    ///
    /// A missing file is an empty table. Lines that do not parse are skipped.
    pub fn load_master(path: &Path) -> Result<CountingDb> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Master frequency file not found");
                return Ok(CountingDb::new());
            }
            Err(e) => return Err(MorphError::io(path, e)),
        };

        let mut db = CountingDb::new();
        let mut skipped = 0usize;
        for line in strip_bom(&text).lines() {
            match parse_master_line(line) {
                Some((morpheme, count)) => db.add_morph(&morpheme, count),
                None => skipped += 1,
            }
        }
        info!(
            norms = db.total_norms(),
            variations = db.total_variations(),
            skipped,
            "Master morphs loaded"
        );
        Ok(db)
    }
}

fn parse_master_line(line: &str) -> Option<(Morpheme, u64)> {
    let cols: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if cols.len() < 6 {
        debug!(line, "Short master frequency line");
        return None;
    }
    let count = cols[0].trim().parse::<u64>().ok()?;
    let morpheme = Morpheme::new(cols[1], cols[2], cols[2], cols[3], cols[4], cols[5]);
    Some((morpheme, count))
}

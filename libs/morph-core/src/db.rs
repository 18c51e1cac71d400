//! Morpheme database: morpheme -> set of locations, with derived indices.
//!
//! Two indices are kept in step with the primary map on every mutation:
//! - group key -> morphemes in that group, for fuzzy matching
//! - location key -> (location, morphemes observed there), for incremental rebuilds

use crate::error::{MorphError, Result};
use crate::types::{GroupKey, Location, LocationKey, Morpheme};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub type LocationSet = HashSet<Arc<Location>>;

/// How [`MorphDb::load`] treats records it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Fail on the first malformed record.
    Strict,
    /// Log and skip malformed records.
    Lenient,
}

/// One line of the database file.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    morpheme: Morpheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<Location>,
}

#[derive(Debug, Clone, Default)]
pub struct MorphDb {
    db: HashMap<Morpheme, LocationSet>,
    groups: HashMap<GroupKey, HashSet<Morpheme>>,
    locations: HashMap<LocationKey, (Arc<Location>, HashSet<Morpheme>)>,
}

impl MorphDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct morphemes.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Number of distinct locations.
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn morphemes(&self) -> impl Iterator<Item = &Morpheme> {
        self.db.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Morpheme, &LocationSet)> {
        self.db.iter()
    }

    pub fn locations_of(&self, morpheme: &Morpheme) -> Option<&LocationSet> {
        self.db.get(morpheme)
    }

    pub fn location(&self, key: &LocationKey) -> Option<&Arc<Location>> {
        self.locations.get(key).map(|(loc, _)| loc)
    }

    /// Morphemes recorded at one location.
    pub fn morphemes_at(&self, key: &LocationKey) -> Option<&HashSet<Morpheme>> {
        self.locations.get(key).map(|(_, ms)| ms)
    }

    pub fn location_keys(&self) -> impl Iterator<Item = &LocationKey> {
        self.locations.keys()
    }

    /// Record that `morpheme` occurs at `location`. Adding the same pair twice is a no-op.
    ///
    /// A location already present under the same key is reused; replace a location
    /// whose payload changed with [`remove_location`](Self::remove_location) first.
    pub fn add(&mut self, morpheme: Morpheme, location: Arc<Location>) -> bool {
        let (shared, at) = self
            .locations
            .entry(location.key.clone())
            .or_insert_with(|| (location, HashSet::new()));
        let shared = Arc::clone(shared);
        at.insert(morpheme.clone());

        self.groups
            .entry(morpheme.group_key())
            .or_default()
            .insert(morpheme.clone());
        self.db.entry(morpheme).or_default().insert(shared)
    }

    /// Union in a batch of `morpheme -> locations` entries.
    pub fn add_all<I, L>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Morpheme, L)>,
        L: IntoIterator<Item = Arc<Location>>,
    {
        for (morpheme, locations) in entries {
            for location in locations {
                self.add(morpheme.clone(), location);
            }
        }
    }

    /// Record every morpheme of one location.
    pub fn add_location<I>(&mut self, location: Arc<Location>, morphemes: I)
    where
        I: IntoIterator<Item = Morpheme>,
    {
        for morpheme in morphemes {
            self.add(morpheme, Arc::clone(&location));
        }
    }

    /// Mark a morpheme as present without any location.
    ///
    /// Such entries match queries but contribute nothing to frequencies and
    /// never survive [`filter_by_maturity`](Self::filter_by_maturity).
    pub fn insert_known(&mut self, morpheme: Morpheme) {
        self.groups
            .entry(morpheme.group_key())
            .or_default()
            .insert(morpheme.clone());
        self.db.entry(morpheme).or_default();
    }

    /// Drop a location and every association through it.
    ///
    /// Morphemes left without any location are removed entirely.
    pub fn remove_location(&mut self, key: &LocationKey) -> Option<(Arc<Location>, HashSet<Morpheme>)> {
        let (location, morphemes) = self.locations.remove(key)?;
        for morpheme in &morphemes {
            let now_empty = match self.db.get_mut(morpheme) {
                Some(set) => {
                    set.remove(&location);
                    set.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.remove_morpheme(morpheme);
            }
        }
        Some((location, morphemes))
    }

    fn remove_morpheme(&mut self, morpheme: &Morpheme) {
        self.db.remove(morpheme);
        let key = morpheme.group_key();
        let group_empty = match self.groups.get_mut(&key) {
            Some(group) => {
                group.remove(morpheme);
                group.is_empty()
            }
            None => false,
        };
        if group_empty {
            self.groups.remove(&key);
        }
    }

    /// Union `other` into this database. `other` is left untouched.
    pub fn merge(&mut self, other: &MorphDb) {
        for (morpheme, locations) in &other.db {
            if locations.is_empty() {
                self.insert_known(morpheme.clone());
            }
            for location in locations {
                self.add(morpheme.clone(), Arc::clone(location));
            }
        }
    }

    /// New database holding only locations with maturity `>= threshold`.
    ///
    /// Locations are shared with `self`, the maps are not.
    pub fn filter_by_maturity(&self, threshold: f64) -> MorphDb {
        let mut out = MorphDb::new();
        for (location, morphemes) in self.locations.values() {
            if location.maturity() >= threshold {
                out.add_location(Arc::clone(location), morphemes.iter().cloned());
            }
        }
        out
    }

    /// Exact identity lookup.
    pub fn contains(&self, morpheme: &Morpheme) -> bool {
        self.db.contains_key(morpheme)
    }

    /// Present by identity, or some group-mate includes it.
    pub fn matches(&self, morpheme: &Morpheme) -> bool {
        self.matches_filtered(morpheme, None)
    }

    /// Like [`matches`](Self::matches), ignoring entries that `exclude` holds exactly.
    pub fn matches_except(&self, morpheme: &Morpheme, exclude: &MorphDb) -> bool {
        self.matches_filtered(morpheme, Some(exclude))
    }

    fn matches_filtered(&self, morpheme: &Morpheme, exclude: Option<&MorphDb>) -> bool {
        let excluded = |m: &Morpheme| exclude.is_some_and(|x| x.contains(m));
        if self.db.contains_key(morpheme) && !excluded(morpheme) {
            return true;
        }
        self.groups
            .get(&morpheme.group_key())
            .is_some_and(|group| group.iter().any(|m| !excluded(m) && m.includes(morpheme)))
    }

    /// Highest location maturity among all entries matching `morpheme`.
    pub fn matching_maturity(&self, morpheme: &Morpheme) -> Option<f64> {
        let mates = self
            .groups
            .get(&morpheme.group_key())
            .into_iter()
            .flatten()
            .filter(|m| m.includes(morpheme));
        std::iter::once(morpheme)
            .chain(mates)
            .filter_map(|m| self.db.get(m))
            .flatten()
            .map(|loc| loc.maturity())
            .reduce(f64::max)
    }

    /// Number of locations the exact morpheme was seen at.
    pub fn frequency(&self, morpheme: &Morpheme) -> usize {
        self.db.get(morpheme).map_or(0, HashSet::len)
    }

    /// Summed frequency of every group-mate that includes `morpheme` and that
    /// `exclude` does not match.
    pub fn fuzzy_count(&self, morpheme: &Morpheme, exclude: &MorphDb) -> usize {
        let Some(group) = self.groups.get(&morpheme.group_key()) else {
            return 0;
        };
        group
            .iter()
            .filter(|m| m.includes(morpheme) && !exclude.matches(m))
            .map(|m| self.frequency(m))
            .sum()
    }

    /// Write the whole database as JSON lines, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MorphError::io(parent, e))?;
        }
        let tmp = tmp_path(path);
        let file = fs::File::create(&tmp).map_err(|e| MorphError::io(&tmp, e))?;
        let mut out = BufWriter::new(file);

        let mut morphemes: Vec<&Morpheme> = self.db.keys().collect();
        morphemes.sort();
        for morpheme in morphemes {
            let mut locations: Vec<&Arc<Location>> = self.db[morpheme].iter().collect();
            locations.sort_by(|a, b| a.key.cmp(&b.key));
            if locations.is_empty() {
                write_record(&mut out, &tmp, morpheme, None)?;
            }
            for location in locations {
                write_record(&mut out, &tmp, morpheme, Some(location))?;
            }
        }
        out.flush().map_err(|e| MorphError::io(&tmp, e))?;
        drop(out);

        fs::rename(&tmp, path).map_err(|e| MorphError::io(path, e))?;
        debug!(path = %path.display(), morphemes = self.len(), "Saved morph db");
        Ok(())
    }

    /// Read a database written by [`save`](Self::save). A missing file is an empty database.
    pub fn load(path: &Path, mode: LoadMode) -> Result<MorphDb> {
        let file = match fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No morph db file, starting empty");
                return Ok(MorphDb::new());
            }
            Err(e) => return Err(MorphError::io(path, e)),
        };

        let mut db = MorphDb::new();
        let mut shared: HashMap<LocationKey, Arc<Location>> = HashMap::new();
        let mut skipped = 0usize;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| MorphError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) if mode == LoadMode::Lenient => {
                    warn!(path = %path.display(), line = idx + 1, error = %e, "Skipping malformed record");
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    return Err(MorphError::MalformedRecord {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        reason: e.to_string(),
                    })
                }
            };
            match record.location {
                Some(location) => {
                    let location = shared
                        .entry(location.key.clone())
                        .or_insert_with(|| Arc::new(location))
                        .clone();
                    db.add(record.morpheme, location);
                }
                None => db.insert_known(record.morpheme),
            }
        }

        debug!(
            path = %path.display(),
            morphemes = db.len(),
            skipped,
            "Loaded morph db"
        );
        Ok(db)
    }
}

fn write_record<W: Write>(
    out: &mut W,
    path: &Path,
    morpheme: &Morpheme,
    location: Option<&Arc<Location>>,
) -> Result<()> {
    let record = Record {
        morpheme: morpheme.clone(),
        location: location.map(|l| l.as_ref().clone()),
    };
    serde_json::to_writer(&mut *out, &record)?;
    out.write_all(b"\n").map_err(|e| MorphError::io(path, e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

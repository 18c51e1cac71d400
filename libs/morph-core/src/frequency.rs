//! Frequency-ranked word list: one word per line, most frequent first.

use crate::error::{MorphError, Result};
use crate::text::strip_bom;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct FrequencyList {
    ranks: HashMap<String, usize>,
    len: usize,
}

impl FrequencyList {
    /// Build from words in rank order. A repeated word keeps its last rank.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ranks = HashMap::new();
        let mut len = 0;
        for (rank, word) in words.into_iter().enumerate() {
            ranks.insert(word.into(), rank);
            len = rank + 1;
        }
        Self { ranks, len }
    }

    /// Load from a file whose first tab-separated column is the word.
    ///
    /// Rank is the zero-based position among non-blank lines. A missing file
    /// is an empty list.
    pub fn load(path: &Path) -> Result<FrequencyList> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Frequency list not found, ranking without it");
                return Ok(FrequencyList::default());
            }
            Err(e) => return Err(MorphError::io(path, e)),
        };
        let list = Self::from_words(
            strip_bom(&text)
                .lines()
                .map(|line| line.trim().split('\t').next().unwrap_or_default().trim())
                .filter(|word| !word.is_empty())
                .map(str::to_string),
        );
        debug!(path = %path.display(), words = list.len(), "Loaded frequency list");
        Ok(list)
    }

    /// Number of lines the list was built from.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn rank(&self, word: &str) -> Option<usize> {
        self.ranks.get(word).copied()
    }

    /// `round(multiplier * (1 - rank / len))`, or `None` for unlisted words.
    pub fn rank_bonus(&self, word: &str, multiplier: f64) -> Option<i64> {
        let rank = self.rank(word)?;
        let fraction = 1.0 - rank as f64 / self.len.max(1) as f64;
        Some((multiplier * fraction).round() as i64)
    }
}

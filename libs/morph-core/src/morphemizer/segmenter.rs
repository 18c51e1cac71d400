//! Morphemizer backed by an external word/POS segmenter.

use super::Morphemizer;
use crate::types::{pos, Morpheme};
use std::sync::Arc;

/// Black-box segmenter: text in, `(surface, pos)` pairs out.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<(String, String)>;
}

pub struct SegmenterMorphemizer {
    name: String,
    description: String,
    segmenter: Arc<dyn Segmenter>,
}

impl SegmenterMorphemizer {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            segmenter,
        }
    }
}

impl Morphemizer for SegmenterMorphemizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tokenize(&self, text: &str) -> Vec<Morpheme> {
        let cleaned: String = text.chars().filter(|c| !is_punctuation(*c)).collect();
        if cleaned.is_empty() {
            return Vec::new();
        }
        self.segmenter
            .segment(&cleaned)
            .into_iter()
            .filter(|(word, _)| !word.is_empty())
            .map(|(word, tag)| Morpheme::new(&word, &word, &word, &word, tag, pos::UNKNOWN))
            .collect()
    }
}

/// Whitespace plus ASCII, general and CJK punctuation.
fn is_punctuation(c: char) -> bool {
    if c.is_whitespace() || c.is_ascii_punctuation() {
        return true;
    }
    matches!(c as u32,
        0x2000..=0x206F
        | 0x3000..=0x3004
        | 0x3008..=0x3020
        | 0x3030
        | 0x303D
        | 0x30FB
        | 0xFF01..=0xFF0F
        | 0xFF1A..=0xFF20
        | 0xFF3B..=0xFF40
        | 0xFF5B..=0xFF65)
}

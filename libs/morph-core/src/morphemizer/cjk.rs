//! Character morphemizer for logographic scripts.

use super::Morphemizer;
use crate::types::{pos, Morpheme};
use std::ops::RangeInclusive;

/// Han ideographs, including extensions, compatibility forms and the
/// iteration/zero marks that behave like characters.
const HAN_RANGES: &[RangeInclusive<u32>] = &[
    0x2E80..=0x2EFF,
    0x2F00..=0x2FDF,
    0x3005..=0x3005,
    0x3007..=0x3007,
    0x3021..=0x3029,
    0x3038..=0x303B,
    0x3400..=0x4DBF,
    0x4E00..=0x9FFF,
    0xF900..=0xFAFF,
    0x20000..=0x2A6DF,
    0x2A700..=0x2EBEF,
    0x2F800..=0x2FA1F,
    0x30000..=0x3134F,
];

/// Membership test over a set of code point ranges.
#[derive(Debug, Clone)]
pub struct CharClass {
    ranges: Vec<RangeInclusive<u32>>,
}

impl CharClass {
    pub fn new(ranges: Vec<RangeInclusive<u32>>) -> Self {
        Self { ranges }
    }

    pub fn han() -> Self {
        Self::new(HAN_RANGES.to_vec())
    }

    pub fn contains(&self, c: char) -> bool {
        let cp = c as u32;
        self.ranges.iter().any(|r| r.contains(&cp))
    }
}

impl Default for CharClass {
    fn default() -> Self {
        Self::han()
    }
}

/// Splits text into single characters and keeps those inside the class.
#[derive(Debug, Clone, Default)]
pub struct CjkCharMorphemizer {
    class: CharClass,
}

impl CjkCharMorphemizer {
    pub fn new(class: CharClass) -> Self {
        Self { class }
    }
}

impl Morphemizer for CjkCharMorphemizer {
    fn name(&self) -> &str {
        "cjk_char"
    }

    fn description(&self) -> &str {
        "CJK characters"
    }

    fn tokenize(&self, text: &str) -> Vec<Morpheme> {
        let mut buf = [0u8; 4];
        text.chars()
            .filter(|c| self.class.contains(*c))
            .map(|c| Morpheme::uniform(c.encode_utf8(&mut buf), pos::CJK_CHAR))
            .collect()
    }
}

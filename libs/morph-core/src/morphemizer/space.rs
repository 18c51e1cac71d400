//! Whitespace morphemizer.
//!
//! General-purpose splitter for languages written with spaces. It cannot
//! recover base forms from inflections.

use super::Morphemizer;
use crate::types::{pos, Morpheme};
use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[^\s\d()]+\b").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceMorphemizer;

impl Morphemizer for SpaceMorphemizer {
    fn name(&self) -> &str {
        "space"
    }

    fn description(&self) -> &str {
        "Language w/ spaces"
    }

    fn tokenize(&self, text: &str) -> Vec<Morpheme> {
        WORD.find_iter(text)
            .map(|w| Morpheme::uniform(&w.as_str().to_lowercase(), pos::UNKNOWN))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bases(text: &str) -> Vec<String> {
        SpaceMorphemizer
            .tokenize(text)
            .into_iter()
            .map(|m| m.base)
            .collect()
    }

    #[test]
    fn splits_and_lowercases() {
        assert_eq!(bases("I have a cat."), vec!["i", "have", "a", "cat"]);
    }

    #[test]
    fn all_forms_equal_the_token() {
        let ms = SpaceMorphemizer.tokenize("Dog");
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].norm, "dog");
        assert_eq!(ms[0].inflected, "dog");
        assert_eq!(ms[0].read, "dog");
        assert_eq!(ms[0].pos, pos::UNKNOWN);
        assert_eq!(ms[0].sub_pos, pos::UNKNOWN);
    }

    #[test]
    fn isolated_digits_are_dropped() {
        assert_eq!(bases("room 101 is free"), vec!["room", "is", "free"]);
    }

    #[test]
    fn keeps_apostrophes_inside_words() {
        assert_eq!(bases("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(SpaceMorphemizer.tokenize("  ... ").is_empty());
    }
}

//! Morphemizers: turn raw text into morphemes.
//!
//! Variants are looked up by name through [`MorphemizerRegistry`]:
//! - `space`: split on word boundaries, lower-cased
//! - `cjk_char`: one morpheme per logographic character
//! - `enriched`, `enriched_<lang>`: normalizing splitter with base forms and word pairs
//! - any name registered with [`MorphemizerRegistry::register_segmenter`]

pub mod cjk;
pub mod enriched;
pub mod segmenter;
pub mod space;
pub mod tables;

use crate::error::{MorphError, Result};
use crate::text::{remove_bracket_contents, strip_html, BracketOptions};
use crate::types::Morpheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use cjk::{CharClass, CjkCharMorphemizer};
pub use enriched::EnrichedMorphemizer;
pub use segmenter::{Segmenter, SegmenterMorphemizer};
pub use space::SpaceMorphemizer;
pub use tables::LanguageTables;

/// Trait for tokenizers producing morphemes.
pub trait Morphemizer: Send + Sync {
    /// Registry identifier.
    fn name(&self) -> &str;

    /// One line naming the languages this morphemizer is meant for.
    fn description(&self) -> &str;

    /// Split `text` into morphemes. Never fails; unparseable text yields nothing.
    fn tokenize(&self, text: &str) -> Vec<Morpheme>;
}

/// Named collection of morphemizers.
#[derive(Clone, Default)]
pub struct MorphemizerRegistry {
    entries: BTreeMap<String, Arc<dyn Morphemizer>>,
}

impl MorphemizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in variant.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SpaceMorphemizer));
        registry.register(Arc::new(CjkCharMorphemizer::default()));
        registry.register(Arc::new(EnrichedMorphemizer::new(
            "enriched",
            "Language w/ spaces, base forms and word pairs, all languages",
            LanguageTables::all_languages(),
        )));
        for (code, label) in [
            ("en", "English"),
            ("de", "German"),
            ("es", "Spanish"),
            ("ru", "Russian"),
            ("eo", "Esperanto"),
        ] {
            if let Some(tables) = LanguageTables::for_language(code) {
                registry.register(Arc::new(EnrichedMorphemizer::new(
                    format!("enriched_{}", code),
                    format!("Language w/ spaces, base forms and word pairs, {}", label),
                    tables,
                )));
            }
        }
        registry
    }

    /// Add or replace a morphemizer under its own name.
    pub fn register(&mut self, morphemizer: Arc<dyn Morphemizer>) {
        self.entries
            .insert(morphemizer.name().to_string(), morphemizer);
    }

    /// Add a variant backed by an external word/POS segmenter.
    pub fn register_segmenter(
        &mut self,
        name: &str,
        description: &str,
        segmenter: Arc<dyn Segmenter>,
    ) {
        self.register(Arc::new(SegmenterMorphemizer::new(
            name,
            description,
            segmenter,
        )));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Morphemizer>> {
        self.entries.get(name).cloned()
    }

    /// Like [`get`](Self::get) but reports unknown names as an error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Morphemizer>> {
        self.get(name)
            .ok_or_else(|| MorphError::UnknownMorphemizer(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Per-item text handling applied before any morphemizer runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub brackets: BracketOptions,
    /// Items carrying any of these tags contribute no morphemes.
    pub skip_tags: Vec<String>,
}

/// Whether an item with these tags contributes no morphemes.
pub fn is_skipped(tags: &[String], options: &TextOptions) -> bool {
    tags.iter().any(|t| options.skip_tags.contains(t))
}

/// Morphemes of one field value of an item with the given tags.
pub fn extract_morphemes(
    morphemizer: &dyn Morphemizer,
    text: &str,
    tags: &[String],
    options: &TextOptions,
) -> Vec<Morpheme> {
    if is_skipped(tags, options) {
        return Vec::new();
    }
    let plain = strip_html(text);
    let plain = remove_bracket_contents(&plain, &options.brackets);
    morphemizer.tokenize(&plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = MorphemizerRegistry::with_defaults();
        let names: Vec<&str> = registry.names().collect();
        for expected in [
            "space",
            "cjk_char",
            "enriched",
            "enriched_en",
            "enriched_de",
            "enriched_es",
            "enriched_ru",
            "enriched_eo",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = MorphemizerRegistry::with_defaults();
        assert!(registry.get("nope").is_none());
        assert!(matches!(
            registry.require("nope"),
            Err(MorphError::UnknownMorphemizer(_))
        ));
    }

    #[test]
    fn skip_tags_yield_nothing() {
        let options = TextOptions {
            skip_tags: vec!["mm_skip".to_string()],
            ..Default::default()
        };
        let tags = vec!["mm_skip".to_string()];
        assert!(extract_morphemes(&SpaceMorphemizer, "a cat", &tags, &options).is_empty());
        assert_eq!(
            extract_morphemes(&SpaceMorphemizer, "a cat", &[], &options).len(),
            2
        );
    }

    #[test]
    fn markup_and_brackets_are_removed() {
        let options = TextOptions {
            brackets: BracketOptions {
                ignore_round: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let ms = extract_morphemes(
            &SpaceMorphemizer,
            "<b>hello</b> (aside) world",
            &[],
            &options,
        );
        let words: Vec<&str> = ms.iter().map(|m| m.base.as_str()).collect();
        assert_eq!(words, vec!["hello", "world"]);
    }
}

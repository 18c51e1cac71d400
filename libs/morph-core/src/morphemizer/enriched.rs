//! Normalizing splitter for languages written with spaces.
//!
//! On top of plain splitting it maps inflected forms to base forms through
//! small per-language tables, drops stop-forms and emits a pseudo-morpheme
//! for every adjacent pair of surviving words.

use super::tables::LanguageTables;
use super::Morphemizer;
use crate::types::{pos, Morpheme};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::warn;

/// Nested cloze deletions are unwrapped at most this many levels deep.
const CLOZE_PASSES: usize = 5;

/// Characters trimmed from both ends of every token.
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '+', '-', '*', '×', '/', '—', '−', ' ', '\'', '"',
];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static CLOZE_WITH_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c\d+::([^{}]*?)::([^{}]*?)\}\}").unwrap());
static CLOZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{c\d+::([^{}]*?)\}\}").unwrap());
static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"::|[:{}]").unwrap());
static LONG_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.? (?P<day>\d{1,2})(?:st|nd|rd|th)?, (?P<year>\d{4})\b",
    )
    .unwrap()
});
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<pre>^|[^\w])(?P<year>1\d{3})-(?P<month>0[1-9]|1[0-2])-(?P<day>\d{1,2})\b")
        .unwrap()
});
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[^\s«»"]+"#).unwrap());
static CLOZE_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^c\d{1,2}$").unwrap());

pub struct EnrichedMorphemizer {
    name: String,
    description: String,
    tables: LanguageTables,
    /// Endings sorted longest first so the longest known suffix wins.
    endings: Vec<(String, String)>,
    idioms: Vec<(Regex, String)>,
}

impl EnrichedMorphemizer {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        tables: LanguageTables,
    ) -> Self {
        let name = name.into();
        let mut endings: Vec<(String, String)> = tables
            .endings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        endings.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(&b.0))
        });

        let idioms = tables
            .idioms
            .iter()
            .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
                Ok(re) => Some((re, replacement.clone())),
                Err(e) => {
                    warn!(morphemizer = %name, pattern = %pattern, error = %e, "Skipping idiom rule");
                    None
                }
            })
            .collect();

        Self {
            name,
            description: description.into(),
            tables,
            endings,
            idioms,
        }
    }

    pub fn tables(&self) -> &LanguageTables {
        &self.tables
    }

    /// Lower-case, unwrap markup and glue idioms; the text is ready to split.
    fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase().replace('ſ', "s");
        let mut e = URL.replace_all(&lowered, " ").into_owned();

        for _ in 0..CLOZE_PASSES {
            if !e.contains("{{") {
                break;
            }
            let next = {
                let hinted = CLOZE_WITH_HINT.replace_all(&e, " $1 $2 ");
                CLOZE.replace_all(&hinted, " $1 ").into_owned()
            };
            if next == e {
                break;
            }
            e = next;
        }
        let e = SEPARATORS.replace_all(&e, " ");

        let e = LONG_DATE.replace_all(&e, "$day $month $year");
        let mut e = ISO_DATE
            .replace_all(&e, |caps: &Captures| {
                let month = caps["month"].parse::<usize>().unwrap_or(1);
                format!(
                    "{}{} {} {}",
                    &caps["pre"],
                    &caps["day"],
                    MONTHS[month.clamp(1, 12) - 1],
                    &caps["year"]
                )
            })
            .into_owned();

        for (re, replacement) in &self.idioms {
            e = re.replace_all(&e, replacement.as_str()).into_owned();
        }
        e
    }

    /// Base form via the whole-word table, else the longest known suffix.
    fn base_form(&self, word: &str) -> String {
        if let Some(base) = self.tables.fullword.get(word) {
            return base.clone();
        }
        let len = word.chars().count();
        for (ending, replacement) in &self.endings {
            let ending_len = ending.chars().count();
            if len >= ending_len + self.tables.min_stem_len && word.ends_with(ending.as_str()) {
                let stem = &word[..word.len() - ending.len()];
                return format!("{}{}", stem, replacement);
            }
        }
        word.to_string()
    }

    fn translate(&self, word: String) -> String {
        match self.tables.translations.get(&word) {
            Some(t) => t.clone(),
            None => word,
        }
    }

    fn excluded_as_single(&self, word: &str) -> bool {
        self.tables.single_case_sensitive.contains(word)
            || self
                .tables
                .single_case_insensitive
                .contains(&word.to_lowercase())
    }
}

impl Morphemizer for EnrichedMorphemizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tokenize(&self, text: &str) -> Vec<Morpheme> {
        let normalized = self.normalize(text);

        let words: Vec<String> = TOKEN
            .find_iter(&normalized)
            .map(|m| m.as_str().trim_matches(EDGE_PUNCTUATION))
            .filter(|w| !w.is_empty())
            .filter(|w| !CLOZE_MARK.is_match(w) && *w != "[...]" && *w != "...")
            .map(|w| self.base_form(w))
            .filter(|b| !self.tables.never_usable.contains(b))
            .map(|b| self.translate(b))
            .collect();

        let pairs = words.windows(2).map(|pair| {
            let joined = format!("{} {}", pair[0], pair[1]);
            Morpheme::new(
                joined.clone(),
                joined.clone(),
                joined.clone(),
                joined,
                pos::PAIR,
                pos::UNKNOWN,
            )
        });

        let mut out: Vec<Morpheme> = words
            .iter()
            .filter(|w| !self.excluded_as_single(w))
            .map(|w| Morpheme::uniform(w, pos::UNKNOWN))
            .collect();
        out.extend(pairs);
        out
    }
}

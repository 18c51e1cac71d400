//! Per-language substitution and exclusion tables for the enriched morphemizer.

use std::collections::{HashMap, HashSet};

/// Tokens dropped everywhere, even as half of a word pair.
const NEVER_USABLE: &[&str] = &["-", "–", "—", "&", "+", "=", "|", "/", "*", "→", "•", "·"];

/// Phrase gluing applied before splitting, as `(pattern, replacement)`.
const ENGLISH_IDIOMS: &[(&str, &str)] = &[
    (r"\b(of|on|with|off|from|in|at|to) (the|a|an) ", "${1}_${2} "),
    (r"\b(the|a|an) ", "${1}_"),
    (r"\byou can\b", "you_can"),
    (r"\bi have\b", "i_have"),
    (r"\byou all\b", "you_all"),
    (r"\bbe ", "be_"),
];

const EN_FULLWORD: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
    ("been", "be"), ("being", "be"), ("has", "have"), ("had", "have"),
    ("having", "have"), ("does", "do"), ("did", "do"), ("done", "do"),
    ("goes", "go"), ("went", "go"), ("gone", "go"), ("said", "say"),
    ("made", "make"), ("making", "make"), ("took", "take"), ("taken", "take"),
    ("came", "come"), ("coming", "come"), ("saw", "see"), ("seen", "see"),
    ("knew", "know"), ("known", "know"), ("got", "get"), ("gotten", "get"),
    ("gave", "give"), ("given", "give"), ("found", "find"), ("thought", "think"),
    ("told", "tell"), ("felt", "feel"), ("left", "leave"), ("kept", "keep"),
    ("began", "begin"), ("begun", "begin"), ("brought", "bring"),
    ("wrote", "write"), ("written", "write"), ("ran", "run"), ("running", "run"),
    ("sitting", "sit"), ("sat", "sit"), ("men", "man"), ("women", "woman"),
    ("children", "child"), ("people", "person"), ("feet", "foot"),
    ("teeth", "tooth"), ("mice", "mouse"), ("better", "good"), ("best", "good"),
    ("worse", "bad"), ("worst", "bad"),
    // words the suffix table would otherwise damage
    ("this", "this"), ("his", "his"), ("its", "its"), ("us", "us"), ("yes", "yes"),
    ("as", "as"), ("always", "always"), ("perhaps", "perhaps"), ("news", "news"),
    ("series", "series"), ("species", "species"), ("thus", "thus"), ("bus", "bus"),
    ("gas", "gas"), ("plus", "plus"), ("lens", "lens"), ("physics", "physics"),
    ("string", "string"), ("spring", "spring"), ("nothing", "nothing"),
    ("something", "something"), ("anything", "anything"),
    ("everything", "everything"), ("morning", "morning"), ("evening", "evening"),
    ("during", "during"), ("ceiling", "ceiling"), ("building", "building"),
    ("need", "need"), ("speed", "speed"), ("feed", "feed"), ("seed", "seed"),
    ("indeed", "indeed"), ("hundred", "hundred"),
];

const EN_ENDINGS: &[(&str, &str)] = &[
    ("ies", "y"), ("ied", "y"), ("iest", "y"), ("ier", "y"), ("sses", "ss"),
    ("ss", "ss"), ("us", "us"), ("is", "is"), ("ches", "ch"), ("shes", "sh"),
    ("xes", "x"), ("'s", ""), ("s", ""), ("ing", ""), ("ed", ""),
];

const EN_STOP: &[&str] = &[
    "s", "t", "d", "ll", "re", "ve", "m", "the", "a", "an", "of", "to", "and", "or",
];

const DE_FULLWORD: &[(&str, &str)] = &[
    ("bist", "sein"), ("ist", "sein"), ("sind", "sein"), ("seid", "sein"),
    ("waren", "sein"), ("gewesen", "sein"), ("habe", "haben"), ("hast", "haben"),
    ("hatte", "haben"), ("gehabt", "haben"), ("wird", "werden"),
    ("wurde", "werden"), ("geworden", "werden"), ("kann", "können"),
    ("konnte", "können"), ("muss", "müssen"), ("ging", "gehen"),
    ("gegangen", "gehen"), ("gekommen", "kommen"), ("sah", "sehen"),
    ("gesehen", "sehen"), ("das", "der"), ("dem", "der"), ("eine", "ein"),
    ("einen", "ein"), ("einem", "ein"), ("einer", "ein"), ("eines", "ein"),
    ("hunde", "hund"), ("katzen", "katze"), ("häuser", "haus"),
];

const DE_ENDINGS: &[(&str, &str)] = &[
    ("ungen", "ung"), ("heiten", "heit"), ("keiten", "keit"), ("innen", "in"),
    ("schaften", "schaft"), ("nisse", "nis"),
];

const DE_STOP: &[&str] = &["und", "oder", "der", "ein", "zu", "s"];

const DE_TRANSLATIONS: &[(&str, &str)] = &[
    ("sein", "be"), ("haben", "have"), ("werden", "become"), ("hund", "dog"),
    ("katze", "cat"), ("haus", "house"), ("wasser", "water"),
];

const ES_FULLWORD: &[(&str, &str)] = &[
    ("es", "ser"), ("soy", "ser"), ("eres", "ser"), ("somos", "ser"),
    ("fue", "ser"), ("está", "estar"), ("estoy", "estar"), ("están", "estar"),
    ("tiene", "tener"), ("tengo", "tener"), ("tienen", "tener"), ("hay", "haber"),
    ("voy", "ir"), ("la", "el"),
    ("los", "el"), ("las", "el"), ("una", "un"), ("unos", "un"), ("unas", "un"),
];

const ES_ENDINGS: &[(&str, &str)] = &[
    ("ciones", "ción"), ("siones", "sión"), ("ces", "z"), ("os", "o"), ("as", "a"),
];

const ES_STOP: &[&str] = &["y", "o", "de", "el", "un", "que", "a"];

const ES_TRANSLATIONS: &[(&str, &str)] = &[
    ("ser", "be"), ("estar", "be"), ("tener", "have"), ("haber", "have"),
    ("ir", "go"), ("gato", "cat"), ("perro", "dog"), ("casa", "house"),
    ("agua", "water"),
];

const RU_FULLWORD: &[(&str, &str)] = &[
    ("был", "быть"), ("была", "быть"), ("было", "быть"), ("были", "быть"),
    ("есть", "быть"), ("буду", "быть"), ("будет", "быть"), ("меня", "я"),
    ("мне", "я"), ("мной", "я"), ("тебя", "ты"), ("тебе", "ты"), ("его", "он"),
    ("ему", "он"), ("её", "она"), ("ее", "она"), ("ей", "она"), ("нас", "мы"),
    ("нам", "мы"), ("их", "они"),
];

const RU_ENDINGS: &[(&str, &str)] = &[
    ("ого", "ый"), ("ому", "ый"), ("ыми", "ый"), ("ая", "ый"), ("ое", "ый"),
    ("ые", "ый"), ("ями", "я"),
];

const RU_STOP: &[&str] = &["и", "в", "не", "на", "с", "а", "но"];

const RU_TRANSLATIONS: &[(&str, &str)] = &[
    ("быть", "be"), ("я", "i"), ("кот", "cat"), ("кошка", "cat"),
    ("собака", "dog"), ("дом", "house"), ("вода", "water"),
];

const EO_FULLWORD: &[(&str, &str)] = &[("la", "la"), ("kaj", "kaj")];

const EO_ENDINGS: &[(&str, &str)] = &[
    ("ojn", "o"), ("ajn", "a"), ("oj", "o"), ("aj", "a"), ("on", "o"), ("an", "a"),
    ("as", "i"), ("is", "i"), ("os", "i"), ("us", "i"),
];

const EO_STOP: &[&str] = &["la", "kaj", "de", "en", "al"];

const EO_TRANSLATIONS: &[(&str, &str)] = &[
    ("esti", "be"), ("havi", "have"), ("kato", "cat"), ("hundo", "dog"),
    ("domo", "house"), ("akvo", "water"),
];

/// Immutable tables for one language (or a merge of several).
#[derive(Debug, Clone, Default)]
pub struct LanguageTables {
    pub code: String,
    /// Exact inflected form -> base form.
    pub fullword: HashMap<String, String>,
    /// Suffix -> replacement suffix.
    pub endings: HashMap<String, String>,
    /// Stems shorter than this (in characters) are left alone.
    pub min_stem_len: usize,
    /// Base forms dropped even as half of a pair.
    pub never_usable: HashSet<String>,
    /// Base forms dropped as single words, compared lower-cased.
    pub single_case_insensitive: HashSet<String>,
    /// Base forms dropped as single words, compared exactly.
    pub single_case_sensitive: HashSet<String>,
    /// Base form -> canonical equivalent.
    pub translations: HashMap<String, String>,
    /// `(regex, replacement)` phrase gluing rules.
    pub idioms: Vec<(String, String)>,
}

impl LanguageTables {
    pub fn for_language(code: &str) -> Option<Self> {
        let tables = match code {
            "en" => Self::build("en", EN_FULLWORD, EN_ENDINGS, EN_STOP, &[], ENGLISH_IDIOMS, 3),
            "de" => Self::build("de", DE_FULLWORD, DE_ENDINGS, DE_STOP, DE_TRANSLATIONS, &[], 3),
            "es" => Self::build("es", ES_FULLWORD, ES_ENDINGS, ES_STOP, ES_TRANSLATIONS, &[], 3),
            "ru" => Self::build("ru", RU_FULLWORD, RU_ENDINGS, RU_STOP, RU_TRANSLATIONS, &[], 3),
            "eo" => Self::build("eo", EO_FULLWORD, EO_ENDINGS, EO_STOP, EO_TRANSLATIONS, &[], 2),
            _ => return None,
        };
        Some(tables)
    }

    /// All languages merged; the first language to define an entry wins.
    ///
    /// Esperanto endings are left out: they are productive enough to damage
    /// words of every other language.
    pub fn all_languages() -> Self {
        let mut total = Self {
            code: "all".to_string(),
            min_stem_len: 3,
            ..Default::default()
        };
        for code in ["en", "de", "es", "ru", "eo"] {
            if let Some(t) = Self::for_language(code) {
                total.absorb(t, code != "eo");
            }
        }
        total
    }

    fn absorb(&mut self, other: LanguageTables, with_endings: bool) {
        for (k, v) in other.fullword {
            self.fullword.entry(k).or_insert(v);
        }
        if with_endings {
            for (k, v) in other.endings {
                self.endings.entry(k).or_insert(v);
            }
        }
        for (k, v) in other.translations {
            self.translations.entry(k).or_insert(v);
        }
        self.never_usable.extend(other.never_usable);
        self.single_case_insensitive
            .extend(other.single_case_insensitive);
        self.single_case_sensitive.extend(other.single_case_sensitive);
        for idiom in other.idioms {
            if !self.idioms.contains(&idiom) {
                self.idioms.push(idiom);
            }
        }
    }

    fn build(
        code: &str,
        fullword: &[(&str, &str)],
        endings: &[(&str, &str)],
        stop: &[&str],
        translations: &[(&str, &str)],
        idioms: &[(&str, &str)],
        min_stem_len: usize,
    ) -> Self {
        Self {
            code: code.to_string(),
            fullword: to_map(fullword),
            endings: to_map(endings),
            min_stem_len,
            never_usable: NEVER_USABLE.iter().map(|s| s.to_string()).collect(),
            single_case_insensitive: stop.iter().map(|s| s.to_lowercase()).collect(),
            single_case_sensitive: HashSet::new(),
            translations: to_map(translations),
            idioms: idioms
                .iter()
                .map(|(p, r)| (p.to_string(), r.to_string()))
                .collect(),
        }
    }
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_load() {
        for code in ["en", "de", "es", "ru", "eo"] {
            let t = LanguageTables::for_language(code).unwrap();
            assert_eq!(t.code, code);
            assert!(!t.endings.is_empty());
        }
        assert!(LanguageTables::for_language("xx").is_none());
    }

    #[test]
    fn merged_tables_keep_every_language() {
        let all = LanguageTables::all_languages();
        assert_eq!(all.fullword.get("went").map(String::as_str), Some("go"));
        assert_eq!(all.fullword.get("ist").map(String::as_str), Some("sein"));
        assert_eq!(all.translations.get("katze").map(String::as_str), Some("cat"));
        assert!(all.single_case_insensitive.contains("und"));
        assert!(!all.endings.contains_key("ojn"));
        assert_eq!(all.idioms.len(), ENGLISH_IDIOMS.len());
    }
}

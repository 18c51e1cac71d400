//! Text clean-up shared by the morphemizer front-end and the corpus reader.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style.*?>.*?</style>|<script.*?>.*?</script>").unwrap());
static ROUND_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static SQUARE_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static FULLWIDTH_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"（[^）]*）").unwrap());

/// Remove markup, leaving the plain text of a field.
pub fn strip_html(text: &str) -> String {
    let text = HTML_COMMENT.replace_all(text, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Which bracketed spans are ignored before tokenizing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketOptions {
    pub ignore_round: bool,
    pub ignore_square: bool,
    pub ignore_fullwidth_round: bool,
}

/// Drop the contents of the bracket kinds enabled in `options`.
pub fn remove_bracket_contents(text: &str, options: &BracketOptions) -> String {
    let mut out = text.to_string();
    if options.ignore_round {
        out = ROUND_BRACKETS.replace_all(&out, "").into_owned();
    }
    if options.ignore_square {
        out = SQUARE_BRACKETS.replace_all(&out, "").into_owned();
    }
    if options.ignore_fullwidth_round {
        out = FULLWIDTH_BRACKETS.replace_all(&out, "").into_owned();
    }
    out
}

/// Compare two names the way a human sorts them: digit runs compare numerically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u128),
    Text(String),
}

fn natural_key(s: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut digits = String::new();
    let mut text = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !text.is_empty() {
                chunks.push(Chunk::Text(std::mem::take(&mut text)));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                chunks.push(number_chunk(&std::mem::take(&mut digits)));
            }
            text.push(c);
        }
    }
    if !digits.is_empty() {
        chunks.push(number_chunk(&digits));
    }
    if !text.is_empty() {
        chunks.push(Chunk::Text(text));
    }
    chunks
}

fn number_chunk(digits: &str) -> Chunk {
    digits
        .parse::<u128>()
        .map(Chunk::Number)
        .unwrap_or_else(|_| Chunk::Text(digits.to_string()))
}

/// Strip a leading UTF-8 byte-order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

//! Test fixtures and factory functions for items, databases and corpora.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use morph_core::types::pos;
use morph_core::{ItemRecord, Location, LocationKey, MorphDb, Morpheme};

/// Write-back fields every fixture item carries.
pub const MORPH_FIELDS: [&str; 8] = [
    "Morph_FocusMorph",
    "Morph_FocusMorphPos",
    "Morph_UnknownCount",
    "Morph_UnmatureCount",
    "Morph_Index",
    "Morph_Unknowns",
    "Morph_Unmatures",
    "Morph_UnknownFreq",
];

/// A `Basic` item with an `Expression` field and empty write-back fields.
///
/// # Arguments
/// * `id` - Item id, also used to derive the guid
/// * `text` - Expression text
/// * `maturity` - Interval of the item's single card
pub fn item(id: i64, text: &str, maturity: f64) -> ItemRecord {
    let mut fields = vec![("Expression".to_string(), text.to_string())];
    fields.extend(MORPH_FIELDS.iter().map(|f| (f.to_string(), String::new())));
    ItemRecord {
        id,
        guid: format!("guid-{}", id),
        category: "Basic".to_string(),
        fields,
        tags: Vec::new(),
        maturities: vec![maturity],
    }
}

pub fn word(w: &str) -> Morpheme {
    Morpheme::uniform(w, pos::UNKNOWN)
}

pub fn location(id: i64, maturity: f64) -> Arc<Location> {
    let key = LocationKey {
        item_id: id,
        guid: format!("guid-{}", id),
        field: "Expression".to_string(),
    };
    Arc::new(Location::new(key, String::new(), vec![maturity]))
}

static NEXT_LOCATION: AtomicI64 = AtomicI64::new(1000);

/// Database holding each word at its own location with the given maturity.
///
/// Locations never collide across calls, so merged fixtures stay distinct.
pub fn db_of(entries: &[(&str, f64)]) -> MorphDb {
    let mut db = MorphDb::new();
    for (w, maturity) in entries {
        let id = NEXT_LOCATION.fetch_add(1, Ordering::Relaxed);
        db.add(word(w), location(id, *maturity));
    }
    db
}

/// Write corpus files under `dir`.
pub fn write_corpus(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:02,000
I have a cat.

2
00:00:03,000 --> 00:00:04,000
The cat has a hat.
";

pub const SAMPLE_ASS: &str = "[Script Info]
Title: sample

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,I see a dog
Dialogue: 0,0:00:03.00,0:00:04.00,Default,,0,0,0,,The dog sees me, I think
";

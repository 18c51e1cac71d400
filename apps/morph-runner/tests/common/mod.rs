//! Shared setup for runner pass tests.

use std::fs;
use std::path::Path;

use morph_runner::settings::{Mode, Settings};
use serde_json::json;

/// Settings rooted in `dir`: databases in `dir/dbs`, reports in `dir/out`.
pub fn settings(dir: &Path, mode: Mode) -> Settings {
    Settings {
        mode,
        config: None,
        db_dir: dir.join("dbs"),
        items: Some(dir.join("items.json")),
        corpus_dir: Some(dir.join("corpus")),
        output_dir: dir.join("out"),
        master_freq: None,
        morphemizer: "space".to_string(),
        study_plan: true,
    }
}

/// Write an item collection of `(id, expression, interval)` entries.
pub fn write_items(path: &Path, items: &[(i64, &str, f64)]) {
    let items: Vec<_> = items
        .iter()
        .map(|(id, text, interval)| {
            json!({
                "id": id,
                "guid": format!("guid-{}", id),
                "category": "Basic",
                "fields": [
                    ["Expression", text],
                    ["Morph_FocusMorph", ""],
                    ["Morph_FocusMorphPos", ""],
                    ["Morph_UnknownCount", ""],
                    ["Morph_UnmatureCount", ""],
                    ["Morph_Index", ""],
                    ["Morph_Unknowns", ""],
                    ["Morph_Unmatures", ""],
                    ["Morph_UnknownFreq", ""]
                ],
                "tags": [],
                "maturities": [interval]
            })
        })
        .collect();
    fs::write(path, json!({ "items": items }).to_string()).unwrap();
}

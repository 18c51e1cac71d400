//! End-to-end runner passes over files in a temporary directory.

mod common;

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use morph_core::types::pos;
use morph_core::{
    CancelToken, LoadMode, MorphConfig, MorphDb, MorphemizerRegistry, Morpheme, NoProgress,
    PassControl,
};
use morph_runner::settings::Mode;
use morph_runner::store::JsonItemStore;
use morph_runner::{run_readability, run_recalc, ALL_DB, KNOWN_DB};

fn control() -> PassControl {
    PassControl::new(Arc::new(NoProgress), CancelToken::new())
}

/// Test recalc writes the databases and updates the item file.
#[test]
fn test_recalc_pass() {
    let dir = TempDir::new().unwrap();
    let settings = common::settings(dir.path(), Mode::Recalc);
    common::write_items(
        &dir.path().join("items.json"),
        &[(1, "I have a cat.", 30.0), (2, "I have a dog.", 0.0)],
    );

    run_recalc(
        &settings,
        &MorphConfig::with_default_filters(),
        &MorphemizerRegistry::with_defaults(),
        &control(),
    )
    .unwrap();

    assert!(settings.db_path(ALL_DB).exists());
    let known = MorphDb::load(&settings.db_path(KNOWN_DB), LoadMode::Strict).unwrap();
    assert!(known.matches(&Morpheme::uniform("cat", pos::UNKNOWN)));
    assert!(!known.matches(&Morpheme::uniform("dog", pos::UNKNOWN)));

    let store = JsonItemStore::open(&dir.path().join("items.json")).unwrap();
    let item = store.item(2).unwrap();
    assert_eq!(item.field("Morph_FocusMorph"), Some("dog"));
    assert!(item.has_tag("mm_vocab"));
    assert!(store.due(1).unwrap() < store.due(2).unwrap());
}

/// Test a second recalc reuses the saved all-db.
#[test]
fn test_recalc_twice() {
    let dir = TempDir::new().unwrap();
    let settings = common::settings(dir.path(), Mode::Recalc);
    common::write_items(&dir.path().join("items.json"), &[(1, "I have a cat.", 30.0)]);
    let config = MorphConfig::with_default_filters();
    let registry = MorphemizerRegistry::with_defaults();

    run_recalc(&settings, &config, &registry, &control()).unwrap();
    let first = fs::read_to_string(settings.db_path(ALL_DB)).unwrap();
    run_recalc(&settings, &config, &registry, &control()).unwrap();
    let second = fs::read_to_string(settings.db_path(ALL_DB)).unwrap();

    assert_eq!(first, second);
}

/// Test readability writes every report, including the study plan.
#[test]
fn test_readability_pass() {
    let dir = TempDir::new().unwrap();
    let settings = common::settings(dir.path(), Mode::Readability);
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus).unwrap();
    fs::write(corpus.join("ep1.txt"), "the cat sat\nthe cat ran\n").unwrap();

    run_readability(
        &settings,
        &MorphConfig::with_default_filters(),
        &MorphemizerRegistry::with_defaults(),
        &control(),
    )
    .unwrap();

    let out = dir.path().join("out");
    let table = fs::read_to_string(out.join("readability.tsv")).unwrap();
    assert!(table.lines().any(|l| l.starts_with("ep1.txt\t")));
    assert!(out.join("word_freq_report.txt").exists());
    let plan = fs::read_to_string(out.join("study_plan.txt")).unwrap();
    assert!(plan.starts_with("'ep1.txt' study goal:"));
    assert!(out.join("frequency.txt").exists());
}

/// Test an unknown morphemizer name fails the readability pass.
#[test]
fn test_readability_unknown_morphemizer() {
    let dir = TempDir::new().unwrap();
    let mut settings = common::settings(dir.path(), Mode::Readability);
    settings.morphemizer = "klingon".to_string();

    let result = run_readability(
        &settings,
        &MorphConfig::with_default_filters(),
        &MorphemizerRegistry::with_defaults(),
        &control(),
    );
    assert!(result.is_err());
}

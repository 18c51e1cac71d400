//! Morpheme indexing and ranking engine.
//!
//! Provides:
//! - Morphemizers turning text into morphemes, looked up by name
//! - A morpheme database with fuzzy matching and maturity views
//! - Per-item ranking of new vocabulary
//! - Corpus readability measurement and a greedy study plan

pub mod config;
pub mod counting;
pub mod db;
pub mod error;
pub mod frequency;
pub mod morphemizer;
pub mod pipeline;
pub mod progress;
pub mod readability;
pub mod scoring;
pub mod text;
pub mod types;

pub use config::{ItemFilter, MorphConfig, ReadabilityConfig, ScoringConfig, Thresholds};
pub use counting::CountingDb;
pub use db::{LoadMode, MorphDb};
pub use error::{MorphError, Result};
pub use frequency::FrequencyList;
pub use morphemizer::{extract_morphemes, Morphemizer, MorphemizerRegistry, Segmenter};
pub use pipeline::{build_all_db, recalc, BuildStats, ItemStore, RecalcInputs, RecalcOutcome};
pub use progress::{CancelToken, LogProgress, NoProgress, PassControl, ProgressEvent, ProgressReporter};
pub use readability::{analyze_corpus, Analysis, CorpusMeasurement, ReadabilityAnalyzer, StudyPlan};
pub use scoring::{clamp_index, ItemScore, ScoringEngine, ScoringViews};
pub use types::{card_maturity, ItemRecord, ItemUpdate, Location, LocationKey, Morpheme};

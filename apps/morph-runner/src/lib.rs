pub mod settings;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use morph_core::readability::report::write_reports;
use morph_core::{
    analyze_corpus, recalc, CancelToken, CountingDb, FrequencyList, LoadMode, LogProgress,
    MorphConfig, MorphDb, MorphemizerRegistry, PassControl, ReadabilityAnalyzer, RecalcInputs,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::{Mode, Settings};
use crate::store::JsonItemStore;

pub const ALL_DB: &str = "all.db";
pub const SEEN_DB: &str = "seen.db";
pub const KNOWN_DB: &str = "known.db";
pub const MATURE_DB: &str = "mature.db";
pub const EXTERNAL_DB: &str = "ext.db";
pub const PRIORITY_DB: &str = "priority.db";
pub const FREQUENCY_LIST: &str = "frequency.txt";

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let config = match &settings.config {
        Some(path) => MorphConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MorphConfig::with_default_filters(),
    };
    let registry = MorphemizerRegistry::with_defaults();
    let control = PassControl::new(Arc::new(LogProgress), CancelToken::new());

    match settings.mode {
        Mode::Recalc => run_recalc(&settings, &config, &registry, &control),
        Mode::Readability => run_readability(&settings, &config, &registry, &control),
    }
}

/// Missing databases load empty; unreadable records are skipped.
fn load_db(path: &Path) -> anyhow::Result<MorphDb> {
    MorphDb::load(path, LoadMode::Lenient)
        .with_context(|| format!("loading database {}", path.display()))
}

/// Rebuild the databases from the item collection and rank every item.
pub fn run_recalc(
    settings: &Settings,
    config: &MorphConfig,
    registry: &MorphemizerRegistry,
    control: &PassControl,
) -> anyhow::Result<()> {
    let items_path = settings
        .items
        .as_deref()
        .context("MORPH_ITEMS not set")?;
    let mut store = JsonItemStore::open(items_path)?;

    let all_path = settings.db_path(ALL_DB);
    let previous = if all_path.exists() {
        Some(load_db(&all_path)?)
    } else {
        None
    };
    let external = load_db(&settings.db_path(EXTERNAL_DB))?;
    let priority = load_db(&settings.db_path(PRIORITY_DB))?;
    let frequency_path = settings.db_path(FREQUENCY_LIST);
    let frequency = if frequency_path.exists() {
        FrequencyList::load(&frequency_path)?
    } else {
        FrequencyList::default()
    };

    tracing::info!("Starting recalc...");
    let outcome = recalc(
        &mut store,
        RecalcInputs {
            previous_all: previous.as_ref(),
            external: &external,
            priority: &priority,
            frequency: &frequency,
        },
        config,
        registry,
        control,
        Utc::now(),
    )?;

    outcome.all.save(&all_path)?;
    outcome.seen.save(&settings.db_path(SEEN_DB))?;
    outcome.known.save(&settings.db_path(KNOWN_DB))?;
    outcome.mature.save(&settings.db_path(MATURE_DB))?;
    store.save()?;

    tracing::info!(
        updated = outcome.indices.len(),
        unchanged = outcome.unchanged,
        failed = outcome.failed,
        known = outcome.known.len(),
        "Databases saved"
    );
    Ok(())
}

/// Measure the corpus against the known database and write the reports.
pub fn run_readability(
    settings: &Settings,
    config: &MorphConfig,
    registry: &MorphemizerRegistry,
    control: &PassControl,
) -> anyhow::Result<()> {
    let corpus_dir = settings
        .corpus_dir
        .as_deref()
        .context("MORPH_CORPUS_DIR not set")?;
    let morphemizer = registry.require(&settings.morphemizer)?;
    let known = load_db(&settings.db_path(KNOWN_DB))?;
    let mut master = match &settings.master_freq {
        Some(path) => CountingDb::load_master(path)
            .with_context(|| format!("loading master frequency table {}", path.display()))?,
        None => CountingDb::new(),
    };

    let analyzer =
        ReadabilityAnalyzer::new(&*morphemizer, &config.text, &config.readability, &known);
    let analysis = analyze_corpus(corpus_dir, &analyzer, &mut master, settings.study_plan, control)?;
    let paths = write_reports(&settings.output_dir, &analysis, &known, &config.readability)?;

    let totals = &analysis.measurement.totals;
    tracing::info!(
        sources = analysis.measurement.sources.len(),
        readability = totals.readability(),
        report = %paths.readability.display(),
        "Readability finished"
    );
    Ok(())
}

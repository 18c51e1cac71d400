//! Runner settings read from the environment.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Recalc,
    Readability,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: Mode,
    /// JSON config file; defaults apply when absent.
    pub config: Option<PathBuf>,
    /// Directory of the morph databases and word lists.
    pub db_dir: PathBuf,
    /// JSON item collection (recalc).
    pub items: Option<PathBuf>,
    /// Corpus root (readability).
    pub corpus_dir: Option<PathBuf>,
    /// Report directory (readability); defaults to `db_dir`.
    pub output_dir: PathBuf,
    pub master_freq: Option<PathBuf>,
    /// Morphemizer for corpus text.
    pub morphemizer: String,
    pub study_plan: bool,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// Env vars:
    /// - MORPH_MODE: `recalc` (default) or `readability`
    /// - MORPH_CONFIG: JSON config file
    /// - MORPH_DB_DIR: database directory (default `dbs`)
    /// - MORPH_ITEMS: item collection, required for recalc
    /// - MORPH_CORPUS_DIR: corpus root, required for readability
    /// - MORPH_OUTPUT_DIR: report directory
    /// - MORPH_MASTER_FREQ: master frequency table
    /// - MORPH_MORPHEMIZER: corpus morphemizer (default `space`)
    /// - MORPH_STUDY_PLAN: `true` to build a study plan
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = match var("MORPH_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("recalc") => Mode::Recalc,
            Some("readability") => Mode::Readability,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    name: "MORPH_MODE",
                    value: other.to_string(),
                })
            }
        };
        let study_plan = match var("MORPH_STUDY_PLAN").as_deref() {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    name: "MORPH_STUDY_PLAN",
                    value: other.to_string(),
                })
            }
        };

        let db_dir = PathBuf::from(var("MORPH_DB_DIR").unwrap_or_else(|| "dbs".to_string()));
        let settings = Self {
            mode,
            config: var("MORPH_CONFIG").map(PathBuf::from),
            output_dir: var("MORPH_OUTPUT_DIR").map_or_else(|| db_dir.clone(), PathBuf::from),
            db_dir,
            items: var("MORPH_ITEMS").map(PathBuf::from),
            corpus_dir: var("MORPH_CORPUS_DIR").map(PathBuf::from),
            master_freq: var("MORPH_MASTER_FREQ").map(PathBuf::from),
            morphemizer: var("MORPH_MORPHEMIZER").unwrap_or_else(|| "space".to_string()),
            study_plan,
        };

        match settings.mode {
            Mode::Recalc if settings.items.is_none() => Err(SettingsError::Missing("MORPH_ITEMS")),
            Mode::Readability if settings.corpus_dir.is_none() => {
                Err(SettingsError::Missing("MORPH_CORPUS_DIR"))
            }
            _ => Ok(settings),
        }
    }

    pub fn db_path(&self, file: &str) -> PathBuf {
        self.db_dir.join(file)
    }
}

// Pipeline configuration
//
// Path resolution order:
// 1) Explicit command-line value
// 2) Environment variable override (SKATE_LABELS_DB_PATH, SKATE_LABELS_MAPPING_DIR)
// 3) Built-in default relative to the working directory

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_DB_PATH, DEFAULT_MAPPING_DIR, DEFAULT_PROJECT, ENV_DB_PATH, ENV_MAPPING_DIR};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub csv_path: PathBuf,
    pub mapping_dir: PathBuf,
    pub db_path: PathBuf,
    pub project: String,
    /// Stop after rendering; nothing on disk or in the database changes.
    pub dry_run: bool,
    pub skip_db: bool,
}

impl PipelineConfig {
    /// Config for `csv_path` with every other setting at its default.
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            csv_path: csv_path.into(),
            mapping_dir: mapping_dir(None),
            db_path: db_path(None),
            project: DEFAULT_PROJECT.to_string(),
            dry_run: false,
            skip_db: false,
        }
    }
}

fn resolve_path(explicit: Option<PathBuf>, env_key: &str, default: &str) -> PathBuf {
    if let Some(p) = explicit {
        return p;
    }

    if let Ok(v) = env::var(env_key) {
        if !v.trim().is_empty() {
            return PathBuf::from(v);
        }
    }

    PathBuf::from(default)
}

/// Database file path
pub fn db_path(explicit: Option<PathBuf>) -> PathBuf {
    resolve_path(explicit, ENV_DB_PATH, DEFAULT_DB_PATH)
}

/// Directory holding the mapping files
pub fn mapping_dir(explicit: Option<PathBuf>) -> PathBuf {
    resolve_path(explicit, ENV_MAPPING_DIR, DEFAULT_MAPPING_DIR)
}

// CSV to mapping pipeline
//
// Reading -> Validating -> Extracting -> Generating -> (preview | persist).
// Persisting backs up the mapping files, writes them, then appends a
// label_sets version. A failure after the backups restores the files;
// the database step rolls back its own transaction.

use std::fmt;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::db::label_sets::{self, DbPreview, DbUpdate};
use crate::error::LabelError;
use crate::labels::{self, ElementRecord, SetRecord};
use crate::mapping::backup::{self, BackupEntry, RestoreFailure};
use crate::mapping::{self, MappingContents, MappingPaths};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Validating,
    Extracting,
    Generating,
    BackingUp,
    WritingFiles,
    UpdatingDatabase,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Reading => "Reading CSV",
            Stage::Validating => "Validating CSV",
            Stage::Extracting => "Extracting categories",
            Stage::Generating => "Generating mapping files",
            Stage::BackingUp => "Backing up mapping files",
            Stage::WritingFiles => "Writing mapping files",
            Stage::UpdatingDatabase => "Updating database",
        };
        f.write_str(name)
    }
}

/// What happened to the mapping files after a failed persist.
#[derive(Debug)]
pub enum Rollback {
    NotNeeded,
    /// Paths restored from backup or removed because they were new.
    Restored(Vec<PathBuf>),
    /// Some targets could not be put back; the rest were.
    Failed(RestoreFailure),
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: LabelError,
    pub rollback: Rollback,
}

impl PipelineFailure {
    fn at(stage: Stage) -> impl FnOnce(LabelError) -> PipelineFailure {
        move |error| PipelineFailure { stage, error, rollback: Rollback::NotNeeded }
    }

    /// Validation problems, if this failure came from validation.
    pub fn problems(&self) -> &[String] {
        self.error.problems()
    }
}

/// Would-be results of a dry run.
#[derive(Debug, Clone)]
pub struct Preview {
    pub paths: MappingPaths,
    pub contents: MappingContents,
    pub database: Option<DbPreview>,
}

impl Preview {
    /// First `n` element mapping lines and how many lines follow them.
    pub fn element_head(&self, n: usize) -> (Vec<&str>, usize) {
        let lines: Vec<&str> = self.contents.element.lines().collect();
        let remaining = lines.len().saturating_sub(n);
        (lines.into_iter().take(n).collect(), remaining)
    }
}

#[derive(Debug)]
pub enum Outcome {
    Preview(Preview),
    Persisted {
        paths: MappingPaths,
        backups: Vec<BackupEntry>,
        db_update: Option<DbUpdate>,
    },
}

#[derive(Debug)]
pub struct PipelineReport {
    pub elements: usize,
    pub sets: Vec<SetRecord>,
    pub outcome: Outcome,
}

impl PipelineReport {
    pub fn categories(&self) -> usize {
        self.sets.len()
    }

    /// New label_sets version, if the database was updated.
    pub fn version(&self) -> Option<i64> {
        match &self.outcome {
            Outcome::Persisted { db_update: Some(update), .. } => Some(update.version),
            _ => None,
        }
    }
}

pub fn run(config: &PipelineConfig) -> Result<PipelineReport, PipelineFailure> {
    log::info!("{}: {}", Stage::Reading, config.csv_path.display());
    let records = labels::read_csv(&config.csv_path).map_err(PipelineFailure::at(Stage::Reading))?;

    log::info!("{}: {} elements", Stage::Validating, records.len());
    let problems = labels::validate(&records);
    if !problems.is_empty() {
        log::warn!("CSV validation found {} problem(s)", problems.len());
        return Err(PipelineFailure {
            stage: Stage::Validating,
            error: LabelError::Validation(problems),
            rollback: Rollback::NotNeeded,
        });
    }

    let sets = labels::extract_sets(&records);
    log::info!("{}: {} categories", Stage::Extracting, sets.len());

    log::info!("{}", Stage::Generating);
    let contents = MappingContents::render(&records, &sets);
    let paths = MappingPaths::in_dir(&config.mapping_dir);

    let outcome = if config.dry_run {
        let database = if config.skip_db {
            None
        } else {
            let preview = label_sets::preview_update(&records, &config.db_path, &config.project)
                .map_err(PipelineFailure::at(Stage::Generating))?;
            Some(preview)
        };
        Outcome::Preview(Preview { paths, contents, database })
    } else {
        persist(config, &records, paths, &contents)?
    };

    Ok(PipelineReport {
        elements: records.len(),
        sets,
        outcome,
    })
}

fn persist(
    config: &PipelineConfig,
    records: &[ElementRecord],
    paths: MappingPaths,
    contents: &MappingContents,
) -> Result<Outcome, PipelineFailure> {
    log::info!("{}", Stage::BackingUp);
    let backups = backup::create_backups(&paths.all()).map_err(PipelineFailure::at(Stage::BackingUp))?;

    match write_and_update(config, records, &paths, contents) {
        Ok(db_update) => Ok(Outcome::Persisted {
            paths,
            backups: backups.entries().to_vec(),
            db_update,
        }),
        Err((stage, error)) => {
            log::error!("{} failed: {}; restoring mapping files", stage, error);
            let rollback = match backups.restore() {
                Ok(touched) => Rollback::Restored(touched),
                Err(restore_err) => {
                    log::error!("Restoring mapping files failed: {}", restore_err);
                    Rollback::Failed(restore_err)
                }
            };
            Err(PipelineFailure { stage, error, rollback })
        }
    }
}

fn write_and_update(
    config: &PipelineConfig,
    records: &[ElementRecord],
    paths: &MappingPaths,
    contents: &MappingContents,
) -> Result<Option<DbUpdate>, (Stage, LabelError)> {
    log::info!("{}", Stage::WritingFiles);
    mapping::write_mapping_files(paths, contents).map_err(|e| (Stage::WritingFiles, e))?;

    if config.skip_db {
        log::info!("Skipping database update");
        return Ok(None);
    }

    log::info!("{}: {}", Stage::UpdatingDatabase, config.db_path.display());
    let update = label_sets::update_database(records, &config.db_path, &config.project)
        .map_err(|e| (Stage::UpdatingDatabase, e))?;

    Ok(Some(update))
}

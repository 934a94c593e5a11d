// Mapping file generation

pub mod backup;

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{ELEMENT_MAPPING_FILENAME, SET_MAPPING_FILENAME};
use crate::error::Result;
use crate::labels::{ElementRecord, SetRecord};

/// Target paths of the two mapping files inside a mapping directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPaths {
    pub element: PathBuf,
    pub set: PathBuf,
}

impl MappingPaths {
    pub fn in_dir(mapping_dir: &Path) -> Self {
        MappingPaths {
            element: mapping_dir.join(ELEMENT_MAPPING_FILENAME),
            set: mapping_dir.join(SET_MAPPING_FILENAME),
        }
    }

    pub fn all(&self) -> [&Path; 2] {
        [self.element.as_path(), self.set.as_path()]
    }
}

/// Rendered contents of both mapping files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingContents {
    pub element: String,
    pub set: String,
}

impl MappingContents {
    pub fn render(records: &[ElementRecord], sets: &[SetRecord]) -> Self {
        MappingContents {
            element: render_element_mapping(records),
            set: render_set_mapping(sets),
        }
    }
}

/// `"{id} {element_label}"` per record, every line newline-terminated.
pub fn render_element_mapping(records: &[ElementRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{} {}\n", r.id, r.element_label))
        .collect()
}

/// `"{id} {name}"` per category, every line newline-terminated.
pub fn render_set_mapping(sets: &[SetRecord]) -> String {
    sets.iter()
        .map(|s| format!("{} {}\n", s.id, s.name))
        .collect()
}

/// Overwrite both mapping files.
pub fn write_mapping_files(paths: &MappingPaths, contents: &MappingContents) -> Result<()> {
    fs::write(&paths.element, &contents.element)?;
    log::info!("Wrote {}", paths.element.display());

    fs::write(&paths.set, &contents.set)?;
    log::info!("Wrote {}", paths.set.display());

    Ok(())
}

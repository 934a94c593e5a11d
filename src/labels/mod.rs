// Label records read from the annotation CSV

pub mod reader;
pub mod sets;

use crate::constants::default_category_color;

pub use reader::{read_csv, validate};
pub use sets::extract_sets;

/// One element row from the CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub id: i64,
    pub set_label: String,
    pub element_label: String,
    pub color: Option<String>,
}

impl ElementRecord {
    /// Own color if given, otherwise the category default.
    pub fn resolved_color(&self) -> &str {
        self.color
            .as_deref()
            .unwrap_or_else(|| default_category_color(&self.set_label))
    }
}

/// A category derived from the element rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRecord {
    pub id: usize,
    pub name: String,
    pub color: String,
}

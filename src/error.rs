// Skate Labels Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("{what} not found: {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("Line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("CSV file contains no data rows")]
    EmptyInput,

    #[error("CSV validation failed with {} problem(s)", .0.len())]
    Validation(Vec<String>),

    #[error("Database update failed: {0}")]
    Persistence(#[source] rusqlite::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LabelError {
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        LabelError::NotFound { what, path: path.into() }
    }

    pub fn format(line: usize, message: impl Into<String>) -> Self {
        LabelError::Format { line, message: message.into() }
    }

    /// Validation problems carried by this error, empty for every other kind.
    pub fn problems(&self) -> &[String] {
        match self {
            LabelError::Validation(problems) => problems.as_slice(),
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;

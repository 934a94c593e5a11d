// Skate Labels - Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod labels;
pub mod mapping;
pub mod db;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{LabelError, Result};
pub use pipeline::{run, PipelineFailure, PipelineReport};

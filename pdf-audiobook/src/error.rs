//! Error taxonomy for the audiobook pipeline.
//!
//! Each stage reports its own kind; a synthesis failure names the backend
//! and the chunk that failed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid page range '{0}'. Use 'start-end' (e.g., '1-10').")]
    InvalidRange(String),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Error converting voice sample: {0}")]
    Conversion(String),

    #[error("Error extracting text from PDF: {0}")]
    Extraction(String),

    #[error("{backend} error on chunk {}: {cause}", .index + 1)]
    Synthesis {
        backend: String,
        /// Zero-based chunk index
        index: usize,
        cause: String,
    },

    #[error("Failed to load {model}: {cause}")]
    ModelLoad { model: String, cause: String },

    #[error("Audio assembly failed: {0}")]
    Assembly(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

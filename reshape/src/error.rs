//! Error types for the reshape pipeline.
//!
//! - [`CsvError`] - reading, decoding and writing CSV tables
//! - [`ProfileError`] - loading and validating mapping profiles
//! - [`MappingError`] - reading the menu mapping table
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a CSV table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write a file.
    #[error("Cannot access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Parse(#[from] csv::Error),

    /// Empty file (not even a header line).
    #[error("CSV file is empty")]
    EmptyFile,
}

impl CsvError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CsvError::Io {
            path: path.into(),
            source,
        }
    }
}

// =============================================================================
// Profile Errors
// =============================================================================

/// Errors while resolving a mapping profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Neither a built-in profile name nor a readable file.
    #[error("Unknown profile: {0}")]
    Unknown(String),

    /// Profile file could not be read.
    #[error("Cannot read profile '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Profile JSON is malformed.
    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Profile is well-formed JSON but inconsistent.
    #[error("Invalid profile '{name}': {message}")]
    Invalid { name: String, message: String },
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors while reading the menu mapping table.
///
/// A missing mapping file is not an error; see
/// [`crate::transform::menu::MenuMapping::load_or_identity`].
#[derive(Debug, Error)]
pub enum MappingError {
    /// Mapping CSV could not be parsed.
    #[error("Mapping CSV error: {0}")]
    Csv(#[from] CsvError),

    /// A required column is absent from the mapping header.
    #[error("Mapping file is missing column '{0}'")]
    MissingColumn(&'static str),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors returned by [`crate::transform::pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV error (missing input file included).
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Profile error.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Mapping error.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

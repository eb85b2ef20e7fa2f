//! # Reshape - banquet reservation export to booking-tool import
//!
//! Reshape turns the wide CSV export of a banquet reservation system into the
//! import CSV of a downstream booking tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Export CSV │────▶│   Parser    │────▶│   Profile    │────▶│  Import CSV │
//! │ (BOM/SJIS)  │     │ (auto-enc)  │     │ (blocks+map) │     │ (BOM UTF-8) │
//! └─────────────┘     └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reshape::{transform_file, TransformOptions};
//! use std::path::Path;
//!
//! let report = transform_file(
//!     Path::new("data/source_data.csv"),
//!     Path::new("data/transformed_data.csv"),
//!     &TransformOptions::default(),
//! ).unwrap();
//! println!("Reshaped {} rows", report.output.rows.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Leveled console logging
//! - [`models`] - Source table, meal blocks, output table
//! - [`parser`] - CSV reading/writing with auto-detection
//! - [`transform`] - Locators, profiles, menu mapping and the pipeline

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, MappingError, PipelineError, ProfileError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{BlockPart, MealBlock, OutputTable, SourceTable};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_bytes_with,
    parse_table, read_table_file, read_table_file_with, write_table, write_table_file,
    ParseResult,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    builtin_profiles, extract_block, harvest_file, harvest_menu_names, locate_meal_blocks,
    map_menu_name, profile_by_name, transform_file, transform_table, BlockLayout,
    BlockLocator, CsvInfo, IncrementStrategy, LocatorSpec, MenuMapping, Profile,
    TransformOptions, TransformReport, DEFAULT_MAPPING_PATH, DEFAULT_PROFILE,
};

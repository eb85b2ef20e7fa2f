//! Domain models for the reshape pipeline.
//!
//! - [`SourceTable`] - the parsed reservation export (headers + raw rows)
//! - [`MealBlock`] - one ordered food item read from a row
//! - [`BlockPart`] - the four fields of a meal block
//! - [`OutputTable`] - the reshaped table, ready to be written

use serde::{Deserialize, Serialize};

// =============================================================================
// Source Table
// =============================================================================

/// A loosely-typed CSV table.
///
/// Fields can be read by header name (first occurrence wins, since repeated
/// meal-block headers are not unique) or by raw position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Number of columns declared by the header line.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Raw value at `index` in `row`; empty when the row is short.
    pub fn value_at<'a>(row: &'a [String], index: usize) -> &'a str {
        row.get(index).map(String::as_str).unwrap_or("")
    }
}

// =============================================================================
// Meal Blocks
// =============================================================================

/// The fields that make up one meal block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPart {
    Name,
    Price,
    Quantity,
    Remarks,
}

/// One ordered food item extracted from a source row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealBlock {
    pub name: String,
    pub price: String,
    pub quantity: String,
    pub remarks: String,
}

impl MealBlock {
    pub fn part(&self, part: BlockPart) -> &str {
        match part {
            BlockPart::Name => &self.name,
            BlockPart::Price => &self.price,
            BlockPart::Quantity => &self.quantity,
            BlockPart::Remarks => &self.remarks,
        }
    }
}

// =============================================================================
// Output Table
// =============================================================================

/// The reshaped table: a fixed header and one row per source row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// Value of the named output column in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// All values of the named output column.
    pub fn column(&self, column: &str) -> Vec<&str> {
        match self.headers.iter().position(|h| h == column) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_str()).collect(),
            None => Vec::new(),
        }
    }
}

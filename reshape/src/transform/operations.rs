//! Cleanup operations applied to whole output columns after row assembly.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// A text operation on one output value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Remove trailing whitespace
    TrimEnd,

    /// Remove every leading character contained in `chars`
    StripLeading { chars: String },

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },
}

impl Operation {
    /// Apply this operation to a value
    pub fn apply(&self, value: &str) -> String {
        match self {
            Operation::Trim => value.trim().to_string(),
            Operation::TrimEnd => value.trim_end().to_string(),
            Operation::StripLeading { chars } => {
                value.trim_start_matches(|c: char| chars.contains(c)).to_string()
            }
            Operation::Replace { pattern, value: replacement } => Regex::new(pattern)
                .map(|re| re.replace_all(value, replacement.as_str()).to_string())
                .unwrap_or_else(|_| value.to_string()),
        }
    }
}

/// Which output columns a cleanup rule touches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSelector {
    /// Every output column
    All,
    /// Columns whose name matches a regex
    Matching { pattern: String },
    /// Columns listed by name
    Named { names: Vec<String> },
}

/// A whole-table cleanup pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupRule {
    pub select: FieldSelector,
    pub operation: Operation,
}

impl CleanupRule {
    pub fn new(select: FieldSelector, operation: Operation) -> Self {
        Self { select, operation }
    }

    /// Resolve the selector against an output header.
    pub fn selected_columns(&self, headers: &[String]) -> Result<Vec<usize>, ProfileError> {
        let columns = match &self.select {
            FieldSelector::All => (0..headers.len()).collect(),
            FieldSelector::Matching { pattern } => {
                let re = Regex::new(pattern).map_err(|e| ProfileError::Invalid {
                    name: "cleanup".to_string(),
                    message: format!("bad selector pattern '{}': {}", pattern, e),
                })?;
                headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| re.is_match(h))
                    .map(|(i, _)| i)
                    .collect()
            }
            FieldSelector::Named { names } => headers
                .iter()
                .enumerate()
                .filter(|(_, h)| names.contains(h))
                .map(|(i, _)| i)
                .collect(),
        };
        Ok(columns)
    }

    /// Apply this rule to every row in place.
    pub fn apply(&self, headers: &[String], rows: &mut [Vec<String>]) -> Result<(), ProfileError> {
        let columns = self.selected_columns(headers)?;
        for row in rows.iter_mut() {
            for &idx in &columns {
                if let Some(cell) = row.get_mut(idx) {
                    *cell = self.operation.apply(cell);
                }
            }
        }
        Ok(())
    }
}

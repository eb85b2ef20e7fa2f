//! Per-row increment values. Counters restart at 1 on every run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the `Increment` column is generated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncrementStrategy {
    /// 1, 2, 3, ...
    #[default]
    Counter,
    /// Run date as `YYYYMMDD` followed by the zero-padded counter
    DatePrefixed {
        #[serde(default = "default_width")]
        width: usize,
    },
}

fn default_width() -> usize {
    4
}

impl IncrementStrategy {
    /// Increment value for the 0-based `row_index` of a run on `run_date`.
    pub fn value(&self, row_index: usize, run_date: NaiveDate) -> String {
        let counter = row_index + 1;
        match self {
            IncrementStrategy::Counter => counter.to_string(),
            IncrementStrategy::DatePrefixed { width } => {
                format!("{}{:0width$}", run_date.format("%Y%m%d"), counter, width = *width)
            }
        }
    }
}

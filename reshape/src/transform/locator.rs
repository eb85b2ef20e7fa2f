//! Strategies for finding the item-name column of each meal block.
//!
//! The export repeats its meal-block headers, so blocks are found either by
//! fixed positions or by scanning headers for a known label.

use serde::{Deserialize, Serialize};

/// Finds the item-name column of every meal block in a header row.
pub trait BlockLocator {
    /// Item-name column indices, in block order, all within `headers`.
    fn locate(&self, headers: &[String]) -> Vec<usize>;
}

/// A literal list of item-name columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIndices {
    pub indices: Vec<usize>,
}

impl BlockLocator for FixedIndices {
    fn locate(&self, headers: &[String]) -> Vec<usize> {
        self.indices
            .iter()
            .copied()
            .filter(|&idx| idx < headers.len())
            .collect()
    }
}

/// Evenly spaced blocks: `base`, `base + stride`, ... up to `max_blocks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrideBlocks {
    pub base: usize,
    pub stride: usize,
    pub max_blocks: usize,
}

impl BlockLocator for StrideBlocks {
    fn locate(&self, headers: &[String]) -> Vec<usize> {
        // at most one block per header column can land inside the table
        (0..self.max_blocks.min(headers.len()))
            .map_while(|k| {
                k.checked_mul(self.stride)
                    .and_then(|offset| self.base.checked_add(offset))
            })
            .take_while(|&idx| idx < headers.len())
            .collect()
    }
}

/// Every header whose trimmed text equals `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderScan {
    pub label: String,
    #[serde(default)]
    pub max_blocks: Option<usize>,
}

impl BlockLocator for HeaderScan {
    fn locate(&self, headers: &[String]) -> Vec<usize> {
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.trim() == self.label)
            .map(|(i, _)| i)
            .take(self.max_blocks.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Serializable choice of locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocatorSpec {
    Fixed(FixedIndices),
    Stride(StrideBlocks),
    HeaderScan(HeaderScan),
}

impl LocatorSpec {
    pub fn fixed(indices: Vec<usize>) -> Self {
        LocatorSpec::Fixed(FixedIndices { indices })
    }

    pub fn stride(base: usize, stride: usize, max_blocks: usize) -> Self {
        LocatorSpec::Stride(StrideBlocks { base, stride, max_blocks })
    }

    pub fn header_scan(label: impl Into<String>) -> Self {
        LocatorSpec::HeaderScan(HeaderScan { label: label.into(), max_blocks: None })
    }

    pub fn locator(&self) -> &dyn BlockLocator {
        match self {
            LocatorSpec::Fixed(l) => l,
            LocatorSpec::Stride(l) => l,
            LocatorSpec::HeaderScan(l) => l,
        }
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            LocatorSpec::Fixed(l) => format!("fixed columns {:?}", l.indices),
            LocatorSpec::Stride(l) => format!(
                "every {} columns from {} ({} blocks max)",
                l.stride, l.base, l.max_blocks
            ),
            LocatorSpec::HeaderScan(l) => format!("headers labelled '{}'", l.label),
        }
    }
}

impl BlockLocator for LocatorSpec {
    fn locate(&self, headers: &[String]) -> Vec<usize> {
        self.locator().locate(headers)
    }
}

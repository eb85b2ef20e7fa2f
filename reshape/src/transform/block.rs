//! Meal block layout and positional extraction.

use serde::{Deserialize, Serialize};

use crate::models::{MealBlock, SourceTable};

/// Offsets of each block field relative to the block's item-name column.
///
/// Offsets may be negative: the quantity column sits before the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    #[serde(default)]
    pub name: i64,
    pub price: i64,
    pub quantity: i64,
    pub remarks: i64,
}

impl BlockLayout {
    pub const fn new(price: i64, quantity: i64, remarks: i64) -> Self {
        Self { name: 0, price, quantity, remarks }
    }

    /// Columns covered by one block, from its leftmost to its rightmost field.
    pub fn width(&self) -> u64 {
        let offsets = [self.name, self.price, self.quantity, self.remarks];
        let (min, max) = offsets
            .iter()
            .fold((i64::MAX, i64::MIN), |(lo, hi), &o| (lo.min(o), hi.max(o)));
        max.abs_diff(min) + 1
    }
}

/// Resolve `base + offset` to a column, if it lands inside `[0, column_count)`.
fn resolve(base: usize, offset: i64, column_count: usize) -> Option<usize> {
    let idx = i64::try_from(base).ok()?.checked_add(offset)?;
    let idx = usize::try_from(idx).ok()?;
    (idx < column_count).then_some(idx)
}

/// Read one meal block from `row` around `name_index`.
///
/// Any position outside the table's columns (or past the end of a short row)
/// yields an empty field.
pub fn extract_block(
    row: &[String],
    column_count: usize,
    name_index: usize,
    layout: &BlockLayout,
) -> MealBlock {
    let field = |offset: i64| {
        resolve(name_index, offset, column_count)
            .map(|idx| SourceTable::value_at(row, idx).to_string())
            .unwrap_or_default()
    };

    MealBlock {
        name: field(layout.name),
        price: field(layout.price),
        quantity: field(layout.quantity),
        remarks: field(layout.remarks),
    }
}

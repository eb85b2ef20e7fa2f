//! Menu name substitution and the unique-menu report.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{CsvError, MappingError, MappingResult};
use crate::logs::log_warning;
use crate::models::SourceTable;
use crate::parser::read_table_file;
use crate::transform::locator::BlockLocator;

/// Header of the old display name column in a mapping file.
pub const OLD_NAME_COLUMN: &str = "old_name";
/// Header of the canonical display name column in a mapping file.
pub const NEW_NAME_COLUMN: &str = "new_name";
/// Mapping file read when a run names none.
pub const DEFAULT_MAPPING_PATH: &str = "data/menu_mapping.csv";

/// Lookup from old menu display names to canonical ones.
///
/// Keys are trimmed; an empty mapping substitutes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuMapping {
    names: HashMap<String, String>,
}

impl MenuMapping {
    /// A mapping that leaves every name unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut names = HashMap::new();
        for (old, new) in pairs {
            let old = old.as_ref().trim();
            if old.is_empty() {
                continue;
            }
            names.insert(old.to_string(), new.as_ref().trim().to_string());
        }
        Self { names }
    }

    /// Build a mapping from a parsed `old_name,new_name` table.
    pub fn from_table(table: &SourceTable) -> MappingResult<Self> {
        let old_idx = table
            .column_index(OLD_NAME_COLUMN)
            .ok_or(MappingError::MissingColumn(OLD_NAME_COLUMN))?;
        let new_idx = table
            .column_index(NEW_NAME_COLUMN)
            .ok_or(MappingError::MissingColumn(NEW_NAME_COLUMN))?;

        Ok(Self::from_pairs(table.rows.iter().map(|row| {
            (
                SourceTable::value_at(row, old_idx),
                SourceTable::value_at(row, new_idx),
            )
        })))
    }

    /// Read a mapping file.
    pub fn load<P: AsRef<Path>>(path: P) -> MappingResult<Self> {
        let parsed = read_table_file(path)?;
        Self::from_table(&parsed.table)
    }

    /// Read a mapping file, falling back to the identity mapping when the
    /// file does not exist.
    ///
    /// Returns the warning that was logged, if any.
    pub fn load_or_identity<P: AsRef<Path>>(path: P) -> MappingResult<(Self, Option<String>)> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(mapping) => Ok((mapping, None)),
            Err(MappingError::Csv(CsvError::Io { source, .. }))
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                let warning = format!(
                    "Menu mapping file not found: {} (menu names left unchanged)",
                    path.display()
                );
                log_warning(&warning);
                Ok((Self::identity(), Some(warning)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.names.get(old.trim()).map(String::as_str)
    }
}

/// Substitute a menu name through `mapping`.
///
/// Empty values and names absent from the mapping come back unchanged.
pub fn map_menu_name(raw: &str, mapping: &MenuMapping) -> String {
    if raw.is_empty() {
        return String::new();
    }
    mapping
        .get(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}

/// Distinct non-empty menu names found in the located meal-name columns,
/// sorted ascending.
pub fn harvest_menu_names(table: &SourceTable, locator: &dyn BlockLocator) -> Vec<String> {
    let columns = locator.locate(&table.headers);
    let mut names = BTreeSet::new();

    for row in &table.rows {
        for &idx in &columns {
            let value = SourceTable::value_at(row, idx);
            if !value.is_empty() {
                names.insert(value.to_string());
            }
        }
    }

    names.into_iter().collect()
}

/// Write one menu name per line.
pub fn write_menu_names<P: AsRef<Path>>(path: P, names: &[String]) -> Result<(), CsvError> {
    let path = path.as_ref();
    let mut content = String::new();
    for name in names {
        content.push_str(name);
        content.push('\n');
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CsvError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| CsvError::io(path, e))
}

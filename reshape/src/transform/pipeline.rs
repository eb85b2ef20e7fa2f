//! High-level pipeline: read the export, reshape it, write the import file.
//!
//! # Example
//!
//! ```rust,ignore
//! use reshape::{transform_file, TransformOptions};
//! use std::path::Path;
//!
//! let report = transform_file(
//!     Path::new("data/source_data.csv"),
//!     Path::new("data/transformed_data.csv"),
//!     &TransformOptions::default(),
//! )?;
//! println!("Reshaped {} rows", report.output.rows.len());
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use super::block::{extract_block, BlockLayout};
use super::locator::BlockLocator;
use super::menu::{
    harvest_menu_names, map_menu_name, write_menu_names, MenuMapping, DEFAULT_MAPPING_PATH,
};
use super::profile::{FieldRule, Profile, DEFAULT_PROFILE};
use crate::error::{PipelineResult, ProfileResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{BlockPart, MealBlock, OutputTable, SourceTable};
use crate::parser::{read_table_file, read_table_file_with, write_table_file};

/// Options for the reshape pipeline
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Built-in profile name or path to a profile JSON file
    pub profile: String,

    /// Menu mapping CSV (`old_name,new_name`); only read by profiles that map
    /// names. `None` reads [`DEFAULT_MAPPING_PATH`].
    pub mapping_path: Option<PathBuf>,

    /// Input delimiter (auto-detect if not specified)
    pub delimiter: Option<char>,

    /// Fixed run time instead of the wall clock
    pub run_at: Option<NaiveDateTime>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            mapping_path: None,
            delimiter: None,
            run_at: None,
        }
    }
}

/// CSV file information
#[derive(Debug, Clone)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub column_count: usize,
    pub row_count: usize,
}

/// Result of a reshape run
#[derive(Debug, Clone)]
pub struct TransformReport {
    /// Reshaped table, as written
    pub output: OutputTable,

    /// Profile used
    pub profile: String,

    /// Item-name columns of the meal blocks that were found
    pub meal_blocks: Vec<usize>,

    /// Entries in the menu mapping (0 when identity)
    pub mapping_size: usize,

    /// Source columns the profile reads that the input lacks
    pub missing_sources: Vec<String>,

    /// Warnings emitted during the run
    pub warnings: Vec<String>,

    pub csv_info: CsvInfo,
}

/// Item-name columns of the meal blocks present in `table`.
pub fn locate_meal_blocks(table: &SourceTable, locator: &dyn BlockLocator) -> Vec<usize> {
    locator.locate(&table.headers)
}

/// Extract every located meal block from one row, in block order.
pub fn extract_blocks(
    row: &[String],
    column_count: usize,
    block_indices: &[usize],
    layout: &BlockLayout,
) -> Vec<MealBlock> {
    block_indices
        .iter()
        .map(|&idx| extract_block(row, column_count, idx, layout))
        .collect()
}

/// Assembles output rows for one table under one profile.
///
/// Header positions and the run stamp are resolved once, up front.
pub struct OutputRowBuilder<'a> {
    profile: &'a Profile,
    source_index: HashMap<&'a str, Option<usize>>,
    mapping: Option<&'a MenuMapping>,
    timestamp: String,
    run_at: NaiveDateTime,
}

impl<'a> OutputRowBuilder<'a> {
    pub fn new(
        profile: &'a Profile,
        headers: &[String],
        mapping: Option<&'a MenuMapping>,
        run_at: NaiveDateTime,
    ) -> Self {
        let source_index = profile
            .source_columns()
            .into_iter()
            .map(|col| (col, headers.iter().position(|h| h == col)))
            .collect();

        Self {
            profile,
            source_index,
            mapping: if profile.map_menu_names { mapping } else { None },
            timestamp: run_at.format(&profile.timestamp_format).to_string(),
            run_at,
        }
    }

    /// Build the output row for the `row_index`-th source row.
    pub fn build_row(&self, row: &[String], blocks: &[MealBlock], row_index: usize) -> Vec<String> {
        self.profile
            .fields
            .iter()
            .map(|field| match &field.rule {
                FieldRule::Source {
                    column,
                    default,
                    default_without_blocks,
                } => match self.source_index.get(column.as_str()).copied().flatten() {
                    Some(idx) => SourceTable::value_at(row, idx).to_string(),
                    None => match default_without_blocks {
                        Some(fallback) if blocks.is_empty() => fallback.clone(),
                        _ => default.clone(),
                    },
                },
                FieldRule::Blank => String::new(),
                FieldRule::Slot { slot, part } => {
                    let value = slot
                        .checked_sub(1)
                        .and_then(|i| blocks.get(i))
                        .map(|b| b.part(*part))
                        .unwrap_or("");
                    match (part, self.mapping) {
                        (BlockPart::Name, Some(mapping)) => {
                            map_menu_name(value, mapping)
                        }
                        _ => value.to_string(),
                    }
                }
                FieldRule::Timestamp => self.timestamp.clone(),
                FieldRule::Increment => self.profile.increment.value(row_index, self.run_at.date()),
            })
            .collect()
    }
}

/// Run the profile's cleanup rules over the assembled table.
pub fn post_process(profile: &Profile, output: &mut OutputTable) -> ProfileResult<()> {
    for rule in &profile.cleanup {
        rule.apply(&output.headers, &mut output.rows)?;
    }
    Ok(())
}

/// Reshape a parsed table. One output row per input row, in input order.
pub fn transform_table(
    table: &SourceTable,
    profile: &Profile,
    mapping: Option<&MenuMapping>,
    run_at: NaiveDateTime,
) -> ProfileResult<OutputTable> {
    let block_indices = locate_meal_blocks(table, profile.locator.locator());
    let builder = OutputRowBuilder::new(profile, &table.headers, mapping, run_at);
    let column_count = table.column_count();

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let blocks = extract_blocks(row, column_count, &block_indices, &profile.layout);
            builder.build_row(row, &blocks, i)
        })
        .collect();

    let mut output = OutputTable {
        headers: profile.headers(),
        rows,
    };
    post_process(profile, &mut output)?;
    Ok(output)
}

/// Resolve the menu mapping for a run.
///
/// Returns the mapping (if the profile uses one) and any warning raised.
fn resolve_mapping(
    profile: &Profile,
    options: &TransformOptions,
) -> PipelineResult<(Option<MenuMapping>, Option<String>)> {
    match (&options.mapping_path, profile.map_menu_names) {
        (path, true) => {
            let path = path
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_MAPPING_PATH));
            log_info(format!("📖 Reading menu mapping: {}", path.display()));
            let (mapping, warning) = MenuMapping::load_or_identity(path)?;
            if warning.is_none() {
                log_success(format!("Loaded {} menu name mappings", mapping.len()));
            }
            Ok((Some(mapping), warning))
        }
        (Some(path), false) => {
            let warning = format!(
                "Profile '{}' does not map menu names; ignoring {}",
                profile.name,
                path.display()
            );
            log_warning(&warning);
            Ok((None, Some(warning)))
        }
        (None, false) => Ok((None, None)),
    }
}

/// Reshape `input` into `output` following `options`.
///
/// A missing input file is fatal; a missing mapping file only warns.
pub fn transform_file(
    input: &Path,
    output: &Path,
    options: &TransformOptions,
) -> PipelineResult<TransformReport> {
    let profile = Profile::load(&options.profile)?;
    log_info(format!("🗂️  Profile: {} ({})", profile.name, profile.description));

    log_info(format!("📖 Reading CSV file: {}", input.display()));
    let parsed = read_table_file_with(input, options.delimiter)?;
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!(
        "Read {} rows, {} columns",
        parsed.table.row_count(),
        parsed.table.column_count()
    ));

    let mut warnings = Vec::new();

    let (mapping, mapping_warning) = resolve_mapping(&profile, options)?;
    warnings.extend(mapping_warning);

    let missing_sources = profile.missing_sources(&parsed.table.headers);
    if !missing_sources.is_empty() {
        log_info(format!("{} source columns absent, using defaults:", missing_sources.len()));
        for col in &missing_sources {
            log_info_indent(col, 1);
        }
    }

    let meal_blocks = locate_meal_blocks(&parsed.table, profile.locator.locator());
    log_info(format!(
        "🍱 Meal blocks: {} found ({})",
        meal_blocks.len(),
        profile.locator.describe()
    ));

    let run_at = options.run_at.unwrap_or_else(|| Local::now().naive_local());
    let table = transform_table(&parsed.table, &profile, mapping.as_ref(), run_at)?;

    write_table_file(output, &table.headers, &table.rows)?;
    log_success(format!(
        "Processed {} rows with {} meal blocks → {}",
        table.rows.len(),
        meal_blocks.len(),
        output.display()
    ));

    Ok(TransformReport {
        profile: profile.name,
        meal_blocks,
        mapping_size: mapping.as_ref().map(MenuMapping::len).unwrap_or(0),
        missing_sources,
        warnings,
        csv_info: CsvInfo {
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            column_count: parsed.table.column_count(),
            row_count: parsed.table.row_count(),
        },
        output: table,
    })
}

/// Collect the distinct menu names of `input` and write them to `output`.
pub fn harvest_file(input: &Path, output: &Path, profile: &str) -> PipelineResult<Vec<String>> {
    let profile = Profile::load(profile)?;
    log_info(format!("📖 Reading CSV file: {}", input.display()));
    let parsed = read_table_file(input)?;

    let names = harvest_menu_names(&parsed.table, profile.locator.locator());
    write_menu_names(output, &names)?;
    log_success(format!("Found {} unique menu names → {}", names.len(), output.display()));

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, PipelineError};
    use crate::parser::{parse_bytes_auto, UTF8_BOM};
    use crate::transform::profile::{profile_v1, profile_v2, profile_v3};
    use chrono::NaiveDate;

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    /// A 150-column export with named passthrough columns up front and meal
    /// blocks at 90 and 102 only.
    fn wide_export(rows: &[(&str, &str, &str, &str)]) -> SourceTable {
        let mut headers: Vec<String> = (0..150).map(|i| format!("col{}", i)).collect();
        headers[0] = "予約日".into();
        headers[1] = "団体名".into();
        headers[2] = "到着時刻".into();
        headers[3] = "食事人数".into();
        headers[4] = "業者住所".into();

        let rows = rows
            .iter()
            .map(|(group, menu, remarks, second_menu)| {
                let mut row = vec![String::new(); 150];
                row[0] = "2024/05/01".into();
                row[1] = group.to_string();
                row[2] = "12:00".into();
                row[3] = "20".into();
                row[4] = "東京都千代田区 ".into();
                row[87] = "20".into();
                row[90] = menu.to_string();
                row[91] = "5000".into();
                row[97] = remarks.to_string();
                row[102] = second_menu.to_string();
                row
            })
            .collect();

        SourceTable::new(headers, rows)
    }

    #[test]
    fn test_row_count_and_header_order() {
        let table = wide_export(&[
            ("山田様", "会席A", "", ""),
            ("佐藤様", "会席B", "", ""),
            ("鈴木様", "", "", ""),
        ]);
        let profile = profile_v3();
        let out = transform_table(&table, &profile, None, run_at()).unwrap();

        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.headers, profile.headers());
        assert!(out.rows.iter().all(|r| r.len() == out.headers.len()));
    }

    #[test]
    fn test_v3_row_contents() {
        let table = wide_export(&[("山田様", "Salmon Set", "+Extra spicy", "Soup")]);
        let mapping = MenuMapping::from_pairs([("Salmon Set", "Salmon Course")]);
        let out = transform_table(&table, &profile_v3(), Some(&mapping), run_at()).unwrap();

        assert_eq!(out.get(0, "予約日"), Some("2024/05/01"));
        assert_eq!(out.get(0, "団体名（お客様名）"), Some("山田様"));
        assert_eq!(out.get(0, "予約時間"), Some("12:00"));
        assert_eq!(out.get(0, "お客様人数"), Some("20"));
        assert_eq!(out.get(0, "お料理名１"), Some("Salmon Course"));
        assert_eq!(out.get(0, "単価１"), Some("5000"));
        assert_eq!(out.get(0, "料理１の数量"), Some("20"));
        assert_eq!(out.get(0, "料理備考１"), Some("Extra spicy"));
        assert_eq!(out.get(0, "お料理名2"), Some("Soup"));
        assert_eq!(out.get(0, "住所"), Some("東京都千代田区"));
        assert_eq!(out.get(0, "タイムスタンプ"), Some("2024-05-01 09:30:00"));
        assert_eq!(out.get(0, "Increment"), Some("202405010001"));
    }

    #[test]
    fn test_absent_blocks_leave_slots_empty() {
        let table = wide_export(&[("山田様", "会席A", "", "")]);
        let out = transform_table(&table, &profile_v3(), None, run_at()).unwrap();

        // blocks 114, 126, 138 exist as columns but hold nothing; slot 6 has no block
        for slot in 3..=6 {
            for name in [
                format!("お料理名{}", slot),
                format!("料理備考{}", slot),
                format!("料理{}の数量", slot),
                format!("単価{}", slot),
            ] {
                assert_eq!(out.get(0, &name), Some(""), "{}", name);
            }
        }
    }

    #[test]
    fn test_narrow_table_has_full_schema() {
        let table = SourceTable::new(
            vec!["予約日".into(), "団体名".into()],
            vec![vec!["2024/05/01".into(), "山田様".into()]],
        );
        let profile = profile_v2();
        let out = transform_table(&table, &profile, None, run_at()).unwrap();

        assert_eq!(out.headers, profile.headers());
        assert_eq!(out.get(0, "お料理名１"), Some(""));
        assert_eq!(out.get(0, "単価１"), Some(""));
        assert_eq!(out.get(0, "電話番号"), Some(""));
        assert_eq!(out.get(0, "Increment"), Some("1"));
    }

    #[test]
    fn test_v1_header_scan_offsets() {
        let headers: Vec<String> = ["予約日", "数量", "x", "食事名", "単価", "a", "b", "c", "d", "備考欄"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row: Vec<String> = ["2024/05/01", "3", "", "幕の内", "1800", "", "", "", "", "卵抜き"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let table = SourceTable::new(headers, vec![row]);
        let out = transform_table(&table, &profile_v1(), None, run_at()).unwrap();

        assert_eq!(out.get(0, "お料理名１"), Some("幕の内"));
        assert_eq!(out.get(0, "単価１"), Some("1800"));
        assert_eq!(out.get(0, "料理１の数量"), Some("3"));
        assert_eq!(out.get(0, "料理備考１"), Some("卵抜き"));
        // guest count header absent, but a block was found
        assert_eq!(out.get(0, "お客様人数"), Some(""));
    }

    #[test]
    fn test_v1_guest_count_zero_when_no_blocks() {
        let table = SourceTable::new(
            vec!["予約日".into(), "団体名".into()],
            vec![vec!["2024/05/01".into(), "山田様".into()]],
        );
        let out = transform_table(&table, &profile_v1(), None, run_at()).unwrap();
        assert_eq!(out.get(0, "お客様人数"), Some("0"));

        let with_count = SourceTable::new(
            vec!["予約日".into(), "食事人数".into()],
            vec![vec!["2024/05/01".into(), "12".into()]],
        );
        let out = transform_table(&with_count, &profile_v1(), None, run_at()).unwrap();
        assert_eq!(out.get(0, "お客様人数"), Some("12"));
    }

    #[test]
    fn test_mapping_ignored_by_profiles_without_it() {
        let table = wide_export(&[("山田様", "Salmon Set", "+memo", "")]);
        let mapping = MenuMapping::from_pairs([("Salmon Set", "Salmon Course")]);
        let out = transform_table(&table, &profile_v2(), Some(&mapping), run_at()).unwrap();

        assert_eq!(out.get(0, "お料理名１"), Some("Salmon Set"));
        assert_eq!(out.get(0, "料理備考１"), Some("+memo"));
    }

    #[test]
    fn test_cleanup_trims_trailing_whitespace() {
        let table = wide_export(&[("山田様 ", "会席A", "No notes ", "")]);
        let out = transform_table(&table, &profile_v3(), None, run_at()).unwrap();

        assert_eq!(out.get(0, "料理備考１"), Some("No notes"));
        assert_eq!(out.get(0, "団体名（お客様名）"), Some("山田様"));
    }

    #[test]
    fn test_increments_restart_per_run() {
        let table = wide_export(&[("a", "", "", ""), ("b", "", "", ""), ("c", "", "", "")]);
        let profile = profile_v3();
        let first = transform_table(&table, &profile, None, run_at()).unwrap();
        let second = transform_table(&table, &profile, None, run_at()).unwrap();

        assert_eq!(
            first.column("Increment"),
            vec!["202405010001", "202405010002", "202405010003"]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_idempotent_apart_from_stamps() {
        let table = wide_export(&[("山田様", "会席A", "+x", "Soup")]);
        let profile = profile_v3();
        let later = run_at() + chrono::Duration::days(1);
        let a = transform_table(&table, &profile, None, run_at()).unwrap();
        let b = transform_table(&table, &profile, None, later).unwrap();

        let stamp_cols = a.headers.len() - 2;
        assert_eq!(a.rows[0][..stamp_cols], b.rows[0][..stamp_cols]);
        assert_ne!(a.rows[0][stamp_cols..], b.rows[0][stamp_cols..]);
    }

    fn write_export(dir: &Path, table: &SourceTable) -> PathBuf {
        let path = dir.join("source_data.csv");
        write_table_file(&path, &table.headers, &table.rows).unwrap();
        path
    }

    #[test]
    fn test_transform_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_export(dir.path(), &wide_export(&[("山田様", "Salmon Set", "", "")]));
        let mapping_path = dir.path().join("menu_mapping.csv");
        std::fs::write(&mapping_path, "old_name,new_name\nSalmon Set,Salmon Course\n").unwrap();
        let output = dir.path().join("out").join("transformed_data.csv");

        let options = TransformOptions {
            mapping_path: Some(mapping_path),
            run_at: Some(run_at()),
            ..TransformOptions::default()
        };
        let report = transform_file(&input, &output, &options).unwrap();

        assert_eq!(report.profile, "v3");
        assert_eq!(report.meal_blocks, vec![90, 102, 114, 126, 138]);
        assert_eq!(report.mapping_size, 1);
        assert!(report.warnings.is_empty());
        assert!(report.missing_sources.contains(&"業者名".to_string()));

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let written = parse_bytes_auto(&bytes).unwrap().table;
        assert_eq!(written.headers, profile_v3().headers());
        assert_eq!(written.row_count(), 1);
        let name_idx = written.column_index("お料理名１").unwrap();
        assert_eq!(written.rows[0][name_idx], "Salmon Course");
    }

    #[test]
    fn test_missing_mapping_file_warns_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_export(dir.path(), &wide_export(&[("山田様", "Salmon Set", "", "")]));
        let output = dir.path().join("transformed_data.csv");

        let options = TransformOptions {
            mapping_path: Some(dir.path().join("menu_mapping.csv")),
            run_at: Some(run_at()),
            ..TransformOptions::default()
        };
        let report = transform_file(&input, &output, &options).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.mapping_size, 0);
        assert_eq!(report.output.get(0, "お料理名１"), Some("Salmon Set"));
    }

    #[test]
    fn test_unconfigured_mapping_reads_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_export(dir.path(), &wide_export(&[("山田様", "Salmon Set", "", "")]));
        let output = dir.path().join("transformed_data.csv");

        let options = TransformOptions {
            run_at: Some(run_at()),
            ..TransformOptions::default()
        };
        let report = transform_file(&input, &output, &options).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains(DEFAULT_MAPPING_PATH));
        assert_eq!(report.output.get(0, "お料理名１"), Some("Salmon Set"));
    }

    #[test]
    fn test_mapping_path_ignored_by_profiles_without_it() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_export(dir.path(), &wide_export(&[("山田様", "会席A", "", "")]));

        let unconfigured = TransformOptions {
            profile: "v2".to_string(),
            run_at: Some(run_at()),
            ..TransformOptions::default()
        };
        let report = transform_file(&input, &dir.path().join("a.csv"), &unconfigured).unwrap();
        assert!(report.warnings.is_empty());

        let configured = TransformOptions {
            mapping_path: Some(dir.path().join("menu_mapping.csv")),
            ..unconfigured
        };
        let report = transform_file(&input, &dir.path().join("b.csv"), &configured).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("does not map menu names"));
    }

    #[test]
    fn test_delimiter_override() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source_data.csv");
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("予約日;a;b;c,団体名\n2024/05/01;1;2;3,山田様\n".as_bytes());
        std::fs::write(&input, bytes).unwrap();

        let detected = TransformOptions {
            profile: "v2".to_string(),
            run_at: Some(run_at()),
            ..TransformOptions::default()
        };
        let report = transform_file(&input, &dir.path().join("a.csv"), &detected).unwrap();
        assert_eq!(report.csv_info.delimiter, ';');
        assert_eq!(report.output.get(0, "団体名（お客様名）"), Some(""));

        let forced = TransformOptions {
            delimiter: Some(','),
            ..detected
        };
        let report = transform_file(&input, &dir.path().join("b.csv"), &forced).unwrap();
        assert_eq!(report.csv_info.delimiter, ',');
        assert_eq!(report.csv_info.column_count, 2);
        assert_eq!(report.output.get(0, "団体名（お客様名）"), Some("山田様"));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = transform_file(
            &dir.path().join("source_data.csv"),
            &dir.path().join("out.csv"),
            &TransformOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Csv(CsvError::Io { .. })));
    }

    #[test]
    fn test_harvest_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_export(
            dir.path(),
            &wide_export(&[
                ("a", "会席B", "", "会席A"),
                ("b", "会席A", "", ""),
            ]),
        );
        let output = dir.path().join("unique_menu_names.txt");

        let names = harvest_file(&input, &output, "v2").unwrap();
        assert_eq!(names, vec!["会席A", "会席B"]);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "会席A\n会席B\n");
    }
}

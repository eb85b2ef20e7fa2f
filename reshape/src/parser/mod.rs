//! CSV reading and writing with encoding and delimiter auto-detection.
//!
//! Reservation exports usually arrive as BOM-marked UTF-8, but older exports
//! are Shift_JIS. Values are kept as raw text; nothing is trimmed or typed here.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use encoding_rs::{Encoding, UTF_8};

use crate::error::{CsvError, CsvResult};
use crate::models::SourceTable;

/// UTF-8 byte-order mark, written ahead of every output table.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: SourceTable,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// A UTF-8 BOM settles it; otherwise chardet decides.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if bytes.starts_with(UTF8_BOM) {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "shift_jis" | "sjis" | "cp932" | "windows-31j" => "shift_jis".to_string(),
        "euc-jp" | "eucjp" => "euc-jp".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the named encoding.
///
/// Unknown labels fall back to lossy UTF-8. A leading BOM is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let encoding = Encoding::for_label(encoding.as_bytes()).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV text into a [`SourceTable`].
///
/// Rows may be shorter or longer than the header; blank lines are skipped.
pub fn parse_table(content: &str, delimiter: char) -> CsvResult<SourceTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(u8::try_from(delimiter).unwrap_or(b','))
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(SourceTable::new(headers, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    parse_bytes_with(bytes, None)
}

/// Parse CSV bytes, auto-detecting the delimiter unless one is given.
pub fn parse_bytes_with(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = parse_table(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Read and parse a CSV file with auto-detection.
///
/// A missing file is reported as [`CsvError::Io`].
pub fn read_table_file<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    read_table_file_with(path, None)
}

/// Read and parse a CSV file, optionally forcing the delimiter.
pub fn read_table_file_with<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
) -> CsvResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| CsvError::io(path, e))?;
    parse_bytes_with(&bytes, delimiter)
}

/// Write a table as BOM-prefixed UTF-8 CSV.
pub fn write_table<W: Write>(mut writer: W, headers: &[String], rows: &[Vec<String>]) -> CsvResult<()> {
    writer
        .write_all(UTF8_BOM)
        .map_err(|e| CsvError::Parse(e.into()))?;

    let mut csv_writer = WriterBuilder::new().flexible(false).from_writer(writer);
    csv_writer.write_record(headers)?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush().map_err(|e| CsvError::Parse(e.into()))?;
    Ok(())
}

/// Write a table to `path` (see [`write_table`]).
pub fn write_table_file<P: AsRef<Path>>(
    path: P,
    headers: &[String],
    rows: &[Vec<String>],
) -> CsvResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CsvError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| CsvError::io(path, e))?;
    write_table(BufWriter::new(file), headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_table("name,age\nAlice,30\nBob,25", ',').unwrap();

        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1], vec!["Bob", "25"]);
    }

    #[test]
    fn test_quoted_values_keep_commas() {
        let table = parse_table("name,remarks\n\"Sato\",\"no fish, no nuts\"", ',').unwrap();
        assert_eq!(table.rows[0][1], "no fish, no nuts");
    }

    #[test]
    fn test_values_are_not_trimmed() {
        let table = parse_table("a,b\n x ,y  ", ',').unwrap();
        assert_eq!(table.rows[0], vec![" x ", "y  "]);
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let table = parse_table("a,b,c\n1\n1,2,3,4", ',').unwrap();
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_table("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_table("", ','), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("予約日,団体名\n2024-05-01,山田様\n".as_bytes());

        let result = parse_bytes_auto(&bytes).unwrap();
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.delimiter, ',');
        assert_eq!(result.table.headers[0], "予約日");
        assert_eq!(result.table.column_index("団体名"), Some(1));
    }

    #[test]
    fn test_shift_jis_decoding() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("団体名");
        assert_eq!(decode_content(&bytes, "shift_jis"), "団体名");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_forced_delimiter_overrides_detection() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("予約日;a;b;c,団体名\n2024/05/01;1;2;3,山田様\n".as_bytes());
        let bytes = bytes.as_slice();

        let detected = parse_bytes_with(bytes, None).unwrap();
        assert_eq!(detected.delimiter, ';');
        assert_eq!(detected.table.column_index("団体名"), None);

        let forced = parse_bytes_with(bytes, Some(',')).unwrap();
        assert_eq!(forced.delimiter, ',');
        assert_eq!(forced.table.headers, vec!["予約日;a;b;c", "団体名"]);
        assert_eq!(forced.table.rows[0][1], "山田様");
    }

    #[test]
    fn test_written_table_starts_with_bom() {
        let mut out = Vec::new();
        let headers = vec!["お料理名１".to_string(), "単価１".to_string()];
        let rows = vec![vec!["会席, 松".to_string(), "5000".to_string()]];
        write_table(&mut out, &headers, &rows).unwrap();

        assert!(out.starts_with(UTF8_BOM));
        let text = String::from_utf8(out[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "お料理名１,単価１\n\"会席, 松\",5000\n");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table_file(dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, CsvError::Io { .. }));
    }
}

//! Registration CSV ingestion with encoding and delimiter auto-detection.
//!
//! Produces raw headers plus positional rows of typed [`CellValue`]s, the
//! input the report builder expects. No business rules here: dynamic typing
//! only (numbers, `true`/`false`, empty → null); the Yes/No normalization
//! belongs to the cell sanitizer.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::report::CellValue;

/// Result of parsing with metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Header record exactly as read, duplicates included.
    pub raw_headers: Vec<String>,
    /// Data rows, positionally aligned with `raw_headers`.
    pub rows: Vec<Vec<CellValue>>,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "utf-16le" => "utf-16le".to_string(),
        "utf-16be" => "utf-16be".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Single-byte encodings and unrecognized charsets decode lossily; UTF-16
/// input with a truncated or malformed code unit is rejected instead of
/// silently producing replacement characters.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        "utf-16le" => decode_utf16(encoding_rs::UTF_16LE, bytes, encoding)?,
        "utf-16be" => decode_utf16(encoding_rs::UTF_16BE, bytes, encoding)?,
        // Fallback: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    Ok(decoded)
}

fn decode_utf16(
    codec: &'static encoding_rs::Encoding,
    bytes: &[u8],
    encoding: &str,
) -> CsvResult<String> {
    let (decoded, _, had_errors) = codec.decode(bytes);
    if had_errors {
        return Err(CsvError::EncodingError(format!(
            "invalid {encoding} byte sequence"
        )));
    }
    Ok(decoded.to_string())
}

/// Detect the delimiter by counting occurrences in the first line.
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

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("registrations.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.rows.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(strip_bom(&content));

    parse_str(&content, delimiter, encoding)
}

/// Parse already-decoded CSV text with an explicit delimiter.
pub fn parse_str(
    content: &str,
    delimiter: char,
    encoding: impl Into<String>,
) -> CsvResult<ParseResult> {
    let content = strip_bom(content);
    let (raw_headers, rows) = read_records(content, delimiter)?;

    Ok(ParseResult {
        raw_headers,
        rows,
        encoding: encoding.into(),
        delimiter,
    })
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Read the header record and typed data rows.
fn read_records(content: &str, delimiter: char) -> CsvResult<(Vec<String>, Vec<Vec<CellValue>>)> {
    // The csv crate splits on a single byte.
    if !delimiter.is_ascii() {
        return Err(CsvError::InvalidDelimiter(delimiter));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let raw_headers: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(|s| s.trim().to_string()).collect(),
        None => return Err(CsvError::EmptyFile),
    };
    if raw_headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(infer_cell).collect::<Vec<_>>());
    }

    // An export ending in a newline leaves one blank row behind; drop it
    // before report building.
    if rows
        .last()
        .is_some_and(|row: &Vec<CellValue>| row.iter().all(CellValue::is_null))
    {
        rows.pop();
    }

    Ok((raw_headers, rows))
}

/// Dynamic typing for one raw field: empty → null, exact `true`/`false` →
/// bool, numeric-looking text → number, anything else stays a string.
fn infer_cell(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Null;
    }
    match field {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }

    let trimmed = field.trim();
    if looks_numeric(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Num(n);
            }
        }
    }

    CellValue::Str(field.to_string())
}

/// Cheap pre-check so `parse::<f64>` never accepts "inf"/"NaN" spellings.
fn looks_numeric(s: &str) -> bool {
    let starts_ok = s
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.');
    starts_ok && s.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let csv = "Name,Age\nAlice,30\nBob,25";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(result.raw_headers, vec!["Name", "Age"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0][0], CellValue::Str("Alice".into()));
        assert_eq!(result.rows[0][1], CellValue::Num(30.0));
    }

    #[test]
    fn test_dynamic_typing() {
        assert_eq!(infer_cell(""), CellValue::Null);
        assert_eq!(infer_cell("true"), CellValue::Bool(true));
        assert_eq!(infer_cell("false"), CellValue::Bool(false));
        assert_eq!(infer_cell("True"), CellValue::Str("True".into()));
        assert_eq!(infer_cell("42"), CellValue::Num(42.0));
        assert_eq!(infer_cell("-3.5"), CellValue::Num(-3.5));
        assert_eq!(infer_cell("007"), CellValue::Num(7.0));
        assert_eq!(infer_cell("1e3"), CellValue::Num(1000.0));
        assert_eq!(infer_cell("inf"), CellValue::Str("inf".into()));
        assert_eq!(infer_cell("NaN"), CellValue::Str("NaN".into()));
        assert_eq!(infer_cell("1.2.3"), CellValue::Str("1.2.3".into()));
        assert_eq!(infer_cell("-"), CellValue::Str("-".into()));
        assert_eq!(
            infer_cell("June 26 - June 30"),
            CellValue::Str("June 26 - June 30".into())
        );
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let csv = "Sections,Name\n\"Week 1: June 26 - June 30, Week 2: July 3 - July 7\",Alex";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(
            result.rows[0][0],
            CellValue::Str("Week 1: June 26 - June 30, Week 2: July 3 - July 7".into())
        );
        assert_eq!(result.rows[0][1], CellValue::Str("Alex".into()));
    }

    #[test]
    fn test_duplicate_headers_preserved_raw() {
        let csv = "A,B,A\n1,2,3";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();
        assert_eq!(result.raw_headers, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_trailing_blank_row_discarded() {
        let csv = "A,B\n1,2\n,";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();
        assert_eq!(result.rows.len(), 1);

        // a blank row in the middle survives
        let csv = "A,B\n,\n1,2";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows[0].iter().all(CellValue::is_null));
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let csv = "A,B,C\n1\n1,2,3,4";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();
        assert_eq!(result.rows[0].len(), 1);
        assert_eq!(result.rows[1].len(), 4);
    }

    #[test]
    fn test_empty_file_error() {
        assert!(matches!(
            parse_bytes_auto(b""),
            Err(CsvError::EmptyFile)
        ));
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_comma() {
        assert_eq!(detect_delimiter("single-column"), ',');
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Name,Age\nAlice,30");
        let result = parse_bytes_auto(&bytes).unwrap();
        assert_eq!(result.raw_headers[0], "Name");
    }

    #[test]
    fn test_windows_1252_decoding() {
        // "Émile" with a 1252 É
        let bytes: &[u8] = &[0xC9, 0x6D, 0x69, 0x6C, 0x65];
        let decoded = decode_content(bytes, "windows-1252").unwrap();
        assert_eq!(decoded, "Émile");
    }

    #[test]
    fn test_truncated_utf16_rejected() {
        // "A" in UTF-16LE followed by a lone trailing byte
        let bytes: &[u8] = &[0x41, 0x00, 0x41];
        assert!(matches!(
            decode_content(bytes, "utf-16le"),
            Err(CsvError::EncodingError(_))
        ));
        assert!(matches!(
            decode_content(&[0x00], "utf-16be"),
            Err(CsvError::EncodingError(_))
        ));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        assert!(matches!(
            parse_str("a§b\n1§2", '§', "utf-8"),
            Err(CsvError::InvalidDelimiter('§'))
        ));
    }

    #[test]
    fn test_explicit_delimiter_parse() {
        let result = parse_str("a|b\n1|2", '|', "utf-8").unwrap();
        assert_eq!(result.raw_headers, vec!["a", "b"]);
        assert_eq!(result.rows[0][1], CellValue::Num(2.0));
        assert_eq!(result.delimiter, '|');
    }
}

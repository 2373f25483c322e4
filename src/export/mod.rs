//! CSV export of an enriched report.
//!
//! Every field is quoted, matching what the downstream import tool expects.
//! Cells serialize as their raw text, `true`/`false` for booleans, the
//! shortest decimal for numbers, and the empty string for null or absent
//! cells; exports parse back into the same headers and values modulo the
//! reader's dynamic typing.

use std::path::Path;

use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};

use crate::error::{ExportError, ExportResult};
use crate::report::{CellValue, Header, Row};

/// Fixed stem of the export filename; the import tool matches on it.
const EXPORT_FILE_PREFIX: &str = "FAMILYID_IMPORT_FOR_ACT";

/// Serialize `(headers, rows)` to CSV text with every field quoted.
///
/// Column order follows `headers`; cells a row lacks export as empty
/// fields, and cells under headers not in the list are not exported.
pub fn to_csv_string(headers: &[Header], rows: &[Row]) -> ExportResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|header| cell_field(row.value(header))))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::BufferError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::BufferError(e.to_string()))
}

/// Write the export straight to a file.
pub fn write_csv_file<P: AsRef<Path>>(
    path: P,
    headers: &[Header],
    rows: &[Row],
) -> ExportResult<()> {
    let content = to_csv_string(headers, rows)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// `FAMILYID_IMPORT_FOR_ACT_<Www Mmm DD YYYY>.csv`, the filename pattern
/// the import tool was set up around.
pub fn export_filename(date: NaiveDate) -> String {
    format!("{}_{}.csv", EXPORT_FILE_PREFIX, date.format("%a %b %d %Y"))
}

/// One exported field.
fn cell_field(value: &CellValue) -> String {
    match value {
        CellValue::Str(s) => s.clone(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Num(n) => n.to_string(),
        CellValue::Null => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_bytes_auto;
    use crate::report::Report;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(header, value)| (header.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_every_field_quoted() {
        let headers = vec!["Name".to_string(), "Age".to_string()];
        let rows = vec![row(&[
            ("Name", CellValue::from("Alex")),
            ("Age", CellValue::Num(6.0)),
        ])];

        let csv = to_csv_string(&headers, &rows).unwrap();
        assert_eq!(csv, "\"Name\",\"Age\"\n\"Alex\",\"6\"\n");
    }

    #[test]
    fn test_missing_and_null_cells_export_empty() {
        let headers = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let rows = vec![row(&[
            ("A", CellValue::from("x")),
            ("B", CellValue::Null),
        ])];

        let csv = to_csv_string(&headers, &rows).unwrap();
        assert_eq!(csv.lines().nth(1), Some("\"x\",\"\",\"\""));
    }

    #[test]
    fn test_column_order_follows_headers() {
        let headers = vec!["B".to_string(), "A".to_string()];
        let rows = vec![row(&[
            ("A", CellValue::from("1")),
            ("B", CellValue::from("2")),
        ])];

        let csv = to_csv_string(&headers, &rows).unwrap();
        assert_eq!(csv.lines().nth(1), Some("\"2\",\"1\""));
    }

    #[test]
    fn test_embedded_commas_and_quotes_survive() {
        let headers = vec!["Weeks".to_string()];
        let rows = vec![row(&[(
            "Weeks",
            CellValue::from("June 26 - June 30, July 3 - July 7"),
        )])];

        let csv = to_csv_string(&headers, &rows).unwrap();
        assert_eq!(
            csv.lines().nth(1),
            Some("\"June 26 - June 30, July 3 - July 7\"")
        );
    }

    #[test]
    fn test_export_parse_round_trip() {
        let headers = vec![
            "Name".to_string(),
            "Participant Age".to_string(),
            "Week 1".to_string(),
            "Weeks".to_string(),
        ];
        let rows = vec![
            row(&[
                ("Name", CellValue::from("Alex Doe")),
                ("Participant Age", CellValue::Num(6.0)),
                ("Week 1", CellValue::Num(1.0)),
                ("Weeks", CellValue::from("June 26 - June 30")),
            ]),
            row(&[
                ("Name", CellValue::from("Sam Lee")),
                ("Participant Age", CellValue::Num(11.0)),
                ("Weeks", CellValue::from("")),
            ]),
        ];

        let csv = to_csv_string(&headers, &rows).unwrap();
        let parsed = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(parsed.raw_headers, headers);
        let mut diagnostics = crate::diagnostics::Diagnostics::new();
        let report = Report::build(&parsed.raw_headers, parsed.rows, &mut diagnostics);

        assert_eq!(report.headers, headers);
        assert_eq!(report.rows[0].str_value("Name"), "Alex Doe");
        assert_eq!(
            report.rows[0].value("Participant Age"),
            &CellValue::Num(6.0)
        );
        assert_eq!(report.rows[0].value("Week 1"), &CellValue::Num(1.0));
        // the empty string comes back as null under dynamic typing
        assert!(report.rows[1].value("Week 1").is_null());
    }

    #[test]
    fn test_export_filename_format() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(
            export_filename(date),
            "FAMILYID_IMPORT_FOR_ACT_Mon Jun 03 2024.csv"
        );
    }
}

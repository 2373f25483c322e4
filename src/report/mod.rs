//! Report data model: typed cells, ordered rows, and the report builder.
//!
//! A registration export is parsed into raw headers plus positional rows of
//! [`CellValue`]s, then built into a [`Report`]: deduplicated headers and one
//! key-ordered [`Row`] per data row. Key order is load-bearing: the header
//! list is always recomputed as the first-seen union of row keys, so rows use
//! an insertion-ordered map.
//!
//! | Piece            | Contract                                              |
//! |------------------|-------------------------------------------------------|
//! | [`sanitize_value`] | trim; `"Yes"`/`"Yes,…"` → true; `"No"`/`"No,…"` → false |
//! | [`Row::merge`]   | first truthy value wins across duplicate columns      |
//! | [`Report::build`] | positional build against the raw (non-deduped) headers |
//! | [`to_display_value`] | preview rendering: 50-char truncation, Yes/No, em dash |

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Column name. Exact string identity, case-sensitive.
pub type Header = String;

static NULL_CELL: CellValue = CellValue::Null;

// =============================================================================
// Cell Values
// =============================================================================

/// One typed cell, as produced by parsing with dynamic typing.
///
/// Serializes untagged so rows round-trip as plain JSON objects
/// (`{"Participant Age": 6.0, "Swim: Sign Off": true}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Str(String),
    Bool(bool),
    Num(f64),
    Null,
}

impl CellValue {
    /// Truthiness of a cell, mirroring the loose-typing rules the business
    /// logic was written against: empty string, `false`, `0`, `NaN`, and
    /// null are all "no value".
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Str(s) => !s.is_empty(),
            CellValue::Bool(b) => *b,
            CellValue::Num(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Null => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            CellValue::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Str(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Str(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Num(n)
    }
}

// =============================================================================
// Cell Sanitizer
// =============================================================================

/// Normalize one raw cell value.
///
/// Strings are trimmed; the registration form's acknowledgement answers
/// (`"Yes"` / `"Yes, I agree…"` / `"No"` / `"No, …"`) collapse to booleans.
/// Everything else passes through untouched. Pure and idempotent.
pub fn sanitize_value(value: CellValue) -> CellValue {
    match value {
        CellValue::Str(s) => {
            let trimmed = s.trim();
            if trimmed == "Yes" || trimmed.starts_with("Yes,") {
                CellValue::Bool(true)
            } else if trimmed == "No" || trimmed.starts_with("No,") {
                CellValue::Bool(false)
            } else if trimmed.len() == s.len() {
                CellValue::Str(s)
            } else {
                CellValue::Str(trimmed.to_string())
            }
        }
        other => other,
    }
}

// =============================================================================
// Display Formatting
// =============================================================================

/// Placeholder shown for absent values.
pub const NULL_PLACEHOLDER: &str = "—";

/// Maximum characters of a string cell shown before truncation.
const DISPLAY_TRUNCATE_AT: usize = 50;

/// Render a cell for table previews.
///
/// Numbers print their shortest decimal form, strings are trimmed and cut at
/// 50 characters with an `...` suffix, booleans read `Yes`/`No`, and null
/// shows an em dash.
pub fn to_display_value(value: &CellValue) -> String {
    match value {
        CellValue::Num(n) => n.to_string(),
        CellValue::Str(s) => {
            let trimmed = s.trim();
            if trimmed.chars().count() > DISPLAY_TRUNCATE_AT {
                let cut: String = trimmed.chars().take(DISPLAY_TRUNCATE_AT).collect();
                format!("{}...", cut)
            } else {
                trimmed.to_string()
            }
        }
        CellValue::Bool(true) => "Yes".to_string(),
        CellValue::Bool(false) => "No".to_string(),
        CellValue::Null => NULL_PLACEHOLDER.to_string(),
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One participant row: an insertion-ordered header → cell mapping.
///
/// Re-inserting an existing key keeps its position; removal preserves the
/// order of the remaining keys. Both properties feed header recomputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<Header, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(header)
    }

    /// Like [`Row::get`] but absent keys read as null.
    pub fn value(&self, header: &str) -> &CellValue {
        self.cells.get(header).unwrap_or(&NULL_CELL)
    }

    /// String content of a cell; absent or non-string cells read as `""`.
    pub fn str_value(&self, header: &str) -> &str {
        self.cells
            .get(header)
            .and_then(CellValue::as_str)
            .unwrap_or("")
    }

    pub fn is_truthy(&self, header: &str) -> bool {
        self.cells.get(header).is_some_and(CellValue::is_truthy)
    }

    pub fn contains(&self, header: &str) -> bool {
        self.cells.contains_key(header)
    }

    /// Insert or overwrite. An existing key keeps its position.
    pub fn set(&mut self, header: impl Into<Header>, value: CellValue) {
        self.cells.insert(header.into(), value);
    }

    /// Remove a cell, preserving the order of the remaining keys.
    pub fn remove(&mut self, header: &str) -> Option<CellValue> {
        self.cells.shift_remove(header)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Header> {
        self.cells.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Header, &CellValue)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Merge a value into a slot under the duplicate-column policy:
    /// the first truthy value wins, falsy values never displace a truthy
    /// one, and a null slot takes whatever comes next.
    ///
    /// Returns the dropped value when a truthy incoming value lost to a
    /// different truthy existing value (the only case worth diagnosing).
    pub fn merge(&mut self, header: &str, value: CellValue) -> Option<CellValue> {
        match self.cells.get(header) {
            None => {
                self.cells.insert(header.to_string(), value);
                None
            }
            Some(existing) if !existing.is_truthy() && value.is_truthy() => {
                self.cells.insert(header.to_string(), value);
                None
            }
            Some(existing) if existing.is_null() => {
                self.cells.insert(header.to_string(), value);
                None
            }
            Some(existing) if existing.is_truthy() && value.is_truthy() && *existing != value => {
                Some(value)
            }
            Some(_) => None,
        }
    }
}

impl FromIterator<(Header, CellValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (Header, CellValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// The table being transformed: unique ordered headers plus rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub headers: Vec<Header>,
    pub rows: Vec<Row>,
}

impl Report {
    /// Build a report from raw parsed arrays.
    ///
    /// Cells are matched positionally against the raw, non-deduplicated
    /// header list, sanitized, and merged under the duplicate-column policy;
    /// conflicts are recorded as [`DiagnosticKind::DuplicateColumn`]. Rows
    /// shorter than the header list simply lack the trailing keys; cells
    /// beyond the header list have no name and are dropped.
    pub fn build(
        raw_headers: &[String],
        raw_rows: Vec<Vec<CellValue>>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let headers = dedup_headers(raw_headers);

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_index, raw_row) in raw_rows.into_iter().enumerate() {
            let mut row = Row::new();
            for (position, value) in raw_row.into_iter().enumerate() {
                let Some(header) = raw_headers.get(position) else {
                    break;
                };
                let value = sanitize_value(value);
                if let Some(dropped) = row.merge(header, value) {
                    diagnostics.push(
                        row_index,
                        DiagnosticKind::DuplicateColumn,
                        format!(
                            "duplicate column '{}': kept '{}', dropped '{}'",
                            header,
                            to_display_value(row.value(header)),
                            to_display_value(&dropped),
                        ),
                    );
                }
            }
            rows.push(row);
        }

        Report { headers, rows }
    }

    /// Recompute `headers` as the first-seen union of keys across all rows.
    ///
    /// Run after every transform: it picks up newly added columns and drops
    /// columns no row has anymore.
    pub fn recompute_headers(&mut self) {
        let mut seen: IndexSet<Header> = IndexSet::new();
        for row in &self.rows {
            for key in row.keys() {
                if !seen.contains(key) {
                    seen.insert(key.clone());
                }
            }
        }
        self.headers = seen.into_iter().collect();
    }
}

/// Deduplicate headers by exact match, preserving first-seen order.
pub fn dedup_headers(raw_headers: &[String]) -> Vec<Header> {
    let mut seen: IndexSet<Header> = IndexSet::new();
    for header in raw_headers {
        if !seen.contains(header) {
            seen.insert(header.clone());
        }
    }
    seen.into_iter().collect()
}

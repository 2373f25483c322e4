//! Transforms shared by the camp and afterschool pipelines.

use crate::report::{CellValue, Header, Report};

pub const FIRST_NAME_COLUMN: &str = "Participant First Name";
pub const LAST_NAME_COLUMN: &str = "Participant Last Name";
pub const CONTACT_COLUMN: &str = "Contact";

/// Headers with this suffix hold sign-off acknowledgements.
pub const SIGN_OFF_SUFFIX: &str = ": Sign Off";

/// Right single quotation mark pasted in from word processors.
const CURLY_APOSTROPHE: char = '\u{2019}';

/// Columns dropped before any other processing runs.
pub fn default_removed_columns() -> Vec<Header> {
    vec!["Text".to_string()]
}

/// Delete the given columns from every row and from the header list.
pub fn remove_columns(report: &mut Report, columns: &[Header]) {
    for row in &mut report.rows {
        for column in columns {
            row.remove(column);
        }
    }
    report.headers.retain(|header| !columns.contains(header));
}

/// Coerce every sign-off column to a plain boolean.
///
/// The sanitizer already turned `"Yes, I agree..."` style cells into
/// booleans; this pass catches the free-text leftovers and fills absent
/// cells with `false`, so exports never carry a blank sign-off.
pub fn cast_sign_off_columns(report: &mut Report) {
    let sign_off_columns: Vec<Header> = report
        .headers
        .iter()
        .filter(|header| header.ends_with(SIGN_OFF_SUFFIX))
        .cloned()
        .collect();

    for row in &mut report.rows {
        for column in &sign_off_columns {
            let truthy = row.value(column).is_truthy();
            row.set(column.clone(), CellValue::Bool(truthy));
        }
    }
}

/// Replace curly apostrophes with ASCII ones in every string cell.
pub fn fix_weird_characters(report: &mut Report) {
    let headers = report.headers.clone();
    for row in &mut report.rows {
        for header in &headers {
            let Some(text) = row.value(header).as_str() else {
                continue;
            };
            if text.contains(CURLY_APOSTROPHE) {
                let fixed = text.replace(CURLY_APOSTROPHE, "'");
                row.set(header.clone(), CellValue::Str(fixed));
            }
        }
    }
}

/// Join the participant's first and last name into a `Contact` column.
///
/// Absent or non-text name cells contribute an empty string, so the result
/// can carry a leading or trailing space when a name is missing. The
/// column is always written.
pub fn assign_contact(report: &mut Report) {
    for row in &mut report.rows {
        let contact = format!(
            "{} {}",
            row.str_value(FIRST_NAME_COLUMN),
            row.str_value(LAST_NAME_COLUMN)
        );
        row.set(CONTACT_COLUMN, CellValue::Str(contact));
    }
}

//! Afterschool transforms: weekday selection and program assignment.

use crate::error::{TransformError, TransformResult};
use crate::report::{to_display_value, CellValue, Report};

pub const PROGRAM_NAME_COLUMN: &str = "Program Name";
pub const PROGRAM_COLUMN: &str = "Program";
pub const DAY_OF_WEEK_COLUMN: &str = "Day of Week";

/// Canonical weekday names, indexed 0 (Sunday) through 6 (Saturday).
pub const DAYS_OF_WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Which registration form columns carry weekday choices.
///
/// The header strings reproduce the form builder's output verbatim, stray
/// spacing included; matching is exact.
#[derive(Debug, Clone, PartialEq)]
pub struct AfterschoolOptions {
    pub weekday_columns: Vec<String>,
}

impl Default for AfterschoolOptions {
    fn default() -> Self {
        Self {
            weekday_columns: [
                "Afterschool Recreational Program: Recreational Program Options",
                "One day a week: Afterschool Options",
                "Two days a week: Afterschool Options",
                "Three days a week : Afterschool Options",
                "Four days a week - BEST VALUE!: Afterschool Options",
                "Five days a week (Fun Fridays) - BEST VALUE! : Afterschool Options",
            ]
            .iter()
            .map(|column| column.to_string())
            .collect(),
        }
    }
}

/// Collapse the weekday option columns into a single `Day of Week` column.
///
/// Scans each option column for each weekday name and appends a
/// `{index}.{first-three-letters}` token per hit, e.g. `1.Mon;5.Fri`.
/// Tokens keep scan order and are not deduplicated, so a day named by two
/// columns shows up twice; that duplication is wanted downstream as a
/// double-booking signal.
pub fn assign_days(report: &mut Report, options: &AfterschoolOptions) {
    for row in &mut report.rows {
        let mut selected: Vec<String> = Vec::new();
        for column in &options.weekday_columns {
            let Some(value) = row.value(column).as_str() else {
                continue;
            };
            for (index, day) in DAYS_OF_WEEK.iter().enumerate() {
                if value.contains(day) {
                    selected.push(format!("{}.{}", index, &day[..3]));
                }
            }
        }
        row.set(DAY_OF_WEEK_COLUMN, CellValue::Str(selected.join(";")));
    }
}

/// Split registrations into the two afterschool programs from the
/// `Program Name` column: anything mentioning tutoring is `"Tutoring"`,
/// the rest is `"Recreation"`.
pub fn assign_program(report: &mut Report) -> TransformResult<()> {
    for (row_index, row) in report.rows.iter_mut().enumerate() {
        let raw = row.value(PROGRAM_NAME_COLUMN).clone();
        if raw.is_null() {
            return Err(TransformError::missing_column(
                row_index,
                PROGRAM_NAME_COLUMN,
            ));
        }
        let name = raw.as_str().ok_or_else(|| {
            TransformError::invalid_cell(
                row_index,
                PROGRAM_NAME_COLUMN,
                to_display_value(&raw),
                "expected a program name string",
            )
        })?;

        let program = if name.contains("Tutoring") {
            "Tutoring"
        } else {
            "Recreation"
        };
        row.set(PROGRAM_COLUMN, CellValue::from(program));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Row;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(header, value)| (header.to_string(), value.clone()))
            .collect()
    }

    fn report_of(rows: Vec<Row>) -> Report {
        let mut report = Report {
            headers: Vec::new(),
            rows,
        };
        report.recompute_headers();
        report
    }

    #[test]
    fn test_assign_days_tokens_in_scan_order() {
        let options = AfterschoolOptions::default();
        let mut report = report_of(vec![row(&[(
            "Two days a week: Afterschool Options",
            CellValue::from("Monday and Friday afternoons"),
        )])]);

        assign_days(&mut report, &options);

        assert_eq!(report.rows[0].str_value(DAY_OF_WEEK_COLUMN), "1.Mon;5.Fri");
    }

    #[test]
    fn test_assign_days_duplicates_across_columns_kept() {
        let options = AfterschoolOptions::default();
        let mut report = report_of(vec![row(&[
            (
                "One day a week: Afterschool Options",
                CellValue::from("Monday"),
            ),
            (
                "Two days a week: Afterschool Options",
                CellValue::from("Monday, Tuesday"),
            ),
        ])]);

        assign_days(&mut report, &options);

        assert_eq!(
            report.rows[0].str_value(DAY_OF_WEEK_COLUMN),
            "1.Mon;1.Mon;2.Tue"
        );
    }

    #[test]
    fn test_assign_days_no_selection_sets_empty_string() {
        let options = AfterschoolOptions::default();
        let mut report = report_of(vec![row(&[("Anything", CellValue::from("x"))])]);

        assign_days(&mut report, &options);

        assert_eq!(
            report.rows[0].value(DAY_OF_WEEK_COLUMN),
            &CellValue::Str(String::new())
        );
    }

    #[test]
    fn test_assign_days_ignores_non_string_cells() {
        let options = AfterschoolOptions::default();
        let mut report = report_of(vec![row(&[
            (
                "One day a week: Afterschool Options",
                CellValue::Bool(true),
            ),
            (
                "Two days a week: Afterschool Options",
                CellValue::from("Wednesday"),
            ),
        ])]);

        assign_days(&mut report, &options);

        assert_eq!(report.rows[0].str_value(DAY_OF_WEEK_COLUMN), "3.Wed");
    }

    #[test]
    fn test_assign_program_tutoring_vs_recreation() {
        let mut report = report_of(vec![
            row(&[(
                PROGRAM_NAME_COLUMN,
                CellValue::from("Afterschool Tutoring 2024-2025"),
            )]),
            row(&[(
                PROGRAM_NAME_COLUMN,
                CellValue::from("Afterschool Recreational Program"),
            )]),
        ]);

        assign_program(&mut report).unwrap();

        assert_eq!(report.rows[0].str_value(PROGRAM_COLUMN), "Tutoring");
        assert_eq!(report.rows[1].str_value(PROGRAM_COLUMN), "Recreation");
    }

    #[test]
    fn test_assign_program_requires_program_name() {
        let mut report = report_of(vec![row(&[("Anything", CellValue::from("x"))])]);

        let err = assign_program(&mut report).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { ref column, .. } if column == PROGRAM_NAME_COLUMN
        ));
    }
}

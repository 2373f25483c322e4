//! Named transform steps and the ordered pipeline runner.
//!
//! Every business rule is a [`Transform`] variant carrying its own
//! configuration, applied over the shared [`Report`] by
//! [`apply_transforms`]. Order is fixed per report variant and significant:
//! later steps read columns earlier steps wrote, and the header list is
//! recomputed between steps so each one sees the columns of its
//! predecessors.
//!
//! A step that returns an error aborts the run; there is no retry and no
//! rollback, the caller discards the half-transformed report.

use crate::diagnostics::Diagnostics;
use crate::error::TransformResult;
use crate::report::{Header, Report};

use super::afterschool::{assign_days, assign_program, AfterschoolOptions};
use super::camp::{assign_source, assign_weeks, calculate_age_and_cohort, CampSeason};
use super::common::{
    assign_contact, cast_sign_off_columns, default_removed_columns, fix_weird_characters,
    remove_columns,
};

/// One step of a report pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Drop boilerplate columns from rows and headers.
    RemoveColumns { columns: Vec<Header> },
    /// Coerce every `": Sign Off"` column to a plain boolean.
    CastSignOffColumns,
    /// Replace curly apostrophes with ASCII ones in string cells.
    FixWeirdCharacters,
    /// Recompute ages against the season reference date and assign cohorts.
    CalculateAgeAndCohort { season: CampSeason },
    /// Derive `Week 1`..`Week 7` and the joined `Weeks` column.
    AssignWeeks { season: CampSeason },
    /// Derive the `Source` billing column from the section columns.
    AssignSource { season: CampSeason },
    /// Join participant first and last name into `Contact`.
    AssignContact,
    /// Collapse weekday option columns into `Day of Week`.
    AssignDays { options: AfterschoolOptions },
    /// Split registrations into `Tutoring` / `Recreation` programs.
    AssignProgram,
}

impl Transform {
    /// Stable step name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Transform::RemoveColumns { .. } => "removeColumns",
            Transform::CastSignOffColumns => "castSignOffColumns",
            Transform::FixWeirdCharacters => "fixWeirdCharacters",
            Transform::CalculateAgeAndCohort { .. } => "calculateAgeAndCohort",
            Transform::AssignWeeks { .. } => "assignWeeks",
            Transform::AssignSource { .. } => "assignSource",
            Transform::AssignContact => "assignContact",
            Transform::AssignDays { .. } => "assignDays",
            Transform::AssignProgram => "assignProgram",
        }
    }

    /// Apply this step to the report, collecting non-fatal findings.
    pub fn apply(&self, report: &mut Report, diagnostics: &mut Diagnostics) -> TransformResult<()> {
        match self {
            Transform::RemoveColumns { columns } => {
                remove_columns(report, columns);
                Ok(())
            }
            Transform::CastSignOffColumns => {
                cast_sign_off_columns(report);
                Ok(())
            }
            Transform::FixWeirdCharacters => {
                fix_weird_characters(report);
                Ok(())
            }
            Transform::CalculateAgeAndCohort { season } => {
                calculate_age_and_cohort(report, season, diagnostics)
            }
            Transform::AssignWeeks { season } => assign_weeks(report, season, diagnostics),
            Transform::AssignSource { season } => {
                assign_source(report, season);
                Ok(())
            }
            Transform::AssignContact => {
                assign_contact(report);
                Ok(())
            }
            Transform::AssignDays { options } => {
                assign_days(report, options);
                Ok(())
            }
            Transform::AssignProgram => assign_program(report),
        }
    }
}

/// Apply each transform in order, recomputing the header list after every
/// step. The first error aborts the run.
pub fn apply_transforms(
    report: &mut Report,
    transforms: &[Transform],
    diagnostics: &mut Diagnostics,
) -> TransformResult<()> {
    for transform in transforms {
        transform.apply(report, diagnostics)?;
        report.recompute_headers();
    }
    Ok(())
}

/// The fixed camp pipeline order.
pub fn camp_pipeline(season: &CampSeason) -> Vec<Transform> {
    vec![
        Transform::RemoveColumns {
            columns: default_removed_columns(),
        },
        Transform::CastSignOffColumns,
        Transform::CalculateAgeAndCohort {
            season: season.clone(),
        },
        Transform::AssignWeeks {
            season: season.clone(),
        },
        Transform::AssignSource {
            season: season.clone(),
        },
        Transform::AssignContact,
    ]
}

/// The fixed afterschool pipeline order.
pub fn afterschool_pipeline(options: &AfterschoolOptions) -> Vec<Transform> {
    vec![
        Transform::RemoveColumns {
            columns: default_removed_columns(),
        },
        Transform::CastSignOffColumns,
        Transform::FixWeirdCharacters,
        Transform::AssignDays {
            options: options.clone(),
        },
        Transform::AssignProgram,
        Transform::AssignContact,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CellValue, Row};
    use crate::transform::camp::SECTIONS_COLUMN;
    use chrono::NaiveDate;

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

    fn camp_row() -> Row {
        row(&[
            ("Participant First Name", CellValue::from("Alex")),
            ("Participant Last Name", CellValue::from("Doe")),
            ("Participant Birth date", CellValue::from("2018-06-01")),
            ("Participant Gender", CellValue::from("male")),
            (SECTIONS_COLUMN, CellValue::from("Full 7-Week Camp")),
            (
                "Full 7-Week Camp: Extended Hours",
                CellValue::from("June 26 - June 30"),
            ),
            ("Text", CellValue::from("legal boilerplate")),
        ])
    }

    fn season() -> CampSeason {
        CampSeason::summer_2023()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 26).unwrap())
    }

    #[test]
    fn test_pipeline_orders() {
        let names: Vec<_> = camp_pipeline(&season())
            .iter()
            .map(Transform::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "removeColumns",
                "castSignOffColumns",
                "calculateAgeAndCohort",
                "assignWeeks",
                "assignSource",
                "assignContact",
            ]
        );

        let names: Vec<_> = afterschool_pipeline(&AfterschoolOptions::default())
            .iter()
            .map(Transform::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "removeColumns",
                "castSignOffColumns",
                "fixWeirdCharacters",
                "assignDays",
                "assignProgram",
                "assignContact",
            ]
        );
    }

    #[test]
    fn test_camp_pipeline_end_to_end() {
        let mut report = report_of(vec![camp_row()]);
        let mut diagnostics = Diagnostics::new();

        apply_transforms(&mut report, &camp_pipeline(&season()), &mut diagnostics).unwrap();

        let result = &report.rows[0];
        assert_eq!(result.value("Participant Age"), &CellValue::Num(6.0));
        assert_eq!(result.str_value("Cohort"), "5-6 boys");
        assert_eq!(result.str_value("Cohort Group Name"), "Monopoly");
        assert_eq!(result.str_value("Contact"), "Alex Doe");
        assert_eq!(result.str_value("Source"), "Rec Prog");
        assert!(result.str_value("Weeks").contains("June 26 - June 30"));
        for week_number in 1..=7 {
            assert_eq!(
                result.value(&format!("Week {week_number}")),
                &CellValue::Num(week_number as f64)
            );
        }
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_headers_recomputed_between_steps() {
        let mut report = report_of(vec![camp_row()]);
        let mut diagnostics = Diagnostics::new();

        apply_transforms(&mut report, &camp_pipeline(&season()), &mut diagnostics).unwrap();

        // removed column is gone, derived columns are present
        assert!(!report.headers.iter().any(|h| h == "Text"));
        for added in ["Cohort", "Cohort Group Name", "Weeks", "Source", "Contact"] {
            assert!(
                report.headers.iter().any(|h| h == added),
                "missing header {added}"
            );
        }
    }

    #[test]
    fn test_pipeline_deterministic() {
        let transforms = camp_pipeline(&season());

        let mut first = report_of(vec![camp_row(), camp_row()]);
        let mut second = report_of(vec![camp_row(), camp_row()]);
        let mut diag_first = Diagnostics::new();
        let mut diag_second = Diagnostics::new();

        apply_transforms(&mut first, &transforms, &mut diag_first).unwrap();
        apply_transforms(&mut second, &transforms, &mut diag_second).unwrap();

        assert_eq!(first, second);
        assert_eq!(diag_first.len(), diag_second.len());
    }

    #[test]
    fn test_failing_step_aborts_run() {
        // no birth date: calculateAgeAndCohort fails, later steps never run
        let mut report = report_of(vec![row(&[(
            SECTIONS_COLUMN,
            CellValue::from("Full 7-Week Camp"),
        )])]);
        let mut diagnostics = Diagnostics::new();

        let result = apply_transforms(&mut report, &camp_pipeline(&season()), &mut diagnostics);

        assert!(result.is_err());
        assert!(!report.rows[0].contains("Weeks"));
        assert!(!report.rows[0].contains("Contact"));
    }

    #[test]
    fn test_afterschool_pipeline_end_to_end() {
        let mut report = report_of(vec![row(&[
            ("Participant First Name", CellValue::from("Sam")),
            ("Participant Last Name", CellValue::from("Lee")),
            (
                "Program Name",
                CellValue::from("Afterschool Recreational Program"),
            ),
            (
                "Two days a week: Afterschool Options",
                CellValue::from("Monday and Wednesday \u{2019}til 5"),
            ),
            ("Media: Sign Off", CellValue::from("")),
        ])]);
        let mut diagnostics = Diagnostics::new();

        apply_transforms(
            &mut report,
            &afterschool_pipeline(&AfterschoolOptions::default()),
            &mut diagnostics,
        )
        .unwrap();

        let result = &report.rows[0];
        assert_eq!(result.str_value("Day of Week"), "1.Mon;3.Wed");
        assert_eq!(result.str_value("Program"), "Recreation");
        assert_eq!(result.str_value("Contact"), "Sam Lee");
        assert_eq!(result.value("Media: Sign Off"), &CellValue::Bool(false));
        assert!(result
            .str_value("Two days a week: Afterschool Options")
            .contains("'til 5"));
        assert!(diagnostics.is_empty());
    }
}

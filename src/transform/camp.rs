//! Summer camp transforms: participant age, cohort assignment, week
//! selection and billing source.
//!
//! Everything here is driven by a [`CampSeason`]: the reference date ages
//! are computed against, the seven week date spans, the registration form's
//! section columns and the ordered cohort table. Two seasons ship as
//! constructors; custom seasons can be built field by field.
//!
//! | Transform | Columns written |
//! |-----------|-----------------|
//! | [`calculate_age_and_cohort`] | `Participant Age`, `Participant Gender`, `Cohort`, `Cohort Group Name` |
//! | [`assign_weeks`] | `Week 1`..`Week 7`, `Weeks` |
//! | [`assign_source`] | `Source` |

use chrono::{Datelike, NaiveDate};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{TransformError, TransformResult};
use crate::report::{to_display_value, CellValue, Report};

// ============================================================================
// Column names
// ============================================================================

pub const BIRTH_DATE_COLUMN: &str = "Participant Birth date";
pub const AGE_COLUMN: &str = "Participant Age";
pub const GENDER_COLUMN: &str = "Participant Gender";
pub const COHORT_COLUMN: &str = "Cohort";
pub const COHORT_GROUP_COLUMN: &str = "Cohort Group Name";
pub const SECTIONS_COLUMN: &str = "Sections";
pub const WEEKS_COLUMN: &str = "Weeks";
pub const SOURCE_COLUMN: &str = "Source";

/// `Sections` value that buys every week of the season.
pub const FULL_CAMP_SECTIONS: &str = "Full 7-Week Camp";

/// Ages outside this range are folded onto the nearest cohort bound.
const MIN_COHORT_AGE: i32 = 4;
const MAX_COHORT_AGE: i32 = 13;

// ============================================================================
// Season configuration
// ============================================================================

/// Gender half of a cohort descriptor. Rows match [`CohortGender::Boys`]
/// only when the raw gender cell is exactly `"male"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortGender {
    Boys,
    Girls,
}

impl CohortGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            CohortGender::Boys => "boys",
            CohortGender::Girls => "girls",
        }
    }
}

/// Age half of a cohort descriptor.
///
/// A range like `5-6` matches when the age equals either bound or falls
/// strictly between them, so `11-13` covers 11, 12 and 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeSpec {
    /// A single age, written `"4 yo"` in descriptors.
    Single(i32),
    /// A low/high pair, written `"5-6"` in descriptors.
    Range(i32, i32),
}

impl AgeSpec {
    pub fn matches(&self, age: i32) -> bool {
        match *self {
            AgeSpec::Single(single) => age == single,
            AgeSpec::Range(low, high) => age == low || age == high || (age > low && age < high),
        }
    }
}

/// One row of the cohort table: who qualifies and which group they join.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortDescriptor {
    /// Label written to the `Cohort` column, e.g. `"5-6 boys"`.
    pub descriptor: String,
    /// Group name written to `Cohort Group Name`, e.g. `"Monopoly"`.
    pub group: String,
    pub ages: AgeSpec,
    pub gender: CohortGender,
}

impl CohortDescriptor {
    pub fn new(
        descriptor: impl Into<String>,
        group: impl Into<String>,
        ages: AgeSpec,
        gender: CohortGender,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            group: group.into(),
            ages,
            gender,
        }
    }
}

/// Everything season-specific the camp transforms consult.
#[derive(Debug, Clone, PartialEq)]
pub struct CampSeason {
    /// Date ages are computed against, normally the first day of camp.
    pub reference_date: NaiveDate,
    /// One `"Month D - Month D"` span per camp week, in week order.
    pub week_spans: Vec<String>,
    /// Registration form columns whose values name purchased week spans.
    pub section_headers: Vec<String>,
    /// Ordered cohort table; the first matching descriptor wins.
    pub cohorts: Vec<CohortDescriptor>,
}

impl CampSeason {
    /// Season starting June 26, 2023.
    pub fn summer_2023() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(2023, 6, 26).expect("valid date"),
            week_spans: owned(&[
                "June 26 - June 30",
                "July 3 - July 7",
                "July 10 - July 14",
                "July 17 - July 21",
                "July 24 - July 28",
                "July 31 - August 4",
                "August 7 - August 11",
            ]),
            section_headers: owned(&[
                "Full 7-Week Camp: Extended Hours",
                "6-Week Camp: Week options",
                "6-Week Camp: Extended Hours",
                "5-Week Camp: Week options",
                "5-Week Camp: Extended Hours",
                "4-Week Camp: Week options",
                "4-Week Camp: Extended Hours",
                "3-Week Camp: Week options",
                "3-Week Camp: Extended Hours",
                "2-Week Camp: Week options",
                "2-Week Camp: Extended Hours",
            ]),
            cohorts: standard_cohorts(),
        }
    }

    /// Season starting June 30, 2025. The form gained one-week options
    /// this year.
    pub fn summer_2025() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(2025, 6, 26).expect("valid date"),
            week_spans: owned(&[
                "June 30 - July 3",
                "July 7 - July 11",
                "July 14 - July 18",
                "July 21 - July 25",
                "July 28 - August 1",
                "August 4 - August 8",
                "August 11 - August 15",
            ]),
            section_headers: owned(&[
                "Full 7-Week Camp: Extended Hours",
                "6-Week Camp: Week options",
                "6-Week Camp: Extended Hours",
                "5-Week Camp: Week options",
                "5-Week Camp: Extended Hours",
                "4-Week Camp: Week options",
                "4-Week Camp: Extended Hours",
                "3-Week Camp: Week options",
                "3-Week Camp: Extended Hours",
                "2-Week Camp: Week options",
                "2-Week Camp: Extended Hours",
                "1-Week Camp: Week options",
                "1-Week Camp: Extended Hours",
            ]),
            cohorts: standard_cohorts(),
        }
    }

    /// Replace the reference date, e.g. to re-run ages against an earlier
    /// season's export.
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }
}

impl Default for CampSeason {
    fn default() -> Self {
        Self::summer_2025()
    }
}

/// The cohort table used every season so far. Order matters: the first
/// match wins, and girls are listed before the same-age boys.
pub fn standard_cohorts() -> Vec<CohortDescriptor> {
    use AgeSpec::{Range, Single};
    use CohortGender::{Boys, Girls};

    vec![
        CohortDescriptor::new("5-6 girls", "Candyland", Range(5, 6), Girls),
        CohortDescriptor::new("4 yo girls", "Chutes and Ladders", Single(4), Girls),
        CohortDescriptor::new("7-8 girls", "Connect4", Range(7, 8), Girls),
        CohortDescriptor::new("9-10 girls", "Mancala", Range(9, 10), Girls),
        CohortDescriptor::new("5-6 boys", "Monopoly", Range(5, 6), Boys),
        CohortDescriptor::new("4 yo boys", "Operation", Single(4), Boys),
        CohortDescriptor::new("7-8 boys", "Risk", Range(7, 8), Boys),
        CohortDescriptor::new("9-10 boys", "Scrabble", Range(9, 10), Boys),
        CohortDescriptor::new("11-13 boys", "Trouble", Range(11, 13), Boys),
        CohortDescriptor::new("11-13 girls", "Twister", Range(11, 13), Girls),
    ]
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

// ============================================================================
// Age and cohort
// ============================================================================

/// Recompute every participant's age as of the season reference date and
/// assign their cohort.
///
/// The stored `Participant Age` is always overwritten; a differing stored
/// value only produces an [`DiagnosticKind::AgeRecomputed`] warning (the
/// participant had a birthday between registration and export). Cohort
/// matching clamps the age to the 4..=13 table range, then scans the
/// season's descriptor table in order. A match writes `Cohort` and
/// `Cohort Group Name` and normalizes `Participant Gender`; no match
/// leaves the row untouched beyond the age and records
/// [`DiagnosticKind::CohortUnmatched`].
pub fn calculate_age_and_cohort(
    report: &mut Report,
    season: &CampSeason,
    diagnostics: &mut Diagnostics,
) -> TransformResult<()> {
    for (row_index, row) in report.rows.iter_mut().enumerate() {
        let raw_birth = row.value(BIRTH_DATE_COLUMN).clone();
        if raw_birth.is_null() {
            return Err(TransformError::missing_column(row_index, BIRTH_DATE_COLUMN));
        }
        let birth_text = raw_birth.as_str().ok_or_else(|| {
            TransformError::invalid_cell(
                row_index,
                BIRTH_DATE_COLUMN,
                to_display_value(&raw_birth),
                "expected a date string",
            )
        })?;
        let birth_date = parse_birth_date(birth_text).ok_or_else(|| {
            TransformError::invalid_cell(
                row_index,
                BIRTH_DATE_COLUMN,
                birth_text,
                "not a recognized calendar date",
            )
        })?;

        let age = compute_age(birth_date, season.reference_date);

        let stored_age = row.value(AGE_COLUMN).clone();
        if !stored_age.is_null() && stored_age != CellValue::Num(age as f64) {
            diagnostics.push(
                row_index,
                DiagnosticKind::AgeRecomputed,
                format!(
                    "stored age {} recomputed to {} as of {}",
                    to_display_value(&stored_age),
                    age,
                    season.reference_date
                ),
            );
        }
        row.set(AGE_COLUMN, CellValue::Num(age as f64));

        let clamped = age.clamp(MIN_COHORT_AGE, MAX_COHORT_AGE);
        let is_male = row.str_value(GENDER_COLUMN) == "male";
        let gender = if is_male {
            CohortGender::Boys
        } else {
            CohortGender::Girls
        };

        let Some(cohort) = season
            .cohorts
            .iter()
            .find(|descriptor| descriptor.ages.matches(clamped) && descriptor.gender == gender)
        else {
            diagnostics.push(
                row_index,
                DiagnosticKind::CohortUnmatched,
                format!("no cohort matches age {} ({})", age, gender.as_str()),
            );
            continue;
        };

        let existing = row.value(COHORT_COLUMN).clone();
        if !existing.is_null() && existing.as_str() != Some(cohort.descriptor.as_str()) {
            diagnostics.push(
                row_index,
                DiagnosticKind::CohortOverwritten,
                format!(
                    "cohort {} replaced by '{}'",
                    to_display_value(&existing),
                    cohort.descriptor
                ),
            );
        }

        row.set(
            GENDER_COLUMN,
            CellValue::from(if is_male { "Male" } else { "Female" }),
        );
        row.set(COHORT_COLUMN, CellValue::Str(cohort.descriptor.clone()));
        row.set(COHORT_GROUP_COLUMN, CellValue::Str(cohort.group.clone()));
    }

    Ok(())
}

/// Whole years between `birth` and `reference`, one less when the birthday
/// has not yet come around by the reference date.
fn compute_age(birth: NaiveDate, reference: NaiveDate) -> i32 {
    let mut years = reference.year() - birth.year();
    if (reference.month(), reference.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// Accepts the two date shapes seen in registration exports, with or
/// without a trailing time part.
fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw
        .split_once(['T', ' '])
        .map(|(date, _)| date)
        .unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}

// ============================================================================
// Weeks and source
// ============================================================================

/// Mark the camp weeks each participant attends.
///
/// Week *n* is selected when `Sections` is exactly the full-camp package or
/// any section column mentions the week's date span. Selected weeks get a
/// `Week {n}` column holding `n`; `Weeks` always gets the joined span list,
/// empty when nothing matched. The count of selected weeks is then checked
/// against the week count named by `Sections` (`"Full 7-Week Camp"` pays
/// for 7, `"3-Week Camp"` for 3) and a mismatch records
/// [`DiagnosticKind::WeekCountMismatch`].
pub fn assign_weeks(
    report: &mut Report,
    season: &CampSeason,
    diagnostics: &mut Diagnostics,
) -> TransformResult<()> {
    for (row_index, row) in report.rows.iter_mut().enumerate() {
        let raw_sections = row.value(SECTIONS_COLUMN).clone();
        if raw_sections.is_null() {
            return Err(TransformError::missing_column(row_index, SECTIONS_COLUMN));
        }
        let sections = raw_sections
            .as_str()
            .ok_or_else(|| {
                TransformError::invalid_cell(
                    row_index,
                    SECTIONS_COLUMN,
                    to_display_value(&raw_sections),
                    "expected the purchased sections as text",
                )
            })?
            .to_string();
        let full_camp = sections == FULL_CAMP_SECTIONS;

        let mut selected: Vec<&str> = Vec::new();
        for (index, span) in season.week_spans.iter().enumerate() {
            let week_number = index + 1;
            let attending = full_camp
                || season.section_headers.iter().any(|section| {
                    row.value(section)
                        .as_str()
                        .is_some_and(|value| value.contains(span.as_str()))
                });

            if attending {
                row.set(
                    format!("Week {week_number}"),
                    CellValue::Num(week_number as f64),
                );
                if !selected.contains(&span.as_str()) {
                    selected.push(span.as_str());
                }
            }
        }

        row.set(WEEKS_COLUMN, CellValue::Str(selected.join(", ")));

        let paid_weeks = sections
            .replacen("Full ", "", 1)
            .chars()
            .next()
            .and_then(|c| c.to_digit(10));
        match paid_weeks {
            Some(paid) if paid as usize == selected.len() => {}
            Some(paid) => diagnostics.push(
                row_index,
                DiagnosticKind::WeekCountMismatch,
                format!(
                    "{} week(s) selected but '{}' pays for {}",
                    selected.len(),
                    sections,
                    paid
                ),
            ),
            None => diagnostics.push(
                row_index,
                DiagnosticKind::WeekCountMismatch,
                format!(
                    "{} week(s) selected but no week count could be read from '{}'",
                    selected.len(),
                    sections
                ),
            ),
        }
    }

    Ok(())
}

/// Bill to `"FED"` when any section column mentions `"Full Day"`, else to
/// the recreational program.
pub fn assign_source(report: &mut Report, season: &CampSeason) {
    for row in &mut report.rows {
        let full_day = season.section_headers.iter().any(|section| {
            row.value(section)
                .as_str()
                .is_some_and(|value| value.contains("Full Day"))
        });
        row.set(
            SOURCE_COLUMN,
            CellValue::from(if full_day { "FED" } else { "Rec Prog" }),
        );
    }
}

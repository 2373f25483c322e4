//! Structured data-quality diagnostics.
//!
//! Non-fatal findings (unmatched cohorts, week-count mismatches, duplicate
//! source columns, recomputed ages) are collected per row instead of being
//! printed and lost. A pipeline run returns them alongside the report so
//! callers and tests can assert on them.
//!
//! Fatal conditions use the error types in [`crate::error`] instead.

use serde::{Deserialize, Serialize};

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Two different truthy values competed for the same header; the first won.
    DuplicateColumn,
    /// The computed age differs from the source-provided age.
    AgeRecomputed,
    /// A matched cohort replaced a different pre-existing cohort value.
    CohortOverwritten,
    /// No cohort descriptor matched the participant's age and gender.
    CohortUnmatched,
    /// Selected week count disagrees with the paid week count from "Sections".
    WeekCountMismatch,
}

/// Diagnostic severity, used for log routing and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl DiagnosticKind {
    /// Cohort and week findings point at data the program office must fix,
    /// the rest is informational.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DuplicateColumn
            | DiagnosticKind::AgeRecomputed
            | DiagnosticKind::CohortOverwritten => Severity::Warning,
            DiagnosticKind::CohortUnmatched | DiagnosticKind::WeekCountMismatch => {
                Severity::Error
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateColumn => "duplicateColumn",
            DiagnosticKind::AgeRecomputed => "ageRecomputed",
            DiagnosticKind::CohortOverwritten => "cohortOverwritten",
            DiagnosticKind::CohortUnmatched => "cohortUnmatched",
            DiagnosticKind::WeekCountMismatch => "weekCountMismatch",
        }
    }
}

/// A single per-row finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Zero-based data row index (header row not counted).
    pub row_index: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} [{}]: {}",
            self.row_index,
            self.kind.as_str(),
            self.message
        )
    }
}

/// Collector threaded through the report builder and every transform.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row_index: usize, kind: DiagnosticKind, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            row_index,
            kind,
            message: message.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_split() {
        assert_eq!(
            DiagnosticKind::CohortUnmatched.severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticKind::WeekCountMismatch.severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticKind::AgeRecomputed.severity(),
            Severity::Warning
        );
        assert_eq!(
            DiagnosticKind::DuplicateColumn.severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_counts() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(0, DiagnosticKind::AgeRecomputed, "age 5 -> 6");
        diagnostics.push(0, DiagnosticKind::CohortUnmatched, "no cohort");
        diagnostics.push(2, DiagnosticKind::WeekCountMismatch, "3 vs 4");

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.error_count(), 2);
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::CohortUnmatched).count(),
            1
        );
    }

    #[test]
    fn test_serialized_shape() {
        let diagnostic = Diagnostic {
            row_index: 4,
            kind: DiagnosticKind::WeekCountMismatch,
            message: "selected 3 weeks but paid for 4".into(),
        };

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["rowIndex"], 4);
        assert_eq!(json["kind"], "weekCountMismatch");
        assert!(json["message"].as_str().unwrap().contains("3 weeks"));
    }

    #[test]
    fn test_display_format() {
        let diagnostic = Diagnostic {
            row_index: 1,
            kind: DiagnosticKind::CohortUnmatched,
            message: "no descriptor for age 14".into(),
        };
        let text = diagnostic.to_string();
        assert!(text.contains("row 1"));
        assert!(text.contains("cohortUnmatched"));
    }
}

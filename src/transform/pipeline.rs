//! High-level pipeline API: CSV bytes in, enriched report out.
//!
//! Combines ingestion, report building and the ordered transform list for
//! one report variant. This is the entry point the CLI and the HTTP server
//! both call.
//!
//! # Example
//!
//! ```rust,ignore
//! use campreport::transform::pipeline::{transform_csv, PipelineOptions};
//!
//! let run = transform_csv("registrations.csv", &PipelineOptions::default())?;
//! println!("{} rows, {} findings", run.report.rows.len(), run.diagnostics.len());
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::logs::{log_diagnostic, log_info, log_success};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{PipelineError, PipelineResult};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};
use crate::report::Report;

use super::afterschool::AfterschoolOptions;
use super::camp::CampSeason;
use super::runner::{afterschool_pipeline, apply_transforms, camp_pipeline};

/// Which program's pipeline and stored mask a report uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportVariant {
    #[default]
    Camp,
    Afterschool,
}

impl ReportVariant {
    /// Key the column-visibility mask is stored under.
    pub fn mask_key(&self) -> &'static str {
        match self {
            ReportVariant::Camp => "headersMask",
            ReportVariant::Afterschool => "headersMaskAfterschool",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportVariant::Camp => "camp",
            ReportVariant::Afterschool => "afterschool",
        }
    }
}

impl FromStr for ReportVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "camp" => Ok(ReportVariant::Camp),
            "afterschool" => Ok(ReportVariant::Afterschool),
            other => Err(format!(
                "unknown variant '{other}' (expected 'camp' or 'afterschool')"
            )),
        }
    }
}

/// Options for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    pub variant: ReportVariant,
    pub camp: CampSeason,
    pub afterschool: AfterschoolOptions,
}

impl PipelineOptions {
    pub fn camp(season: CampSeason) -> Self {
        Self {
            variant: ReportVariant::Camp,
            camp: season,
            ..Self::default()
        }
    }

    pub fn afterschool(options: AfterschoolOptions) -> Self {
        Self {
            variant: ReportVariant::Afterschool,
            afterschool: options,
            ..Self::default()
        }
    }
}

/// CSV ingestion metadata carried through to callers.
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    /// The enriched report.
    pub report: Report,
    /// Non-fatal data-quality findings, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Ingestion metadata.
    pub csv_info: CsvInfo,
}

/// Run the full pipeline over a CSV file.
pub fn transform_csv<P: AsRef<Path>>(
    path: P,
    options: &PipelineOptions,
) -> PipelineResult<PipelineRun> {
    let parse_result = parse_csv_file_auto(path)?;
    transform_parsed(parse_result, options)
}

/// Run the full pipeline over raw CSV bytes (the upload endpoint path).
pub fn transform_bytes(bytes: &[u8], options: &PipelineOptions) -> PipelineResult<PipelineRun> {
    let parse_result = parse_bytes_auto(bytes)?;
    transform_parsed(parse_result, options)
}

/// Run the pipeline over already-parsed CSV data.
pub fn transform_parsed(
    parse_result: ParseResult,
    options: &PipelineOptions,
) -> PipelineResult<PipelineRun> {
    log_info("📖 Reading registration export...");
    log_success(format!("Detected encoding: {}", parse_result.encoding));
    log_success(format!(
        "Detected delimiter: '{}'",
        format_delimiter(parse_result.delimiter)
    ));
    log_success(format!(
        "Read {} rows, {} columns",
        parse_result.rows.len(),
        parse_result.raw_headers.len()
    ));

    let csv_info = CsvInfo {
        encoding: parse_result.encoding.clone(),
        delimiter: parse_result.delimiter,
        columns: parse_result.raw_headers.clone(),
        row_count: parse_result.rows.len(),
    };

    if parse_result.rows.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let mut diagnostics = Diagnostics::new();

    log_info("🧱 Building report...");
    let mut report = Report::build(&parse_result.raw_headers, parse_result.rows, &mut diagnostics);
    log_success(format!(
        "Report built: {} unique headers",
        report.headers.len()
    ));

    let transforms = match options.variant {
        ReportVariant::Camp => camp_pipeline(&options.camp),
        ReportVariant::Afterschool => afterschool_pipeline(&options.afterschool),
    };

    log_info(format!(
        "⚙️  Applying {} pipeline ({} steps)...",
        options.variant.as_str(),
        transforms.len()
    ));
    for transform in &transforms {
        log_info(format!("→ {}", transform.name()));
    }
    apply_transforms(&mut report, &transforms, &mut diagnostics)?;
    log_success(format!(
        "Transformed: {} rows, {} columns",
        report.rows.len(),
        report.headers.len()
    ));

    if diagnostics.is_empty() {
        log_success("No data-quality findings");
    } else {
        log_info(format!(
            "🔎 {} finding(s): {} warning(s), {} error(s)",
            diagnostics.len(),
            diagnostics.warning_count(),
            diagnostics.error_count()
        ));
        for diagnostic in diagnostics.iter() {
            log_diagnostic(diagnostic);
        }
    }

    Ok(PipelineRun {
        report,
        diagnostics: diagnostics.into_vec(),
        csv_info,
    })
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

//! REST API types for the report UI.
//!
//! Rows serialize as plain JSON objects (header → scalar) thanks to the
//! untagged cell representation, so the client renders them directly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::diagnostics::Diagnostic;
use crate::report::{Header, Row};
use crate::transform::pipeline::{PipelineRun, ReportVariant};

/// Response sent after a CSV upload and pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier.
    pub job_id: String,

    /// `"ready"` when the run produced no findings, `"warning"` otherwise.
    pub status: String,

    /// Enriched report headers, in display order.
    pub headers: Vec<Header>,

    /// Enriched rows, one JSON object per participant.
    pub rows: Vec<Row>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub variant: ReportVariant,
    pub csv_info: CsvMetadata,
    /// Per-row data-quality findings, discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Stored column-visibility mask for the variant, or the all-false
    /// default when none is stored.
    pub mask: IndexMap<Header, bool>,
}

/// CSV ingestion metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Body of `POST /api/export`: the (possibly column-filtered) table to
/// serialize back to CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub headers: Vec<Header>,
    pub rows: Vec<Row>,
}

impl UploadResponse {
    /// Assemble the response from a finished run and the variant's stored
    /// (or default) mask.
    pub fn from_run(
        run: PipelineRun,
        variant: ReportVariant,
        mask: IndexMap<Header, bool>,
    ) -> Self {
        let status = if run.diagnostics.is_empty() {
            "ready"
        } else {
            "warning"
        };

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            headers: run.report.headers,
            rows: run.report.rows,
            metadata: ResponseMetadata {
                variant,
                csv_info: CsvMetadata {
                    encoding: run.csv_info.encoding,
                    delimiter: run.csv_info.delimiter.to_string(),
                    row_count: run.csv_info.row_count,
                    columns: run.csv_info.columns,
                },
                diagnostics: run.diagnostics,
                mask,
            },
        }
    }
}

/// JSON body for error responses.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "headers": [],
        "rows": [],
    })
}

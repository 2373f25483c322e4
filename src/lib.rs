//! # campreport - camp and afterschool registration report tool
//!
//! Ingests a registration CSV export, runs a fixed pipeline of business-rule
//! transforms (age and cohort assignment, week attendance, contact synthesis,
//! sign-off normalization), and produces an enriched table plus per-row
//! data-quality findings, re-exportable as CSV.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transforms  │────▶│  Enriched   │
//! │ (enc. auto) │     │  (typed)    │     │  (ordered)   │     │  report+CSV │
//! └─────────────┘     └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use campreport::{transform_csv, PipelineOptions};
//!
//! let run = transform_csv("registrations.csv", &PipelineOptions::default())?;
//! for finding in &run.diagnostics {
//!     eprintln!("{finding}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error enums per concern
//! - [`report`] - Cell model, sanitizer, report builder
//! - [`diagnostics`] - Structured per-row findings
//! - [`parser`] - CSV ingestion with auto-detection
//! - [`transform`] - Domain transforms, runner, pipeline
//! - [`export`] - Quoted CSV export
//! - [`mask`] - Persisted column-visibility masks
//! - [`api`] - HTTP API server

// Core modules
pub mod diagnostics;
pub mod error;
pub mod report;

// Ingestion
pub mod parser;

// Transformation
pub mod transform;

// Export
pub mod export;

// Persisted column visibility
pub mod mask;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, ExportError, MaskError, PipelineError, ServerError, TransformError,
};

// =============================================================================
// Re-exports - Report model
// =============================================================================

pub use report::{
    dedup_headers, sanitize_value, to_display_value, CellValue, Header, Report, Row,
    NULL_PLACEHOLDER,
};

// =============================================================================
// Re-exports - Diagnostics
// =============================================================================

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Transforms and pipeline
// =============================================================================

pub use transform::{
    afterschool_pipeline, apply_transforms, camp_pipeline, transform_bytes, transform_csv,
    transform_parsed, AfterschoolOptions, AgeSpec, CampSeason, CohortDescriptor, CohortGender,
    CsvInfo, PipelineOptions, PipelineRun, ReportVariant, Transform,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_filename, to_csv_string, write_csv_file};

// =============================================================================
// Re-exports - Mask store
// =============================================================================

pub use mask::{default_mask, visible_headers, MaskStore, StoredMask};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ExportRequest, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::serve;
}

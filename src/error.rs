//! Error types for the campreport transformation pipeline.
//!
//! One enum per concern:
//!
//! - [`CsvError`] - CSV ingestion errors
//! - [`TransformError`] - Abortive transform errors
//! - [`ExportError`] - CSV export errors
//! - [`MaskError`] - Column-visibility store errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Data-quality findings (unmatched cohorts, week-count mismatches,
//! duplicate columns) are not errors; they are collected as
//! [`crate::diagnostics::Diagnostic`] values and never abort a run.

use thiserror::Error;

// =============================================================================
// CSV Ingestion Errors
// =============================================================================

/// Errors while reading and decoding a registration CSV.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode content with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Delimiter outside the ASCII range.
    #[error("Delimiter must be an ASCII character, got '{0}'")]
    InvalidDelimiter(char),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Abortive errors raised by a transform step.
///
/// A transform error fails the whole pipeline run; the partially
/// transformed report is discarded (the caller re-uploads a fixed file).
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required column is missing or holds a non-text value.
    #[error("Row {row}: missing required column '{column}'")]
    MissingColumn { row: usize, column: String },

    /// A cell value has an unexpected shape.
    #[error("Row {row}, column '{column}' (value '{value}'): {message}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
        message: String,
    },
}

impl TransformError {
    pub fn missing_column(row: usize, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            row,
            column: column.into(),
        }
    }

    pub fn invalid_cell(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidCell {
            row,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing a report back to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to finalize the in-memory CSV buffer.
    #[error("Failed to finalize CSV buffer: {0}")]
    BufferError(String),
}

// =============================================================================
// Mask Store Errors
// =============================================================================

/// Errors from the column-visibility mask store.
#[derive(Debug, Error)]
pub enum MaskError {
    /// No mask stored under the given key.
    #[error("Mask not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("Mask store IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Mask store JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::transform_csv`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV ingestion error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Transform error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Mask store error.
    #[error("Mask error: {0}")]
    Mask(#[from] MaskError),

    /// No data rows to transform.
    #[error("No rows to transform")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV ingestion.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for transform steps.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for mask store operations.
pub type MaskResult<T> = Result<T, MaskError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

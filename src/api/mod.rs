//! HTTP API: server, payload types, and the shared log broadcaster.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::{log_diagnostic, log_error, log_info, log_success, log_warning, LogEntry, LogLevel};
pub use server::serve;
pub use types::{error_response, CsvMetadata, ExportRequest, ResponseMetadata, UploadResponse};

//! HTTP server for the report API.
//!
//! Serves the enriched report data to an external UI; rendering happens
//! client-side.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                          |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/health`             | Health check                         |
//! | POST   | `/api/upload`         | Upload CSV, run the pipeline         |
//! | POST   | `/api/export`         | Serialize a table back to CSV        |
//! | GET    | `/api/mask/{variant}` | Stored column-visibility mask        |
//! | PUT    | `/api/mask/{variant}` | Replace the stored mask              |
//! | GET    | `/api/logs`           | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, Path},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, ExportRequest, UploadResponse};
use crate::export::{export_filename, to_csv_string};
use crate::mask::{default_mask, MaskStore, StoredMask};
use crate::report::Header;
use crate::transform::pipeline::{transform_bytes, PipelineOptions, ReportVariant};

type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server.
pub async fn serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/export", post(export_csv))
        .route("/api/mask/{variant}", get(get_mask).put(put_mask))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 campreport server running on http://localhost:{port}");
    eprintln!("   POST /api/upload         - Upload registration CSV");
    eprintln!("   POST /api/export         - Export table as CSV");
    eprintln!("   GET  /api/mask/{{variant}} - Column-visibility mask");
    eprintln!("   GET  /api/logs           - SSE log stream");
    eprintln!("   GET  /health             - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "campreport",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "export": "POST /api/export",
            "mask": "GET/PUT /api/mask/{variant}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: multipart with a required `file` field and an optional
/// `variant` text field (default camp).
async fn upload_csv(mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut variant = ReportVariant::Camp;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(&format!("Read error: {e}")))?
                        .to_vec(),
                );
            }
            "variant" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(&format!("Read error: {e}")))?;
                variant = text.parse().map_err(|e: String| bad_request(&e))?;
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;

    eprintln!(
        "📄 NEW UPLOAD: {} ({} bytes, {} variant)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        variant.as_str()
    );

    let options = PipelineOptions {
        variant,
        ..PipelineOptions::default()
    };
    let run = transform_bytes(&bytes, &options).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(error_response(&e.to_string())),
        )
    })?;

    let mask = MaskStore::open()
        .get(variant.mask_key())
        .map(|stored| stored.columns.clone())
        .unwrap_or_else(|| default_mask(&run.report.headers));

    Ok(Json(UploadResponse::from_run(run, variant, mask)))
}

/// Export endpoint: `(headers, rows)` back to quoted CSV with the
/// conventional import filename.
async fn export_csv(Json(request): Json<ExportRequest>) -> Result<impl IntoResponse, ApiError> {
    let csv = to_csv_string(&request.headers, &request.rows).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;

    let filename = export_filename(chrono::Utc::now().date_naive());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

/// Read the stored mask for a variant; all-false when nothing is stored.
async fn get_mask(Path(variant): Path<String>) -> Result<Json<StoredMask>, ApiError> {
    let variant: ReportVariant = variant.parse().map_err(|e: String| bad_request(&e))?;
    let store = MaskStore::open();

    match store.get(variant.mask_key()) {
        Some(mask) => Ok(Json(mask.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(error_response(&format!(
                "no mask stored for '{}'",
                variant.as_str()
            ))),
        )),
    }
}

/// Replace the stored mask for a variant.
async fn put_mask(
    Path(variant): Path<String>,
    Json(columns): Json<IndexMap<Header, bool>>,
) -> Result<Json<StoredMask>, ApiError> {
    let variant: ReportVariant = variant.parse().map_err(|e: String| bad_request(&e))?;
    let mut store = MaskStore::open();

    let mask = store.set(variant.mask_key(), columns).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;
    Ok(Json(mask.clone()))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

//! HTTP server for the prices API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                               |
//! |--------|-------------------|-------------------------------------------|
//! | GET    | `/health`         | Health check                              |
//! | POST   | `/api/v0/prices`  | Upload a zipped CSV (multipart `file`)    |
//! | GET    | `/api/v0/prices`  | Download every stored row as `data.zip`   |
//! | GET    | `/api/logs`       | SSE stream for real-time logs             |

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{RequestLog, LOG_BROADCASTER};
use super::types::{error_response, UploadResponse};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::pipeline::{ExportPipeline, ImportPipeline};
use crate::store::PriceStore;

/// Route serving both import and export.
pub const PRICES_ROUTE: &str = "/api/v0/prices";

/// Download name of exported archives.
const EXPORT_FILENAME: &str = "data.zip";

/// Size of the chunks an export is streamed in.
const EXPORT_CHUNK_BYTES: usize = 64 * 1024;

/// Shared handler state: both pipelines, built on the same store.
#[derive(Clone)]
pub struct AppState {
    pub import: ImportPipeline,
    pub export: ExportPipeline,
}

impl AppState {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self {
            import: ImportPipeline::new(store.clone()),
            export: ExportPipeline::new(store),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route(PRICES_ROUTE, get(download_prices).post(upload_prices))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    config: ServerConfig,
    store: Arc<dyn PriceStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(store), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Prices server running on http://localhost:{}", config.port);
    println!("   POST {} - Upload zipped CSV", PRICES_ROUTE);
    println!("   GET  {} - Download data.zip", PRICES_ROUTE);
    println!("   GET  /api/logs       - SSE log stream");
    println!("   GET  /health         - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Turn a failure into an HTTP error response, logging it on the way.
fn reject(err: ServerError, log: &RequestLog) -> (StatusCode, Json<Value>) {
    let status = err.status();
    log.error(format!("{} ({})", err, status));
    (status, Json(error_response(err.kind(), &err.to_string(), Some(log.id()))))
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "prices",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "import": format!("POST {}", PRICES_ROUTE),
            "export": format!("GET {}", PRICES_ROUTE),
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers just miss entries
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Pull the `file` field out of the upload form.
async fn read_upload(mut multipart: Multipart) -> ServerResult<(Option<String>, Bytes)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        if let Some(ref name) = file_name {
            if !name.to_ascii_lowercase().ends_with(".zip") {
                return Err(ServerError::BadRequest("File must be a zip archive".to_string()));
            }
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    upload.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))
}

/// Import endpoint
async fn upload_prices(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let log = RequestLog::start();

    let (file_name, bytes) = read_upload(multipart).await.map_err(|e| reject(e, &log))?;
    log.info(format!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unnamed"),
        bytes.len()
    ));

    let summary = state
        .import
        .run(&bytes, &log)
        .await
        .map_err(|e| reject(e.into(), &log))?;

    Ok(Json(summary.totals))
}

/// Export endpoint
async fn download_prices(State(state): State<AppState>) -> Result<Response, (StatusCode, Json<Value>)> {
    let log = RequestLog::start();

    let export = state.export.run(&log).await.map_err(|e| reject(e.into(), &log))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", EXPORT_FILENAME),
            ),
        ],
        streamed_body(export.bytes, log),
    )
        .into_response())
}

/// Reports exports whose body was dropped before every chunk was handed to
/// the connection (client went away, write failed).
struct TransferGuard {
    log: RequestLog,
    total: usize,
    sent: usize,
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        if self.sent < self.total {
            self.log.error(format!(
                "Export transfer aborted after {} of {} bytes",
                self.sent, self.total
            ));
        }
    }
}

/// Stream the archive in chunks; transfer failures are logged, not retried.
fn streamed_body(bytes: Vec<u8>, log: RequestLog) -> Body {
    let data = Bytes::from(bytes);
    let total = data.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(EXPORT_CHUNK_BYTES)
        .map(|start| data.slice(start..(start + EXPORT_CHUNK_BYTES).min(total)))
        .collect();

    log.info(format!("Streaming {} bytes in {} chunks", total, chunks.len()));
    let mut guard = TransferGuard { log, total, sent: 0 };
    let body = stream::iter(chunks).map(move |chunk| {
        guard.sent += chunk.len();
        Ok::<_, Infallible>(chunk)
    });

    Body::from_stream(body)
}

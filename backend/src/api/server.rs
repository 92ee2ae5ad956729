//! HTTP server for the overdue dashboard.
//!
//! Each browser tab creates a session, uploads its overdue and opname files
//! into it and toggles report options; the server keeps the parsed tables so
//! that toggling never re-reads a file.
//!
//! # API Endpoints
//!
//! | Method | Path                                     | Description                      |
//! |--------|------------------------------------------|----------------------------------|
//! | GET    | `/health`                                | Health check                     |
//! | POST   | `/api/sessions`                          | Create a session                 |
//! | POST   | `/api/sessions/{id}/overdue`             | Upload overdue file, get report  |
//! | POST   | `/api/sessions/{id}/opname`              | Upload opname file, get report   |
//! | PUT    | `/api/sessions/{id}/options`             | Change options, get report       |
//! | GET    | `/api/sessions/{id}/report`              | Both slots' reports              |
//! | GET    | `/api/sessions/{id}/export/{artifact}`   | `.xlsx` download                 |
//! | DELETE | `/api/sessions/{id}`                     | Drop a session                   |
//! | GET    | `/api/logs`                              | SSE stream for real-time logs    |

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{delete, get, post, put},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{
    error_response, OpnameReportResponse, OverdueReportResponse, SessionCreated,
    SessionReportResponse,
};
use crate::config::{MAX_UPLOAD_BYTES, XLSX_MIME};
use crate::error::{ExportError, LoadResult, ReportError, ServerError, ServerResult};
use crate::parser::{load, LoadedTable};
use crate::session::{ExportArtifact, FileSlot, SessionStore};
use crate::transform::pipeline::ReportOptions;

/// Shared handler state.
#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<SessionStore>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Report(e) => match e {
                ReportError::Load(_) | ReportError::Unavailable(_) => StatusCode::BAD_REQUEST,
                ReportError::NoUpload(_) | ReportError::UploadFailed { .. } => StatusCode::NOT_FOUND,
                ReportError::Export(ExportError::Empty(_)) => StatusCode::NOT_FOUND,
                ReportError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", delete(delete_session))
        .route("/api/sessions/{id}/overdue", post(upload_overdue))
        .route("/api/sessions/{id}/opname", post(upload_opname))
        .route("/api/sessions/{id}/options", put(update_options))
        .route("/api/sessions/{id}/report", get(session_report))
        .route("/api/sessions/{id}/export/{artifact}", get(export_artifact))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::default());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 AOS dashboard running on http://localhost:{}", port);
    println!("   POST /api/sessions                    - Create session");
    println!("   POST /api/sessions/{{id}}/overdue       - Upload Piutang Overdue file");
    println!("   POST /api/sessions/{{id}}/opname        - Upload Opname Faktur file");
    println!("   PUT  /api/sessions/{{id}}/options       - Toggle report options");
    println!("   GET  /api/sessions/{{id}}/export/{{name}} - Download .xlsx");
    println!("   GET  /api/logs                        - SSE log stream");
    println!("   GET  /health                          - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "aos-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.store.create();
    log_info(format!("🆕 Session {}", session_id));
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn delete_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ServerResult<StatusCode> {
    let id = session_id(path)?;
    if state.store.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown_session(&id))
    }
}

/// Fields of an upload form.
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
    /// Option fields present in the form override the session's options.
    options: Vec<(String, bool)>,
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            form.file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            form.bytes = Some(bytes.to_vec());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            form.options.push((name, parse_flag(&text)));
        }
    }

    Ok(form)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

fn apply_flags(mut options: ReportOptions, flags: &[(String, bool)]) -> ReportOptions {
    for (name, value) in flags {
        match name.as_str() {
            "tidy" => options.tidy = *value,
            "table" => options.table = *value,
            "summary" => options.summary = *value,
            "chart" => options.chart = *value,
            _ => {}
        }
    }
    options
}

fn unknown_session(id: &Uuid) -> ServerError {
    ServerError::NotFound(format!("session {}", id))
}

/// Malformed path segments and JSON bodies answer with the JSON error shape.
fn rejected(rejection: impl std::fmt::Display) -> ServerError {
    ServerError::BadRequest(rejection.to_string())
}

fn session_id(path: Result<Path<Uuid>, PathRejection>) -> ServerResult<Uuid> {
    path.map(|Path(id)| id).map_err(rejected)
}

/// Parse on the blocking pool so the session store is never locked meanwhile.
async fn parse_upload(file_name: &str, bytes: Vec<u8>) -> ServerResult<LoadResult<LoadedTable>> {
    let file_name = file_name.to_string();
    tokio::task::spawn_blocking(move || load(&file_name, &bytes))
        .await
        .map_err(|e| ServerError::Internal(format!("Parser task failed: {}", e)))
}

async fn upload_overdue(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Multipart,
) -> ServerResult<Json<OverdueReportResponse>> {
    let id = session_id(path)?;
    let mut form = read_form(multipart).await?;
    let (file_name, bytes) = take_file(&mut form)?;
    log_info(format!("📄 Overdue upload: {} ({} bytes)", file_name, bytes.len()));

    if !state.store.contains(&id) {
        return Err(unknown_session(&id));
    }
    let result = parse_upload(&file_name, bytes).await?;

    state
        .store
        .with_session(&id, |session| -> ServerResult<_> {
            let source = session.store(FileSlot::Overdue, &file_name, result)?;
            // A rejected upload leaves the previous options in place
            session.set_options(apply_flags(session.options(), &form.options));
            let report = session.overdue_report()?;
            Ok(Json(OverdueReportResponse::new(&source, &report, Some(id))))
        })
        .ok_or_else(|| unknown_session(&id))?
}

async fn upload_opname(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Multipart,
) -> ServerResult<Json<OpnameReportResponse>> {
    let id = session_id(path)?;
    let mut form = read_form(multipart).await?;
    let (file_name, bytes) = take_file(&mut form)?;
    log_info(format!("📄 Opname upload: {} ({} bytes)", file_name, bytes.len()));

    if !state.store.contains(&id) {
        return Err(unknown_session(&id));
    }
    let result = parse_upload(&file_name, bytes).await?;

    state
        .store
        .with_session(&id, |session| -> ServerResult<_> {
            let source = session.store(FileSlot::Opname, &file_name, result)?;
            let report = session.opname_report()?;
            Ok(Json(OpnameReportResponse::new(&source, &report, Some(id))))
        })
        .ok_or_else(|| unknown_session(&id))?
}

fn take_file(form: &mut UploadForm) -> ServerResult<(String, Vec<u8>)> {
    let bytes = form
        .bytes
        .take()
        .ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    let file_name = form.file_name.take().unwrap_or_else(|| "upload.txt".to_string());
    Ok((file_name, bytes))
}

async fn update_options(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ReportOptions>, JsonRejection>,
) -> ServerResult<Json<SessionReportResponse>> {
    let id = session_id(path)?;
    let Json(options) = body.map_err(rejected)?;
    state
        .store
        .with_session(&id, |session| {
            session.set_options(options);
            Json(SessionReportResponse::new(id, options, &session.report_all()))
        })
        .ok_or_else(|| unknown_session(&id))
}

async fn session_report(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ServerResult<Json<SessionReportResponse>> {
    let id = session_id(path)?;
    state
        .store
        .with_session(&id, |session| {
            Json(SessionReportResponse::new(id, session.options(), &session.report_all()))
        })
        .ok_or_else(|| unknown_session(&id))
}

async fn export_artifact(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> ServerResult<Response> {
    let Path((id, artifact)) = path.map_err(rejected)?;
    let artifact: ExportArtifact = serde_json::from_value(Value::String(artifact.clone()))
        .map_err(|_| ServerError::NotFound(format!("export '{}'", artifact)))?;

    let export = state
        .store
        .with_session(&id, |session| session.export(artifact))
        .ok_or_else(|| unknown_session(&id))??;

    log_info(format!("💾 Export {} ({} bytes)", export.file_name, export.bytes.len()));

    let disposition = format!("attachment; filename=\"{}\"", export.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response())
}

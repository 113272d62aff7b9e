//! HTTP surface for the inventory ingestion service.
//!
//! Routes:
//!
//! - `GET /api/status` – Liveness snapshot with the record count and version.
//! - `POST /api/inventory` – Ingest one record (`add_inventory`) or a batch (`sync_inventory`).
//! - `GET /api/inventory` – List records, filtered by `site`, `floor`, `room`, `shelf`,
//!   `product`, and trimmed to the trailing `limit`.
//! - `DELETE /api/inventory` – Drop every record.
//! - `GET /api/stats` – Aggregate counts and distinct locations.
//! - `GET /api/logs` – Most recent request-log entries (`limit`, default 50).
//! - `GET /api/export/csv` / `GET /api/export/json` – Whole-store downloads.
//! - `GET /` – Static web page from the configured asset directory.
//!
//! Every request, matched or not, is written to the [`RequestLog`] before anything else runs.
//! The API-key gate wraps the `/api` routes only.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tower_http::services::ServeDir;

use crate::auth::{ApiKeyGate, api_key_middleware};
use crate::clock::{iso_timestamp, now_iso};
use crate::export::{self, ExportError, ExportFormat};
use crate::ingest::{IngestOutcome, IngestRequest};
use crate::inventory::{
    InventoryQuery, InventoryStore, StoreError, compute_stats, filter_records, last_param,
    parse_limit,
};
use crate::request_log::{DEFAULT_LOG_LIMIT, LogEntry, RequestLog};

/// Version reported by `GET /api/status`.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared handler state: the store and the request log.
pub struct AppState<S> {
    store: Arc<S>,
    log: Arc<RequestLog>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            log: Arc::clone(&self.log),
        }
    }
}

/// Build the full router: API routes, key gate, request logger, and static fallback.
pub fn create_router<S>(
    store: Arc<S>,
    log: Arc<RequestLog>,
    gate: ApiKeyGate,
    static_dir: impl AsRef<Path>,
) -> Router
where
    S: InventoryStore + 'static,
{
    let state = AppState {
        store,
        log: Arc::clone(&log),
    };

    Router::new()
        .route("/api/status", get(get_status::<S>))
        .route(
            "/api/inventory",
            get(list_inventory::<S>)
                .post(ingest_inventory::<S>)
                .delete(clear_inventory::<S>),
        )
        .route("/api/stats", get(get_stats::<S>))
        .route("/api/logs", get(get_logs::<S>))
        .route("/api/export/csv", get(export_csv::<S>))
        .route("/api/export/json", get(export_json::<S>))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(gate),
            api_key_middleware,
        ))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(middleware::from_fn_with_state(log, log_requests))
}

/// Record the request in the request log, then hand it on unchanged.
async fn log_requests(
    State(log): State<Arc<RequestLog>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let entry = LogEntry {
        timestamp: now_iso(),
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        ip,
        user_agent,
    };
    tracing::info!(method = %entry.method, path = %entry.path, ip = %entry.ip, "Request");
    log.record(entry);
    next.run(request).await
}

/// `GET /api/status`.
async fn get_status<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let total_records = state.store.len()?;
    Ok(Json(json!({
        "status": "online",
        "timestamp": now_iso(),
        "totalRecords": total_records,
        "version": API_VERSION,
    }))
    .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddResponse {
    success: bool,
    message: &'static str,
    record_id: usize,
    total_records: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    success: bool,
    message: String,
    records_added: usize,
    total_records: usize,
}

/// `POST /api/inventory`.
///
/// The body is read raw so that malformed JSON yields the same `400` as a bad action.
async fn ingest_inventory<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let request = IngestRequest::parse(&body).map_err(|err| {
        tracing::debug!(error = %err, "Rejected ingest payload");
        ApiError::InvalidFormat
    })?;
    let source = request.source.clone();
    let outcome = request.apply(state.store.as_ref(), &now_iso())?;

    let response = match outcome {
        IngestOutcome::Added(appended) => {
            tracing::info!(
                record_id = appended.first_position,
                total = appended.total,
                source = %source,
                "Inventory record added"
            );
            (
                StatusCode::CREATED,
                Json(AddResponse {
                    success: true,
                    message: "Inventory record added",
                    record_id: appended.first_position,
                    total_records: appended.total,
                }),
            )
                .into_response()
        }
        IngestOutcome::Synced(appended) => {
            tracing::info!(
                added = appended.added,
                total = appended.total,
                source = %source,
                "Inventory synced"
            );
            Json(SyncResponse {
                success: true,
                message: format!("Synced {} inventory records", appended.added),
                records_added: appended.added,
                total_records: appended.total,
            })
            .into_response()
        }
    };
    Ok(response)
}

/// `GET /api/inventory`.
///
/// Parameters arrive as raw pairs so a repeated name cannot fail the request.
async fn list_inventory<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let query = InventoryQuery::from_pairs(params);
    let records = state.store.snapshot()?;
    let total_records = records.len();
    let data = filter_records(records, &query);
    Ok(Json(json!({
        "success": true,
        "totalRecords": total_records,
        "filteredRecords": data.len(),
        "data": data,
    }))
    .into_response())
}

/// `GET /api/stats`.
async fn get_stats<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let stats = compute_stats(&state.store.snapshot()?);
    Ok(Json(json!({ "success": true, "stats": stats })).into_response())
}

/// `GET /api/logs`.
async fn get_logs<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<serde_json::Value>
where
    S: InventoryStore,
{
    let limit = parse_limit(last_param(&params, "limit")).unwrap_or(DEFAULT_LOG_LIMIT);
    Json(json!({
        "success": true,
        "totalLogs": state.log.len(),
        "logs": state.log.tail(limit),
    }))
}

/// `DELETE /api/inventory`. Query parameters are ignored; everything goes.
async fn clear_inventory<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let deleted = state.store.clear()?;
    tracing::warn!(deleted, "Inventory cleared");
    Ok(Json(json!({
        "success": true,
        "message": format!("Deleted {deleted} inventory records"),
        "deletedRecords": deleted,
        "totalRecords": state.store.len()?,
    }))
    .into_response())
}

/// `GET /api/export/csv`.
async fn export_csv<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let body = export::to_csv(&state.store.snapshot()?)?;
    Ok(attachment(ExportFormat::Csv, body))
}

/// `GET /api/export/json`.
async fn export_json<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
    S: InventoryStore,
{
    let body = export::to_json(&state.store.snapshot()?)?;
    Ok(attachment(ExportFormat::Json, body))
}

fn attachment(format: ExportFormat, body: String) -> Response {
    let now = OffsetDateTime::now_utc();
    let filename = format.filename(now);
    tracing::info!(filename = %filename, exported_at = %iso_timestamp(now), "Export generated");
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Failures surfaced to HTTP callers as `{success: false, error}` bodies.
#[derive(Debug)]
pub enum ApiError {
    /// Bad action or `data` shape (`400`).
    InvalidFormat,
    /// Key gate rejected the request (`401`).
    Unauthorized,
    /// Anything else (`500`); details go to the diagnostic log only.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidFormat => (StatusCode::BAD_REQUEST, "Invalid data format"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<ExportError> for ApiError {
    fn from(inner: ExportError) -> Self {
        tracing::error!(error = %inner, "Failed to render export");
        Self::Internal
    }
}

impl From<StoreError> for ApiError {
    fn from(inner: StoreError) -> Self {
        tracing::error!(error = %inner, "Inventory store failure");
        Self::Internal
    }
}

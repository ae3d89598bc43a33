//! HTTP request handlers for the payment service.
//!
//! Implements the upload boundary and the payment-control routes using
//! axum. Validation failures map to 400, missing entities to 404, illegal
//! status transitions to 409, storage failures to 500; extraction failures
//! never fail an upload.

use crate::orchestrator::{self, UploadResponse};
use crate::registry::PhysiotherapistRegistry;
use crate::storage::{PaymentStore, StorageError};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router as AxumRouter,
};
use fisiopay_domain::{
    DocumentKind, MonthFormatError, NotificationStatus, PaymentStatus, RecordId, ReferenceMonth,
};
use fisiopay_extractor::FinancialExtractor;
use fisiopay_ledger::{LedgerError, ManualRecordRequest, PaymentLedger};
use fisiopay_sandbox::TextSandbox;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

/// Uploads above this size are rejected outright
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Physiotherapist roster
    pub registry: Arc<PhysiotherapistRegistry>,
    /// Monthly payment ledger
    pub ledger: Arc<PaymentLedger>,
    /// Uploaded document store
    pub store: Arc<PaymentStore>,
    /// Text-extraction sandbox
    pub sandbox: Arc<TextSandbox>,
    /// Financial-field extractor
    pub extractor: Arc<FinancialExtractor>,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable error code
    pub code: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed required input
    Validation(String),
    /// Referenced physiotherapist or control absent
    NotFound(String),
    /// Illegal ledger state change
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// Filesystem failure storing the artifact
    Storage(String),
    /// Anything else
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation", m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
            AppError::InvalidTransition { from, to } => (
                StatusCode::CONFLICT,
                "invalid_transition",
                format!("Invalid status transition: {} -> {}", from, to),
            ),
            AppError::Storage(m) => (StatusCode::INTERNAL_SERVER_ERROR, "storage", m),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", m),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ControlNotFound(_) | LedgerError::RecordNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            LedgerError::InvalidTransition { from, to } => AppError::InvalidTransition { from, to },
            LedgerError::Validation(_) | LedgerError::RemovalDenied(_) => {
                AppError::Validation(e.to_string())
            }
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<MonthFormatError> for AppError {
    fn from(e: MonthFormatError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Parse a JSON body into a typed request, as a 400 instead of axum's
/// default rejection
fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))
}

fn parse_record_id(raw: &str) -> Result<RecordId, AppError> {
    RecordId::from_string(raw).map_err(AppError::Validation)
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall status
    pub status: String,
    /// Registered physiotherapists
    pub physiotherapist_count: usize,
    /// Open monthly controls
    pub open_controls: usize,
}

/// GET /health - liveness check
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        physiotherapist_count: state.registry.count(),
        open_controls: state.ledger.list_controls().len(),
    })
}

/// POST /payments/:month/upload - multipart document upload
///
/// Fields: `file` (binary), `fileType` (rpa|nf|pix), `physiotherapistId`
/// (decimal string). For RPA uploads the response carries the parsed
/// values, or a warning when extraction failed.
async fn upload_payment_document(
    State(state): State<AppState>,
    Path(month): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let month = ReferenceMonth::parse(&month)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut file_type: Option<String> = None;
    let mut physiotherapist_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file field: {}", e)))?;
                file = Some((name, data.to_vec()));
            }
            Some("fileType") => {
                file_type = Some(read_text_field(field).await?);
            }
            Some("physiotherapistId") => {
                physiotherapist_id = Some(read_text_field(field).await?);
            }
            _ => {}
        }
    }

    let (original_name, data) =
        file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let kind = file_type
        .ok_or_else(|| AppError::Validation("fileType is required".to_string()))
        .and_then(|raw| {
            DocumentKind::parse(&raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid fileType: {}", raw)))
        })?;
    let physiotherapist_id = physiotherapist_id
        .ok_or_else(|| AppError::Validation("physiotherapistId is required".to_string()))
        .and_then(|raw| {
            raw.trim().parse::<u32>().map_err(|_| {
                AppError::Validation(format!("physiotherapistId must be an integer: {}", raw))
            })
        })?;

    let response = orchestrator::process_upload(
        &state,
        &month,
        kind,
        physiotherapist_id,
        &original_name,
        data,
    )
    .await?;

    Ok(Json(response))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {}", e)))
}

/// Create-control request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateControlRequest {
    reference_month: String,
}

/// POST /payment-control - open the control for a month (idempotent)
///
/// 201 on first open, 200 when the control already exists; both return the
/// control with its records.
async fn create_control(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, AppError> {
    let request: CreateControlRequest = parse_body(body)?;
    let month = ReferenceMonth::parse(&request.reference_month)?;

    let already_open = state.ledger.is_open(&month);
    let control = state.ledger.open_control(&month, &state.registry.active());

    let status = if already_open {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(control)).into_response())
}

/// GET /payment-control - list controls, newest month first
async fn list_controls(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.list_controls())
}

/// GET /payment-control/:month - one control with its records
async fn get_control(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let month = ReferenceMonth::parse(&month)?;
    Ok(Json(state.ledger.control(&month)?))
}

/// POST /payment-control/:month/records - add a manual payment record
async fn add_manual_record(
    State(state): State<AppState>,
    Path(month): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, AppError> {
    let month = ReferenceMonth::parse(&month)?;
    let request: ManualRecordRequest = parse_body(body)?;

    let record = state.ledger.add_manual_record(&month, request)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// Status-update request body
#[derive(Debug, Deserialize)]
struct StatusUpdateRequest {
    status: String,
}

/// PUT /payment-control/:month/records/:id/status - advance payment status
async fn update_payment_status(
    State(state): State<AppState>,
    Path((month, record_id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let month = ReferenceMonth::parse(&month)?;
    let record_id = parse_record_id(&record_id)?;
    let request: StatusUpdateRequest = parse_body(body)?;
    let target = PaymentStatus::parse(&request.status)
        .ok_or_else(|| AppError::Validation(format!("Invalid payment status: {}", request.status)))?;

    Ok(Json(state.ledger.advance_payment_status(&month, record_id, target)?))
}

/// PUT /payment-control/:month/records/:id/notification - advance
/// notification status
async fn update_notification_status(
    State(state): State<AppState>,
    Path((month, record_id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let month = ReferenceMonth::parse(&month)?;
    let record_id = parse_record_id(&record_id)?;
    let request: StatusUpdateRequest = parse_body(body)?;
    let target = NotificationStatus::parse(&request.status).ok_or_else(|| {
        AppError::Validation(format!("Invalid notification status: {}", request.status))
    })?;

    Ok(Json(state.ledger.advance_notification_status(&month, record_id, target)?))
}

/// DELETE /payment-control/:month/records/:id - remove a manual record
async fn remove_record(
    State(state): State<AppState>,
    Path((month, record_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let month = ReferenceMonth::parse(&month)?;
    let record_id = parse_record_id(&record_id)?;

    state.ledger.remove_manual_record(&month, record_id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/payments/:month/upload", post(upload_payment_document))
        .route("/payment-control", get(list_controls).post(create_control))
        .route("/payment-control/:month", get(get_control))
        .route("/payment-control/:month/records", post(add_manual_record))
        .route(
            "/payment-control/:month/records/:record_id/status",
            put(update_payment_status),
        )
        .route(
            "/payment-control/:month/records/:record_id/notification",
            put(update_notification_status),
        )
        .route(
            "/payment-control/:month/records/:record_id",
            axum::routing::delete(remove_record),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

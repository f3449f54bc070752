use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use omopackager_core::PersonId;
use omopackager_export::{ErrorCategory, ExportError};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

/// Number of source rows skipped while building the record.
pub const REJECTED_ROWS_HEADER: &str = "x-rejected-rows";
/// Comma-separated sections emitted empty after a data-source failure.
pub const FAILED_SECTIONS_HEADER: &str = "x-failed-sections";

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "OMOPackager",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz(State(state): State<AppState>) -> Response {
    let warehouse = state.exporter.warehouse();
    match warehouse.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ready" })).into_response(),
        Err(e) => {
            tracing::warn!(backend = warehouse.backend_name(), error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// `GET /phenopacket/{person_id}`
pub async fn export_phenopacket(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let person_id: PersonId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_person_id", e.to_string()),
    };

    match state.exporter.export_with_cancel(person_id, &state.shutdown).await {
        Ok(report) => {
            let rejected = report.rejected_rows.len();
            let failed: Vec<String> = report
                .section_failures
                .iter()
                .map(|f| f.section.to_string())
                .collect();

            let mut res = (StatusCode::OK, Json(report.phenopacket)).into_response();
            res.headers_mut()
                .insert(REJECTED_ROWS_HEADER, HeaderValue::from(rejected));
            if !failed.is_empty()
                && let Ok(value) = HeaderValue::from_str(&failed.join(","))
            {
                res.headers_mut().insert(FAILED_SECTIONS_HEADER, value);
            }
            res
        }
        Err(err) => export_error_response(&err),
    }
}

/// HTTP status for an export failure.
pub fn status_for(err: &ExportError) -> StatusCode {
    match err.category() {
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::InvalidData => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::DataSource | ErrorCategory::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn export_error_response(err: &ExportError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(error = %err, category = %err.category(), "export failed");
    } else {
        tracing::info!(error = %err, category = %err.category(), "export rejected");
    }
    error_response(status, &err.category().to_string(), err.to_string())
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

//! HTTP request handlers.

use super::AppState;
use crate::db::{validate, StatusReport, StatusReportInput};
use crate::error::Error;
use crate::metrics;
use crate::query::{
    evaluate, fleet_summary, history_page, latest_for_device, latest_statuses, FleetSummary,
    HistoryPage, RiskAssessment, RiskThresholds, DEFAULT_PAGE_SIZE,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ============================================================================
// Error mapping
// ============================================================================

/// Wraps the crate error so handlers can use `?` and still emit the right
/// status code and JSON body.
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Validation"),
            Error::DeviceNotFound(_) => (StatusCode::NOT_FOUND, "DeviceNotFound"),
            Error::PageOutOfRange { .. } => (StatusCode::BAD_REQUEST, "PageOutOfRange"),
            Error::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "StoreUnavailable"),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": error,
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

// ============================================================================
// Write path
// ============================================================================

pub async fn handle_create_status(
    State(state): State<AppState>,
    Json(input): Json<StatusReportInput>,
) -> Result<(StatusCode, Json<StatusReport>), ApiError> {
    validate(&input)?;

    let report = state.store.record_status(&input).map_err(Error::from)?;

    metrics::HEARTBEAT_COUNT.inc();
    tracing::debug!("recorded status {} for device {}", report.id, report.device_id);

    Ok((StatusCode::CREATED, Json(report)))
}

// ============================================================================
// Fleet reads
// ============================================================================

pub async fn handle_summary(
    State(state): State<AppState>,
) -> Result<Json<FleetSummary>, ApiError> {
    let latest = latest_statuses(&state.store)?;
    let summary = fleet_summary(&latest);

    metrics::ONLINE_DEVICES.set(summary.online_devices as f64);
    if !latest.is_empty() {
        let total_battery: i64 = latest.iter().map(|r| r.battery_level).sum();
        metrics::AVERAGE_BATTERY.set(total_battery as f64 / latest.len() as f64);
    }

    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct AtRiskResponse {
    pub risk_devices: Vec<RiskAssessment>,
}

pub async fn handle_at_risk(
    State(state): State<AppState>,
) -> Result<Json<AtRiskResponse>, ApiError> {
    let thresholds = RiskThresholds {
        stale_after: Duration::minutes(state.config.stale_after_minutes),
        low_battery: state.config.low_battery,
    };

    let latest = latest_statuses(&state.store)?;
    let risk_devices = evaluate(&latest, Utc::now(), thresholds);

    metrics::AT_RISK_DEVICES.set(risk_devices.len() as f64);

    Ok(Json(AtRiskResponse { risk_devices }))
}

// ============================================================================
// Per-device reads
// ============================================================================

pub async fn handle_latest_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<StatusReport>, ApiError> {
    match latest_for_device(&state.store, &device_id)? {
        Some(report) => Ok(Json(report)),
        None => Err(Error::DeviceNotFound(device_id).into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn handle_history(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let history = history_page(&state.store, &device_id, page, page_size)?;
    Ok(Json(history))
}

// ============================================================================
// Operational endpoints (no auth)
// ============================================================================

pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn handle_metrics() -> String {
    metrics::gather_metrics()
}

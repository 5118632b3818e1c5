//! Fatigue, correlation, diagnostics and emergency routes

use alerting::Alert;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use correlation::CorrelationResult;
use fatigue::FatigueState;
use serde::{Deserialize, Serialize};
use session::SessionDiagnostics;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    pub data: Vec<CorrelationResult>,
    pub elevated_risk: Vec<String>,
}

/// Emergency declaration body
#[derive(Debug, Deserialize)]
pub struct EmergencyRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct EmergencyResponse {
    pub alert: Alert,
    pub dispatched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_error: Option<String>,
}

/// Current fatigue state
pub async fn get_fatigue(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<FatigueState>> {
    let handle = state.manager.session(session_id).await?;
    let fatigue = handle.lock().await.current_fatigue_state();
    Ok(Json(fatigue))
}

/// Correlation results over the current window
pub async fn get_correlations(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<CorrelationResponse>> {
    let handle = state.manager.session(session_id).await?;
    let data = handle.lock().await.correlation_snapshot();
    let elevated_risk = data
        .iter()
        .filter(|r| r.elevated_risk)
        .map(|r| r.pair.clone())
        .collect();
    Ok(Json(CorrelationResponse { data, elevated_risk }))
}

/// Source staleness and pipeline counters
pub async fn get_diagnostics(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionDiagnostics>> {
    let handle = state.manager.session(session_id).await?;
    let now_ms = Utc::now().timestamp_millis().max(0) as u64;
    let diagnostics = handle.lock().await.diagnostics(now_ms);
    Ok(Json(diagnostics))
}

/// Declare an emergency. The alert is raised even when dispatch fails.
pub async fn declare_emergency(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<EmergencyRequest>,
) -> ApiResult<(StatusCode, Json<EmergencyResponse>)> {
    if request.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("reason is required".to_string()));
    }

    let handle = state.manager.session(session_id).await?;
    let outcome = handle.lock().await.declare_emergency(&request.reason);

    Ok((
        StatusCode::CREATED,
        Json(EmergencyResponse {
            alert: outcome.alert,
            dispatched: outcome.dispatch.is_ok(),
            dispatch_error: outcome.dispatch.err().map(|e| e.to_string()),
        }),
    ))
}

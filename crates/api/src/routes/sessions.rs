//! Session Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use session::SessionSummary;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// Check-in request body
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub driver_id: String,
    pub vehicle_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub session_id: Uuid,
    pub driver_id: String,
    pub vehicle_id: String,
}

/// Active session listing entry
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub driver_id: String,
    pub vehicle_id: String,
    pub fatigue: &'static str,
    pub open_alerts: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub data: Vec<SessionInfo>,
    pub count: usize,
}

/// Query parameters for the summaries endpoint
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct SummaryListResponse {
    pub data: Vec<SessionSummary>,
    pub count: usize,
}

/// Check a driver in
pub async fn check_in(
    State(state): State<SharedState>,
    Json(request): Json<CheckInRequest>,
) -> ApiResult<(StatusCode, Json<CheckInResponse>)> {
    if request.driver_id.trim().is_empty() || request.vehicle_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "driver_id and vehicle_id are required".to_string(),
        ));
    }

    let session_id = state
        .manager
        .check_in(&request.driver_id, &request.vehicle_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse {
            session_id,
            driver_id: request.driver_id,
            vehicle_id: request.vehicle_id,
        }),
    ))
}

/// Check a driver out, returning the session summary
pub async fn check_out(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionSummary>> {
    let summary = state.manager.check_out(session_id).await?;
    Ok(Json(summary))
}

/// List active sessions
pub async fn list_sessions(State(state): State<SharedState>) -> ApiResult<Json<SessionListResponse>> {
    let mut data = Vec::new();
    for id in state.manager.active_sessions().await {
        // Checked out between listing and lookup
        let Ok(handle) = state.manager.session(id).await else {
            continue;
        };
        let session = handle.lock().await;
        data.push(SessionInfo {
            session_id: id,
            driver_id: session.driver_id().to_string(),
            vehicle_id: session.vehicle_id().to_string(),
            fatigue: session.current_fatigue_state().level.as_str(),
            open_alerts: session.open_alerts().len(),
        });
    }

    Ok(Json(SessionListResponse {
        count: data.len(),
        data,
    }))
}

/// Recently checked-out session summaries
pub async fn list_summaries(
    State(state): State<SharedState>,
    Query(params): Query<SummaryQuery>,
) -> ApiResult<Json<SummaryListResponse>> {
    let data = state
        .summaries
        .recent(params.limit.min(1000))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SummaryListResponse {
        count: data.len(),
        data,
    }))
}

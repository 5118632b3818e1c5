//! Alert Routes

use alerting::{Alert, AlertId};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// Query parameters for alerts endpoints
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by severity (`info`, `warning`, `emergency`)
    pub severity: Option<String>,
    /// Filter by acknowledged status
    pub acknowledged: Option<bool>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoints
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    pub unacknowledged_count: usize,
}

impl AlertQuery {
    fn apply(&self, alerts: Vec<Alert>) -> ApiResult<AlertResponse> {
        if let Some(severity) = self.severity.as_deref() {
            if !matches!(severity, "info" | "warning" | "emergency") {
                return Err(ApiError::BadRequest(format!("unknown severity '{}'", severity)));
            }
        }

        let data: Vec<Alert> = alerts
            .into_iter()
            .filter(|a| {
                self.severity
                    .as_deref()
                    .map_or(true, |s| a.severity.as_str() == s)
            })
            .filter(|a| {
                self.acknowledged
                    .map_or(true, |ack| a.is_acknowledged() == ack)
            })
            .take(self.limit.min(1000))
            .collect();

        let unacknowledged_count = data.iter().filter(|a| !a.is_acknowledged()).count();
        Ok(AlertResponse {
            count: data.len(),
            unacknowledged_count,
            data,
        })
    }
}

/// Open alerts of a session
pub async fn get_alerts(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<AlertQuery>,
) -> ApiResult<Json<AlertResponse>> {
    let handle = state.manager.session(session_id).await?;
    let alerts = handle.lock().await.open_alerts();
    Ok(Json(params.apply(alerts)?))
}

/// Every alert of a session, most recent first
pub async fn get_history(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<AlertQuery>,
) -> ApiResult<Json<AlertResponse>> {
    let handle = state.manager.session(session_id).await?;
    let mut alerts = handle.lock().await.alert_history();
    alerts.sort_by(|a, b| b.raised_at_ms.cmp(&a.raised_at_ms));
    Ok(Json(params.apply(alerts)?))
}

/// Acknowledge an open alert
pub async fn acknowledge(
    State(state): State<SharedState>,
    Path((session_id, alert_id)): Path<(Uuid, AlertId)>,
) -> ApiResult<Json<Alert>> {
    let handle = state.manager.session(session_id).await?;
    let alert = handle.lock().await.acknowledge_alert(alert_id)?;
    Ok(Json(alert))
}

/// Clear an open alert
pub async fn clear(
    State(state): State<SharedState>,
    Path((session_id, alert_id)): Path<(Uuid, AlertId)>,
) -> ApiResult<Json<Alert>> {
    let handle = state.manager.session(session_id).await?;
    let alert = handle.lock().await.clear_alert(alert_id)?;
    Ok(Json(alert))
}

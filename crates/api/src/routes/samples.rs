//! Sample ingestion

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use telemetry::Sample;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// A single sample or a batch, in arrival order
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SamplePayload {
    One(Sample),
    Batch(Vec<Sample>),
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub accepted: usize,
}

/// Ingest driver or vehicle samples.
///
/// A batch stops at the first invalid sample; earlier ones stay ingested
/// and their count is reported in the error body.
pub async fn ingest(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SamplePayload>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let handle = state.manager.session(session_id).await?;
    let mut session = handle.lock().await;

    let accepted = match payload {
        SamplePayload::One(sample) => {
            session.ingest(sample)?;
            1
        }
        SamplePayload::Batch(samples) => {
            let mut accepted = 0;
            for sample in samples {
                session
                    .ingest(sample)
                    .map_err(|source| ApiError::BatchRejected { accepted, source })?;
                accepted += 1;
            }
            accepted
        }
    };

    Ok((StatusCode::ACCEPTED, Json(IngestResponse { accepted })))
}

//! Request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use vproc_models::JobOutcome;

use crate::error::{ServerError, ServerResult};
use crate::intake;
use crate::pipeline;
use crate::state::AppState;

/// Successful processing response.
#[derive(Serialize)]
pub struct ProcessResponse {
    pub message: String,
    pub object: String,
    pub url: String,
}

/// Trigger endpoint: process one "file uploaded" notification.
pub async fn process_video(
    State(state): State<AppState>,
    Json(envelope): Json<serde_json::Value>,
) -> ServerResult<Json<ProcessResponse>> {
    let job = match intake::decode_notification(&envelope) {
        Ok(job) => job,
        Err(e) => {
            warn!("Rejecting notification: {}", e);
            return Err(ServerError::from(e));
        }
    };

    info!(job_id = %job.id, object = %job.source_object, "Job admitted");

    let output_object = job.output_object.clone();
    let outcome = pipeline::run_job(
        job,
        &state.workspace,
        state.store.as_ref(),
        state.transcoder.as_ref(),
        &state.spec,
    )
    .await;

    match outcome {
        JobOutcome::Succeeded { public_url } => Ok(Json(ProcessResponse {
            message: "Processing finished successfully".to_string(),
            object: output_object,
            url: public_url,
        })),
        JobOutcome::Failed { stage, message } => Err(ServerError::pipeline(stage, message)),
        // Intake already rejected malformed payloads above
        JobOutcome::RejectedInvalidPayload => {
            Err(ServerError::from(intake::PayloadError::MalformedEnvelope))
        }
    }
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness check endpoint (readiness probe).
/// Checks connectivity to the object store.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    match state.store.check_connectivity().await {
        Ok(()) => Ok(Json(ReadinessResponse {
            status: "ready".to_string(),
            error: None,
        })),
        Err(e) => {
            warn!("Store connectivity check failed: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "degraded".to_string(),
                    error: Some(e.to_string()),
                }),
            ))
        }
    }
}

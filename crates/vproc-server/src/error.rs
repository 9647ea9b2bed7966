//! Server error types and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vproc_models::FailureStage;

use crate::intake::PayloadError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    #[error("Processing failed at {stage} stage: {message}")]
    Pipeline {
        stage: FailureStage,
        message: String,
    },
}

impl ServerError {
    pub fn pipeline(stage: FailureStage, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage,
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal diagnostics (encoder output, store errors) are logged at
        // the failure site, never echoed to the caller.
        let detail = match &self {
            ServerError::InvalidPayload(_) => "Bad request: missing filename".to_string(),
            ServerError::Pipeline { .. } => "Internal server error: video processing failed".to_string(),
        };

        let body = ErrorResponse { detail };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ServerError::InvalidPayload(PayloadError::MissingName);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ServerError::pipeline(FailureStage::Transcode, "encoder exploded");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

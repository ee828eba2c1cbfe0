//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sentra_sdk::SdkError;
use serde_json::json;
use thiserror::Error;

/// Server error type
#[derive(Error, Debug)]
pub enum ServerError {
    /// Pipeline failed while scoring or persisting
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// Malformed request or rejected settings
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not permitted in the current settings
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::PipelineError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            ServerError::PipelineError(msg)
            | ServerError::InvalidRequest(msg)
            | ServerError::Forbidden(msg)
            | ServerError::InternalError(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", error_message);
        }

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<SdkError> for ServerError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            SdkError::InvalidSettings(e) => ServerError::InvalidRequest(e.to_string()),
            SdkError::SimulationDisabled => {
                ServerError::Forbidden(SdkError::SimulationDisabled.to_string())
            }
            other => ServerError::PipelineError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

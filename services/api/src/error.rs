//! services/api/src/error.rs
//!
//! The service's error type and its mapping onto HTTP responses.

use crate::config::ConfigError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use protein_designer_core::ports::PortError;
use protein_designer_core::SubmitError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A lookup in the session registry (or a session's job) came up empty.
    #[error("{0}")]
    Port(#[from] PortError),

    /// The designer refused or failed a submission.
    #[error("{0}")]
    Submit(#[from] SubmitError),

    /// The request body was not valid JSON for the expected payload.
    #[error("Malformed request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("{0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Submit(SubmitError::Invalid(_)) => StatusCode::BAD_REQUEST,
            ApiError::Submit(SubmitError::QuotaExhausted) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Submit(SubmitError::AlreadyGenerating) => StatusCode::CONFLICT,
            ApiError::InvalidBody(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Submit(_) | ApiError::Config(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        (status, self.to_string()).into_response()
    }
}

//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use persona_rag::RagError;
use serde::Serialize;
use thiserror::Error;

/// Detail returned when the request carries no usable question.
pub const QUESTION_REQUIRED: &str = "Question must be provided";

/// Body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Failures surfaced by the HTTP layer.
///
/// Clients only see `{"detail": ...}`: validation problems map to 400, any
/// retrieval or generation failure to 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Rag(#[from] RagError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Rag(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Validation(detail) => tracing::debug!(%detail, "rejected request"),
            ApiError::Rag(error) => tracing::error!(%error, "request failed"),
        }

        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

//! Error types for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::artifacts::RetentionError;
use crate::pipeline::PipelineError;

/// Handler result type
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// Missing or malformed form field
    #[error("{0}")]
    Unprocessable(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Retention(#[from] RetentionError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            AppError::Unprocessable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", None)
            }
            AppError::Pipeline(e) => match e {
                PipelineError::Decode(_) => (StatusCode::BAD_REQUEST, "decode_error", None),
                PipelineError::InvalidDpi(_) => (StatusCode::BAD_REQUEST, "invalid_dpi", None),
                PipelineError::PageNotFound { page, page_count } => (
                    StatusCode::NOT_FOUND,
                    "page_not_found",
                    Some(json!({ "page": page, "pageCount": page_count })),
                ),
                PipelineError::InvalidRegion {
                    page, index, kind, ..
                } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "invalid_region",
                    Some(json!({ "page": page, "index": index, "kind": kind })),
                ),
                PipelineError::Storage(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
                }
                PipelineError::Render(_) | PipelineError::Task(_) | PipelineError::Cancelled => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
            },
            AppError::Retention(_) => (StatusCode::INTERNAL_SERVER_ERROR, "retention_error", None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "An internal error occurred".to_string()
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error,
            message,
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RegionError;
    use crate::pipeline::BoxKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unprocessable("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                PipelineError::Decode("bad".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::PageNotFound {
                    page: 3,
                    page_count: 1,
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                PipelineError::Cancelled.into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_invalid_region_details() {
        let err = AppError::from(PipelineError::InvalidRegion {
            page: 2,
            index: 5,
            kind: BoxKind::Caption,
            source: RegionError::NonFinite,
        });

        let (status, error, details) = err.parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error, "invalid_region");
        assert_eq!(
            details,
            Some(json!({ "page": 2, "index": 5, "kind": "caption" }))
        );
    }
}

//! Error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medbot_core::{AppError, ErrorKind};
use serde::Serialize;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Message a client sees for `err`.
///
/// Validation and readiness messages are passed through; everything else
/// gets a fixed message per kind so upstream details stay in the logs.
pub fn public_message(err: &AppError) -> String {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::NotReady => err.to_string(),
        ErrorKind::Config => "Error generating answer: service is misconfigured.".to_string(),
        ErrorKind::UpstreamUnavailable => {
            "Error generating answer: an upstream service is unavailable.".to_string()
        }
        ErrorKind::UpstreamError => {
            "Error generating answer: an upstream service returned an error.".to_string()
        }
        ErrorKind::Internal => "Error generating answer: internal error.".to_string(),
    }
}

/// [`AppError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(kind = kind.as_str(), "Request failed: {}", self.0);
        } else {
            tracing::debug!(kind = kind.as_str(), "Request rejected: {}", self.0);
        }

        let body = ErrorBody {
            detail: public_message(&self.0),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_upstream_details() {
        let err = AppError::Llm("Groq API error (500): secret trace".to_string());
        let message = public_message(&err);
        assert!(!message.contains("secret"));
        assert!(message.starts_with("Error generating answer"));
    }

    #[test]
    fn test_public_message_passes_validation_through() {
        let err = AppError::Validation("Question cannot be empty.".to_string());
        assert_eq!(public_message(&err), "Question cannot be empty.");
        assert_eq!(public_message(&AppError::NotReady), "Model not initialized yet.");
    }

    #[test]
    fn test_status_from_kind() {
        let response = ApiError(AppError::UpstreamUnavailable("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError(AppError::Validation("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(AppError::NotReady).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Error types for the Medbot service.
//!
//! This module defines a unified error enum covering configuration, ingestion,
//! embedding, vector store, chat model, prompt, and request validation
//! failures, plus the coarse [`ErrorKind`] taxonomy the HTTP layer maps to
//! status codes.

use thiserror::Error;

/// Unified error type for the Medbot service.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document loading and splitting errors
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector database errors
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Chat model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Invalid caller input
    #[error("{0}")]
    Validation(String),

    /// The answer pipeline has not finished initializing
    #[error("Model not initialized yet.")]
    NotReady,

    /// A remote service could not be reached or is temporarily refusing work
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Coarse error classification used at service boundaries.
///
/// Each kind maps to one stable HTTP status code and one client-facing
/// message; the detailed error text stays in the server logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    NotReady,
    UpstreamUnavailable,
    UpstreamError,
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::UpstreamUnavailable => 503,
            Self::Config | Self::NotReady | Self::UpstreamError | Self::Internal => 500,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Validation => "validation",
            Self::NotReady => "not_ready",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UpstreamError => "upstream_error",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Config,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotReady => ErrorKind::NotReady,
            AppError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            AppError::Embedding(_) | AppError::VectorStore(_) | AppError::Llm(_) => {
                ErrorKind::UpstreamError
            }
            AppError::Io(_)
            | AppError::Ingestion(_)
            | AppError::Prompt(_)
            | AppError::Serialization(_)
            | AppError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Build the error for a failed HTTP exchange with a remote service.
    ///
    /// Connection failures and timeouts are reported as
    /// [`AppError::UpstreamUnavailable`]; anything else is handed to `wrap`
    /// so each caller keeps its own variant.
    pub fn from_transport(
        service: &str,
        err: &reqwest::Error,
        wrap: fn(String) -> AppError,
    ) -> AppError {
        let message = format!("{} request failed: {}", service, err);
        if err.is_connect() || err.is_timeout() {
            AppError::UpstreamUnavailable(message)
        } else {
            wrap(message)
        }
    }

    /// Build the error for a non-success HTTP status from a remote service.
    ///
    /// 401/403 mean the configured credentials are wrong and are reported as
    /// configuration errors; 429 and 502-504 are treated as temporary
    /// unavailability.
    pub fn from_status(
        service: &str,
        status: u16,
        body: &str,
        wrap: fn(String) -> AppError,
    ) -> AppError {
        let message = format!("{} API error ({}): {}", service, status, body);
        match status {
            401 | 403 => AppError::Config(format!(
                "{} rejected the configured credentials ({}): {}",
                service, status, body
            )),
            429 | 502 | 503 | 504 => AppError::UpstreamUnavailable(message),
            _ => wrap(message),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::Config("x".into()).kind(), ErrorKind::Config);
        assert_eq!(AppError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(AppError::NotReady.kind(), ErrorKind::NotReady);
        assert_eq!(AppError::Llm("x".into()).kind(), ErrorKind::UpstreamError);
        assert_eq!(AppError::VectorStore("x".into()).kind(), ErrorKind::UpstreamError);
        assert_eq!(AppError::Ingestion("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::NotReady.status_code(), 500);
        assert_eq!(ErrorKind::UpstreamUnavailable.status_code(), 503);
        assert_eq!(ErrorKind::UpstreamError.status_code(), 500);
    }

    #[test]
    fn test_from_status() {
        let err = AppError::from_status("Groq", 401, "bad key", AppError::Llm);
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = AppError::from_status("Groq", 429, "slow down", AppError::Llm);
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);

        let err = AppError::from_status("Groq", 400, "bad request", AppError::Llm);
        assert!(matches!(err, AppError::Llm(_)));
        assert!(err.to_string().contains("bad request"));
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinder_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtsError>;

/// Relay errors with appropriate HTTP status codes
///
/// Provider hiccups never show up here: the transport and fetcher report
/// failure by absence and the generator retries or drops the chunk.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Text was empty or whitespace only
    #[error("Text is required")]
    EmptyInput,

    /// Invalid request parameters (unknown voice, bad speed, malformed body)
    #[error("{0}")]
    InvalidRequest(String),

    /// Text exceeds the accepted length at the HTTP boundary
    #[error("Text too long (max {max} characters)")]
    TextTooLong { max: usize },

    /// Not a single chunk produced audio, even after retrying
    #[error("Generation failed: no audio produced for any of {chunks} chunk(s)")]
    GenerationFailed { chunks: usize },

    /// Artifact lookup or persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Artifact store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No artifact with this id, or its payload is gone
    #[error("File not found or expired")]
    NotFound(String),

    /// The artifact exists but its lifetime has elapsed
    #[error("File has expired")]
    Expired(String),

    /// Filesystem failure while reading or writing artifacts
    #[error("artifact storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk index could not be decoded or encoded
    #[error("artifact index is unreadable: {0}")]
    Index(#[from] serde_json::Error),
}

impl HttpError for TtsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyInput | Self::InvalidRequest(_) | Self::TextTooLong { .. } => StatusCode::BAD_REQUEST,
            Self::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Expired(_)) => StatusCode::GONE,
            Self::Store(_) | Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::EmptyInput | Self::InvalidRequest(_) | Self::TextTooLong { .. } => "invalid_request_error",
            Self::GenerationFailed { .. } => "generation_error",
            Self::Store(StoreError::NotFound(_)) => "not_found_error",
            Self::Store(StoreError::Expired(_)) => "expired_error",
            Self::Store(_) | Self::ConfigError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Store(StoreError::Io(_) | StoreError::Index(_)) | Self::ConfigError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(self.error_body())).into_response()
    }
}

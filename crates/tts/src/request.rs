use axum::{body::Body, response::IntoResponse};
use serde::de::DeserializeOwned;

use crate::error::TtsError;

/// Extractor for JSON request bodies
///
/// Rejections use the same JSON error body as every other failure.
pub struct ExtractPayload<T>(pub T);

/// Body limit for generate requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

impl<S, T: DeserializeOwned> axum::extract::FromRequest<S> for ExtractPayload<T>
where
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let is_json = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.split(';').next().is_some_and(|mime| mime.trim() == "application/json"));

        if !is_json {
            return Err(TtsError::InvalidRequest("No JSON data provided".to_string()).into_response());
        }

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            let message = if std::error::Error::source(&err)
                .is_some_and(|source| source.is::<http_body_util::LengthLimitError>())
            {
                format!("Request body is too large, limit is {BODY_LIMIT_BYTES} bytes")
            } else {
                format!("Failed to read request body: {err}")
            };

            TtsError::InvalidRequest(message).into_response()
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(TtsError::InvalidRequest("No JSON data provided".to_string()).into_response());
        }

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|e| TtsError::InvalidRequest(format!("Failed to parse request body: {e}")).into_response())
    }
}

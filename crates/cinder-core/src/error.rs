use http::StatusCode;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. The server layer
/// converts these into actual HTTP responses, keeping domain errors
/// decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// JSON error envelope returned to API consumers
    fn error_body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": true,
            "type": self.error_type(),
            "message": self.client_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Gone;

    impl std::fmt::Display for Gone {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("file has expired")
        }
    }

    impl std::error::Error for Gone {}

    impl HttpError for Gone {
        fn status_code(&self) -> StatusCode {
            StatusCode::GONE
        }

        fn error_type(&self) -> &str {
            "expired_error"
        }

        fn client_message(&self) -> String {
            self.to_string()
        }
    }

    #[test]
    fn error_body_carries_flag_type_and_message() {
        let body = Gone.error_body();

        assert_eq!(body["error"], true);
        assert_eq!(body["type"], "expired_error");
        assert_eq!(body["message"], "file has expired");
    }
}

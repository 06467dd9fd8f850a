use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - credentials or token rejected")]
    Unauthorized,

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the backend for every rejection.
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Extract the backend's `{"detail": ...}` message when the body has one.
    fn detail_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|e| e.detail)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message =
            Self::detail_from_body(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 | 409 | 422 => ApiError::BadRequest(message),
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Server-provided detail message, when this error carries one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(detail) if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_extracts_detail() {
        let err = ApiError::from_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#,
        );
        match err {
            ApiError::BadRequest(detail) => assert_eq!(detail, "Email already registered"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_status_unauthorized() {
        let err = ApiError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"detail": "Invalid email or password"}"#,
        );
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_from_status_plain_body_falls_through() {
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            ApiError::ServerError(body) => assert_eq!(body, "upstream down"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncate_body_bounds_long_responses() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body);
        let message = err.to_string();
        assert!(message.len() < body.len());
        assert!(message.contains("truncated"));
    }

    #[test]
    fn test_detail_only_for_bad_request() {
        let bad = ApiError::BadRequest("Username already registered".to_string());
        assert_eq!(bad.detail(), Some("Username already registered"));
        assert_eq!(ApiError::Unauthorized.detail(), None);
        assert_eq!(ApiError::BadRequest(String::new()).detail(), None);
    }
}

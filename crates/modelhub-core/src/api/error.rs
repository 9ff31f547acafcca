use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("Authentication failed ({status}): {message}")]
    Authentication { status: StatusCode, message: String },

    #[error("Not authenticated - log in first")]
    NotAuthenticated,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::HttpStatus {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// Build an authentication error, preferring the server's `detail` field.
    pub fn authentication(status: StatusCode, body: &str) -> Self {
        ApiError::Authentication {
            status,
            message: server_message(body),
        }
    }

    /// Status code the server answered with, if the error came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::HttpStatus { status, .. } | ApiError::Authentication { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Only transport failures are safe to retry; the server never saw a
    /// status-bearing answer for them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Pull a human-readable message out of an error body.
/// FastAPI-style servers answer `{"detail": "..."}`.
pub(crate) fn server_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail").or_else(|| value.get("message")) {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    if body.trim().is_empty() {
        "no message from server".to_string()
    } else {
        ApiError::truncate_body(body.trim())
    }
}

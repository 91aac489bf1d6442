use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session is missing, invalid or expired")]
    Unauthorized,

    /// Rejected before any request was issued
    #[error("{0}")]
    IncompleteInput(&'static str),

    #[error("Request rejected (status {status}){}", suffix(.message))]
    Validation { status: u16, message: Option<String> },

    #[error("Server error (status {status}){}", suffix(.message))]
    Server { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error bodies look like `{"error": "..."}`, except login which uses `{"msg": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    msg: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the server-supplied message out of an error body, if there is one
    pub(crate) fn extract_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.msg))
            .filter(|m| !m.trim().is_empty())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            code @ 400..=499 => ApiError::Validation { status: code, message },
            code @ 500..=599 => ApiError::Server { status: code, message },
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Message to show the operator: the server's own wording when it sent
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::IncompleteInput(text) => (*text).to_string(),
            ApiError::Validation { message: Some(m), .. }
            | ApiError::Server { message: Some(m), .. } => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, ""),
            ApiError::Validation { status: 400, message: None }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::Validation { status: 403, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>"),
            ApiError::Server { status: 502, message: None }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::MULTIPLE_CHOICES, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_server_message_preferred_over_fallback() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Invalid username format"}"#,
        );
        assert_eq!(err.user_message("Failed to create user"), "Invalid username format");

        let err = ApiError::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error": "System error: sudo failed"}"#,
        );
        assert_eq!(err.user_message("Failed to delete user"), "System error: sudo failed");
    }

    #[test]
    fn test_login_msg_field() {
        let body = r#"{"msg": "Bad token"}"#;
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.user_message("x"), "Bad token");
    }

    #[test]
    fn test_fallback_when_no_server_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "not json");
        assert_eq!(err.user_message("Failed to create user"), "Failed to create user");
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error": "  "}"#);
        assert_eq!(err.user_message("Failed to create user"), "Failed to create user");
        assert_eq!(ApiError::Unauthorized.user_message("fallback"), "fallback");
    }

    #[test]
    fn test_display_includes_message() {
        let err = ApiError::Validation {
            status: 403,
            message: Some("Invalid or protected username".into()),
        };
        assert_eq!(
            err.to_string(),
            "Request rejected (status 403): Invalid or protected username"
        );
        let err = ApiError::Server { status: 500, message: None };
        assert_eq!(err.to_string(), "Server error (status 500)");
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(600);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.contains("600 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}

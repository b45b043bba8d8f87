//! Error types for litrev-api

use thiserror::Error;

/// Result type alias using litrev-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback text shown when a review could not be created
pub const CREATE_REVIEW_FALLBACK: &str = "Failed to create review";

/// Errors that can occur when talking to the review service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service answered with a non-success status
    #[error("API error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    /// Review id unknown to the service
    #[error("Review not found: {0}")]
    NotFound(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build an API error from a status code and a raw response body.
    ///
    /// The service reports failures as `{"detail": ...}` where `detail` is
    /// either a string or a list of validation entries carrying `msg`.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            detail: extract_detail(body),
        }
    }

    /// Text suitable for showing to the user after a failed review request
    pub fn user_message(&self) -> String {
        match self {
            Error::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => CREATE_REVIEW_FALLBACK.to_string(),
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        let e = Error::from_response(404, r#"{"detail":"Review not found"}"#);
        assert_eq!(e.user_message(), "Review not found");
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail":[{"loc":["body","topic"],"msg":"Topic must be at least 3 characters long","type":"value_error"}]}"#;
        let e = Error::from_response(422, body);
        assert_eq!(e.user_message(), "Topic must be at least 3 characters long");
    }

    #[test]
    fn test_detail_missing_falls_back() {
        let e = Error::from_response(500, "Internal Server Error");
        assert_eq!(e.user_message(), CREATE_REVIEW_FALLBACK);

        let e = Error::from_response(500, r#"{"detail":""}"#);
        assert_eq!(e.user_message(), CREATE_REVIEW_FALLBACK);
    }

    #[test]
    fn test_non_api_errors_fall_back() {
        assert_eq!(
            Error::InvalidConfig("bad url".into()).user_message(),
            CREATE_REVIEW_FALLBACK
        );
        assert_eq!(
            Error::NotFound("r1".into()).user_message(),
            CREATE_REVIEW_FALLBACK
        );
    }

    #[test]
    fn test_display_includes_status() {
        let e = Error::from_response(503, r#"{"detail":"busy"}"#);
        assert_eq!(e.to_string(), "API error (503): busy");
        let e = Error::Api { status: 500, detail: None };
        assert_eq!(e.to_string(), "API error (500): no detail");
    }
}

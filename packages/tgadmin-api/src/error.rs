//! Error types for the ops backend client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = ApiError::Api {
            status: 404,
            message: "batch not found".into(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_display_includes_status_and_body() {
        let err = ApiError::Api {
            status: 422,
            message: "message text is required".into(),
        };
        let text = err.to_string();
        assert!(text.contains("422"));
        assert!(text.contains("message text is required"));
    }
}

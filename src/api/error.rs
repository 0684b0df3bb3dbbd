//! Api client error types.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors from the admin api client.
///
/// A 401 is not an error for [`ApiClient::request`](super::ApiClient::request),
/// which returns `Ok(None)`; typed endpoints turn that into `Unauthorized`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header `{0}`")]
    InvalidHeader(String),

    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("not signed in (or the session expired)")]
    Unauthorized,

    #[error("cannot store session")]
    Storage(#[source] io::Error),
}

impl ApiError {
    /// Server's `detail` message for FastAPI-style error bodies, else the raw body.
    pub fn detail(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned));
        Some(detail.unwrap_or_else(|| body.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_and_detail() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: r#"{"detail":"File not found"}"#.to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert_eq!(err.detail().as_deref(), Some("File not found"));

        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("upstream down"));
        assert_eq!(ApiError::Unauthorized.detail(), None);
    }
}

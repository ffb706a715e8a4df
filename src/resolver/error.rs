use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::types::ErrorBody;

pub const MISSING_URL_MESSAGE: &str = "URL parameter is required.";
pub const INVALID_URL_MESSAGE: &str = "Invalid URL. Make sure the URL format is correct.";
pub const NOT_FOUND_MESSAGE: &str =
    "Media not found. Make sure the link is valid and the content is not private.";
pub const INTEGRITY_MESSAGE: &str =
    "Upstream server returned invalid response. Try again in a moment.";
pub const TIMEOUT_MESSAGE: &str = "Request timeout. Server took too long to respond, try again.";
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests. Wait a moment and try again.";
pub const SERVER_MESSAGE: &str = "Something went wrong on the server. Try again in a moment.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed.";

/// Every way a resolution can fail, already classified for the caller.
///
/// `Display` yields the raw diagnostic used for server logs, while
/// [`ResolveError::user_message`] is the only text a caller ever sees.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("missing url")]
    MissingUrl,

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("upstream integrity failure: {0}")]
    UpstreamIntegrity(String),

    #[error("no media in upstream response")]
    NotFound,

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("server error: {0}")]
    Server(String),
}

impl ResolveError {
    /// Classifies a transport-level failure from the resolution call.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let raw = err.to_string();
        if err.is_timeout() {
            return Self::Timeout(raw);
        }
        match err.status() {
            Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => Self::RateLimited(raw),
            _ => Self::Server(raw),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UpstreamIntegrity(_)
            | Self::Timeout(_)
            | Self::RateLimited(_)
            | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingUrl => MISSING_URL_MESSAGE,
            Self::InvalidUrl { .. } => INVALID_URL_MESSAGE,
            Self::UpstreamIntegrity(_) => INTEGRITY_MESSAGE,
            Self::NotFound => NOT_FOUND_MESSAGE,
            Self::Timeout(_) => TIMEOUT_MESSAGE,
            Self::RateLimited(_) => RATE_LIMIT_MESSAGE,
            Self::Server(_) => SERVER_MESSAGE,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingUrl | Self::InvalidUrl { .. })
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.user_message().to_string(),
        });
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ResolveError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ResolveError::InvalidUrl {
                url: "x".into(),
                reason: "relative URL without a base".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ResolveError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ResolveError::RateLimited("429".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ResolveError::UpstreamIntegrity("<html>".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_message_hides_raw_error() {
        let err = ResolveError::Server("connection refused (os error 111)".into());
        assert_eq!(err.user_message(), SERVER_MESSAGE);
        assert!(err.to_string().contains("os error 111"));

        let err = ResolveError::Timeout("operation timed out".into());
        assert_eq!(err.user_message(), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_validation_errors() {
        assert!(ResolveError::MissingUrl.is_validation());
        assert!(!ResolveError::NotFound.is_validation());
    }
}

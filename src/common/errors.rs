use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by stream resolution and delivery.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("rate limited while contacting '{0}'")]
    RateLimited(String),

    #[error("no extraction strategy produced a stream for '{0}'")]
    ExtractionFailed(String),

    #[error("no audio format available for '{0}'")]
    NotFound(String),

    #[error("upstream denied access after {attempts} identities (last status {status})")]
    UpstreamAccessDenied { status: u16, attempts: usize },

    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The client went away mid-relay. Expected and benign.
    #[error("downstream disconnected")]
    DownstreamDisconnected,
}

impl StreamError {
    /// Short machine-readable code used as the `error` field of JSON bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited(_) => "rate_limited",
            Self::ExtractionFailed(_) => "extraction_failed",
            Self::NotFound(_) => "not_found",
            Self::UpstreamAccessDenied { .. } => "upstream_access_denied",
            Self::UpstreamStatus(_) | Self::Upstream(_) => "upstream_error",
            Self::DownstreamDisconnected => "downstream_disconnected",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::ExtractionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamAccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::UpstreamStatus(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            // Never written to a live client; 499 mirrors "client closed request".
            Self::DownstreamDisconnected => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
            }
        }
    }
}

/// JSON error body returned by every route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    pub path: String,
}

impl ErrorResponse {
    pub fn new(
        status: StatusCode,
        error: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: crate::server::now_ms(),
            status: status.as_u16(),
            error: error.into(),
            message: message.into(),
            content_id: None,
            path: path.into(),
        }
    }

    pub fn from_error(err: &StreamError, path: impl Into<String>) -> Self {
        Self::new(err.status_code(), err.code(), err.to_string(), path)
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

pub mod info;
pub mod stream;
pub mod stream_proxy;

use axum::http::StatusCode;
use serde::Deserialize;

use crate::common::{ContentId, QualityTier, StreamError};

/// Query string shared by `/stream` and `/stream-proxy`.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub id: Option<String>,
    /// Name used by mobile clients for `id`.
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub quality: Option<String>,
}

impl StreamQuery {
    pub fn content_id(&self) -> Result<ContentId, StreamError> {
        let raw = self
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or(self.video_id.as_deref())
            .unwrap_or_default();
        ContentId::parse(raw)
    }

    pub fn quality(&self, default: QualityTier) -> QualityTier {
        QualityTier::from_query(self.quality.as_deref(), default)
    }
}

/// OPTIONS on any stream route. CORS headers come from the middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

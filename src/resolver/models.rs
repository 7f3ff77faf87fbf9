use serde::Serialize;

use crate::common::ContentId;

/// One playable variant reported by the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFormat {
    pub mime_type: String,
    /// Kilobits per second.
    pub bitrate: u32,
    /// Upstream format tag ("itag").
    pub format_tag: String,
    /// Time-limited direct media URL.
    pub url: String,
}

impl CandidateFormat {
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

/// The resolved answer for a `(content id, quality)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub url: String,
    pub mime_type: String,
    pub bitrate: u32,
    pub format_tag: String,
    pub content_id: ContentId,
    /// Name of the strategy that produced the URL.
    pub source: String,
}

impl StreamDescriptor {
    pub fn from_candidate(
        candidate: &CandidateFormat,
        content_id: &ContentId,
        source: &str,
    ) -> Self {
        Self {
            url: candidate.url.clone(),
            mime_type: candidate.mime_type.clone(),
            bitrate: candidate.bitrate,
            format_tag: candidate.format_tag.clone(),
            content_id: content_id.clone(),
            source: source.to_string(),
        }
    }
}

/// Body of a successful `GET /stream`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub url: String,
    pub mime: String,
    pub bitrate: u32,
    pub format_tag: String,
    pub source: String,
    pub content_id: String,
}

impl From<&StreamDescriptor> for StreamResponse {
    fn from(d: &StreamDescriptor) -> Self {
        Self {
            url: d.url.clone(),
            mime: d.mime_type.clone(),
            bitrate: d.bitrate,
            format_tag: d.format_tag.clone(),
            source: d.source.clone(),
            content_id: d.content_id.to_string(),
        }
    }
}

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::{
    clients::common::{YOUTUBE_API, extract_candidates},
    ua::yt_ua,
};
use crate::{
    common::{AnyResult, ContentId},
    resolver::models::CandidateFormat,
    sources::ExtractionStrategy,
};

/// Markers that precede the embedded player response, most specific first.
static PLAYER_RESPONSE_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"var ytInitialPlayerResponse\s*=\s*",
        r"ytInitialPlayerResponse\s*=\s*",
        r#""playerResponse"\s*:\s*"#,
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// `modern_html_extraction`: scrapes the watch page as a mobile browser.
pub struct WatchPageStrategy {
    http: reqwest::Client,
    base: String,
}

impl WatchPageStrategy {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base(http, YOUTUBE_API)
    }

    pub fn with_base(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }
}

/// Finds the first marker followed by a parseable JSON object.
///
/// The object is read with a streaming deserializer, so `;` or `}` inside
/// string values do not cut it short.
pub fn find_player_response(html: &str) -> Option<Value> {
    for marker in PLAYER_RESPONSE_MARKERS.iter() {
        for found in marker.find_iter(html) {
            let rest = &html[found.end()..];
            if !rest.starts_with('{') {
                continue;
            }
            let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
            if let Some(Ok(value)) = stream.next() {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Candidates of a watch page; only `googlevideo.com` URLs are trusted.
pub fn extract_from_page(html: &str) -> Vec<CandidateFormat> {
    let Some(player) = find_player_response(html) else {
        tracing::debug!("No player response found in watch page");
        return Vec::new();
    };

    extract_candidates(&player)
        .into_iter()
        .filter(|c| c.url.contains("googlevideo.com"))
        .collect()
}

#[async_trait]
impl ExtractionStrategy for WatchPageStrategy {
    fn name(&self) -> &str {
        "modern_html_extraction"
    }

    async fn try_extract(&self, content_id: &ContentId) -> AnyResult<Vec<CandidateFormat>> {
        let url = format!(
            "{}/watch?v={}",
            self.base,
            urlencoding::encode(content_id.as_str())
        );

        let res = self
            .http
            .get(&url)
            .header("User-Agent", yt_ua::MWEB)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(format!("watch page returned {}", status).into());
        }

        let html = res.text().await?;
        Ok(extract_from_page(&html))
    }
}

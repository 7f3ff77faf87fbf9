use serde_json::{Value, json};

use super::ClientProfile;
use crate::{common::AnyResult, resolver::models::CandidateFormat};

pub const MUSIC_API: &str = "https://music.youtube.com";
pub const YOUTUBE_API: &str = "https://www.youtube.com";

/// Player params the web clients send for plain playback.
pub const PLAYER_PARAMS: &str = "CgIQBg==";

/// Bitrate assumed for a format that reports none, in kbps.
const FALLBACK_BITRATE_KBPS: u32 = 128;

pub fn player_body(profile: &ClientProfile, video_id: &str) -> Value {
    json!({
        "context": profile.context(),
        "videoId": video_id,
        "params": PLAYER_PARAMS,
        "contentCheckOk": true,
        "racyCheckOk": true
    })
}

/// POST `{base}/youtubei/v1/player` as `profile`.
pub async fn player_request(
    http: &reqwest::Client,
    base: &str,
    profile: &ClientProfile,
    video_id: &str,
) -> AnyResult<Value> {
    let url = format!("{}/youtubei/v1/player?prettyPrint=false", base);

    let res = http
        .post(&url)
        .header("User-Agent", profile.user_agent)
        .header("Accept", "application/json")
        .header("Origin", base)
        .header("Referer", format!("{}/", base))
        .header("X-YouTube-Client-Name", profile.id)
        .header("X-YouTube-Client-Version", profile.version)
        .json(&player_body(profile, video_id))
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        return Err(format!("{} player request returned {}", profile.name, status).into());
    }

    Ok(res.json().await?)
}

/// `playabilityStatus.status`, when the response carries one.
pub fn playability_status(player: &Value) -> Option<&str> {
    player
        .get("playabilityStatus")
        .and_then(|p| p.get("status"))
        .and_then(|s| s.as_str())
}

/// Directly playable formats of a player response.
///
/// A non-`OK` playability status yields nothing. Formats that only carry a
/// `signatureCipher` are skipped.
pub fn extract_candidates(player: &Value) -> Vec<CandidateFormat> {
    if let Some(status) = playability_status(player) {
        if status != "OK" {
            let reason = player
                .get("playabilityStatus")
                .and_then(|p| p.get("reason"))
                .and_then(|r| r.as_str())
                .unwrap_or("unknown");
            tracing::debug!("Player response not playable: {} ({})", status, reason);
            return Vec::new();
        }
    }

    let Some(streaming) = player.get("streamingData") else {
        return Vec::new();
    };

    ["adaptiveFormats", "formats"]
        .iter()
        .filter_map(|key| streaming.get(*key).and_then(|f| f.as_array()))
        .flatten()
        .filter_map(candidate_from)
        .collect()
}

fn candidate_from(format: &Value) -> Option<CandidateFormat> {
    let url = format.get("url").and_then(|u| u.as_str())?;
    if !url.starts_with("http") {
        return None;
    }

    let mime_type = format.get("mimeType").and_then(|m| m.as_str())?;
    let bitrate = format
        .get("bitrate")
        .or_else(|| format.get("averageBitrate"))
        .and_then(|b| b.as_u64())
        .map(bps_to_kbps)
        .unwrap_or(FALLBACK_BITRATE_KBPS);
    let format_tag = format
        .get("itag")
        .and_then(|i| i.as_i64())
        .map(|i| i.to_string())
        .unwrap_or_default();

    Some(CandidateFormat {
        mime_type: mime_type.to_string(),
        bitrate,
        format_tag,
        url: url.to_string(),
    })
}

fn bps_to_kbps(bps: u64) -> u32 {
    u32::try_from((bps + 500) / 1000).unwrap_or(u32::MAX)
}

use super::models::CandidateFormat;

/// Picks the audio-only candidate whose bitrate is closest to `target_kbps`.
///
/// Ties go to the candidate seen first. Returns `None` when no candidate has
/// an `audio/` mime type.
pub fn select_best(candidates: &[CandidateFormat], target_kbps: u32) -> Option<&CandidateFormat> {
    let mut best: Option<(&CandidateFormat, u32)> = None;

    for candidate in candidates.iter().filter(|c| c.is_audio()) {
        let distance = candidate.bitrate.abs_diff(target_kbps);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.map(|(candidate, _)| candidate)
}

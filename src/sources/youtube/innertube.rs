use async_trait::async_trait;

use super::clients::{ClientProfile, common};
use crate::{
    common::{AnyResult, ContentId, IdentityRotation},
    resolver::models::CandidateFormat,
    sources::ExtractionStrategy,
};

/// Asks an InnerTube player endpoint for formats, trying each client profile
/// in turn until one answers with playable formats.
pub struct InnerTubeStrategy {
    name: &'static str,
    http: reqwest::Client,
    base: String,
    clients: IdentityRotation<ClientProfile>,
}

impl InnerTubeStrategy {
    pub fn new(
        name: &'static str,
        http: reqwest::Client,
        base: impl Into<String>,
        clients: Vec<ClientProfile>,
    ) -> Self {
        Self {
            name,
            http,
            base: base.into(),
            clients: IdentityRotation::new(clients),
        }
    }

    /// `youtube_music_api`: the music endpoint as `WEB_REMIX`.
    pub fn music(http: reqwest::Client) -> Self {
        Self::new(
            "youtube_music_api",
            http,
            common::MUSIC_API,
            vec![super::clients::WEB_REMIX],
        )
    }

    /// `youtube_standard_api`: the main endpoint, cycling `clients`.
    pub fn standard(http: reqwest::Client, clients: Vec<ClientProfile>) -> Self {
        Self::new("youtube_standard_api", http, common::YOUTUBE_API, clients)
    }

    pub fn client_names(&self) -> Vec<&str> {
        self.clients.profiles().iter().map(|c| c.name).collect()
    }
}

#[async_trait]
impl ExtractionStrategy for InnerTubeStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn try_extract(&self, content_id: &ContentId) -> AnyResult<Vec<CandidateFormat>> {
        let mut last_error = None;

        for client in self.clients.sequence(None) {
            match common::player_request(&self.http, &self.base, client, content_id).await {
                Ok(player) => {
                    let candidates = common::extract_candidates(&player);
                    if candidates.iter().any(CandidateFormat::is_audio) {
                        return Ok(candidates);
                    }
                    tracing::debug!(
                        "{}: client {} returned no playable audio for {}",
                        self.name,
                        client.name,
                        content_id
                    );
                }
                Err(e) => {
                    tracing::debug!("{}: client {} failed: {}", self.name, client.name, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if self.clients.len() == 1 => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}

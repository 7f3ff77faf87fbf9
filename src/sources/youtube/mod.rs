pub mod clients;
pub mod html;
pub mod innertube;
pub mod ua;

use std::sync::Arc;

use clients::{ANDROID, ClientProfile, WEB};
use html::WatchPageStrategy;
use innertube::InnerTubeStrategy;

use crate::{
    common::{AnyResult, HttpClient},
    configs::{ResolverConfig, UpstreamConfig},
    sources::BoxedStrategy,
};

pub const DEFAULT_STRATEGIES: &[&str] = &[
    "youtube_music_api",
    "youtube_standard_api",
    "modern_html_extraction",
];

/// Builds the configured extraction chain members, in configured order.
///
/// Unknown names are ignored with a warning; if nothing valid remains the
/// default order is used.
pub fn build_strategies(
    resolver: &ResolverConfig,
    upstream: &UpstreamConfig,
) -> AnyResult<Vec<BoxedStrategy>> {
    let http = HttpClient::new(upstream.timeout())?;
    let standard_clients = standard_clients(&resolver.standard_api_clients);

    let create_strategy = |name: &str| -> Option<BoxedStrategy> {
        match name.trim().to_lowercase().as_str() {
            "youtube_music_api" => Some(Arc::new(InnerTubeStrategy::music(http.clone()))),
            "youtube_standard_api" => Some(Arc::new(InnerTubeStrategy::standard(
                http.clone(),
                standard_clients.clone(),
            ))),
            "modern_html_extraction" => Some(Arc::new(WatchPageStrategy::new(http.clone()))),
            _ => {
                tracing::warn!("Unknown extraction strategy: {}", name);
                None
            }
        }
    };

    let mut strategies: Vec<BoxedStrategy> = resolver
        .strategies
        .iter()
        .filter_map(|name| create_strategy(name))
        .collect();

    if strategies.is_empty() {
        tracing::warn!("No valid extraction strategies configured! Falling back to defaults.");
        strategies = DEFAULT_STRATEGIES
            .iter()
            .filter_map(|name| create_strategy(name))
            .collect();
    }

    Ok(strategies)
}

fn standard_clients(names: &[String]) -> Vec<ClientProfile> {
    let mut clients = Vec::new();
    for name in names {
        match ClientProfile::by_name(name) {
            Some(client) if !clients.contains(&client) => clients.push(client),
            Some(_) => {}
            None => tracing::warn!("Unknown InnerTube client: {}", name),
        }
    }
    if clients.is_empty() {
        tracing::warn!("No valid InnerTube clients configured! Fallback to ANDROID, WEB.");
        clients = vec![ANDROID, WEB];
    }
    clients
}

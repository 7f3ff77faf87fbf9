use std::sync::Arc;

use crate::{
    common::AnyResult,
    configs::Config,
    proxy::StreamProxy,
    resolver::{RateGovernor, ResultCache, StrategyChain, StreamResolver},
    sources::youtube::build_strategies,
};

/// Top-level application state.
pub struct AppState {
    pub config: Config,
    pub resolver: Arc<StreamResolver>,
    pub proxy: Arc<StreamProxy>,
}

impl AppState {
    /// Wires governor, strategies, cache, resolver and relay from `config`.
    pub fn new(config: Config) -> AnyResult<Self> {
        let governor = Arc::new(
            RateGovernor::new(config.rate_limit.max_requests, config.rate_limit.window())
                .with_poll_interval(config.rate_limit.poll_interval()),
        );
        let strategies = build_strategies(&config.resolver, &config.upstream)?;
        let chain = StrategyChain::new(
            strategies,
            governor,
            config.resolver.admission_wait(),
            config.upstream.timeout(),
        );
        let cache = Arc::new(ResultCache::new(config.resolver.cache_ttl()));
        let resolver = Arc::new(StreamResolver::new(chain, cache));
        let proxy = Arc::new(StreamProxy::from_config(&config.proxy, &config.upstream)?);

        Ok(Self::with_parts(config, resolver, proxy))
    }

    pub fn with_parts(config: Config, resolver: Arc<StreamResolver>, proxy: Arc<StreamProxy>) -> Self {
        Self {
            config,
            resolver,
            proxy,
        }
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

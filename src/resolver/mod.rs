pub mod cache;
pub mod chain;
pub mod governor;
pub mod models;
pub mod selector;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

pub use cache::{CacheKey, ResultCache};
pub use chain::{Extraction, StrategyChain};
pub use governor::RateGovernor;
pub use models::{CandidateFormat, StreamDescriptor, StreamResponse};
pub use selector::select_best;

use crate::common::{ContentId, QualityTier, StreamError};

/// Turns `(content id, quality)` into a playable [`StreamDescriptor`].
///
/// Order of work: cache, then the strategy chain (each strategy admitted by
/// the rate governor), then format selection and a cache write. Concurrent
/// cold lookups of the same key share one chain run.
pub struct StreamResolver {
    chain: StrategyChain,
    cache: Arc<ResultCache>,
    in_flight: DashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>,
}

impl StreamResolver {
    pub fn new(chain: StrategyChain, cache: Arc<ResultCache>) -> Self {
        Self {
            chain,
            cache,
            in_flight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.chain.names()
    }

    pub async fn resolve(
        &self,
        content_id: &ContentId,
        quality: QualityTier,
    ) -> Result<StreamDescriptor, StreamError> {
        if let Some(hit) = self.cache.get(content_id, quality) {
            debug!("Cache hit for {} ({})", content_id, quality);
            return Ok(hit);
        }

        let key: CacheKey = (content_id.clone(), quality);
        let gate = self.in_flight.entry(key.clone()).or_default().value().clone();

        let result = {
            let _guard = gate.lock().await;
            // Another caller may have filled the cache while we waited.
            match self.cache.get(content_id, quality) {
                Some(hit) => Ok(hit),
                None => self.resolve_uncached(content_id, quality).await,
            }
        };

        drop(gate);
        self.in_flight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) == 1);

        result
    }

    /// Drops any cached answer and resolves again, e.g. after the cached URL
    /// was refused by the upstream.
    pub async fn refresh(
        &self,
        content_id: &ContentId,
        quality: QualityTier,
    ) -> Result<StreamDescriptor, StreamError> {
        self.cache.invalidate(content_id, quality);
        self.resolve(content_id, quality).await
    }

    async fn resolve_uncached(
        &self,
        content_id: &ContentId,
        quality: QualityTier,
    ) -> Result<StreamDescriptor, StreamError> {
        let extraction = self.chain.extract(content_id).await?;

        let best = select_best(&extraction.candidates, quality.target_kbps())
            .ok_or_else(|| StreamError::NotFound(content_id.to_string()))?;
        let descriptor = StreamDescriptor::from_candidate(best, content_id, &extraction.source);

        info!(
            "Resolved {} ({}) via '{}': itag={} {} kbps {}",
            content_id,
            quality,
            descriptor.source,
            descriptor.format_tag,
            descriptor.bitrate,
            descriptor.mime_type
        );

        self.cache.put(content_id, quality, descriptor.clone());
        Ok(descriptor)
    }
}

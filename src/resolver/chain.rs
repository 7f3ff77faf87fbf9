use std::{sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use super::{governor::RateGovernor, models::CandidateFormat};
use crate::{
    common::{ContentId, StreamError},
    sources::BoxedStrategy,
};

/// Candidates from the first strategy that produced an audio format.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub source: String,
    pub candidates: Vec<CandidateFormat>,
}

/// Ordered, most-reliable-first list of extraction strategies.
pub struct StrategyChain {
    strategies: Vec<BoxedStrategy>,
    governor: Arc<RateGovernor>,
    admission_wait: Duration,
    attempt_timeout: Duration,
}

impl StrategyChain {
    pub fn new(
        strategies: Vec<BoxedStrategy>,
        governor: Arc<RateGovernor>,
        admission_wait: Duration,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            strategies,
            governor,
            admission_wait,
            attempt_timeout,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Runs strategies in order and stops at the first result holding at
    /// least one audio-only format.
    ///
    /// Strategy failures are logged and count as empty, as do video-only
    /// results. When every strategy
    /// was skipped for lack of rate-limit admission the result is
    /// `RateLimited`, otherwise exhaustion is `ExtractionFailed`.
    pub async fn extract(&self, content_id: &ContentId) -> Result<Extraction, StreamError> {
        let mut throttled = 0usize;

        for strategy in &self.strategies {
            let name = strategy.name();

            if !self
                .governor
                .wait_until_admitted_for(name, self.admission_wait)
                .await
            {
                warn!("Strategy '{}' not admitted for {}, skipping", name, content_id);
                throttled += 1;
                continue;
            }

            debug!("Trying strategy '{}' for {}", name, content_id);
            let attempt =
                tokio::time::timeout(self.attempt_timeout, strategy.try_extract(content_id)).await;

            match attempt {
                Ok(Ok(candidates)) if candidates.iter().any(CandidateFormat::is_audio) => {
                    info!(
                        "Strategy '{}' found {} format(s) for {}",
                        name,
                        candidates.len(),
                        content_id
                    );
                    return Ok(Extraction {
                        source: name.to_string(),
                        candidates,
                    });
                }
                Ok(Ok(candidates)) => debug!(
                    "Strategy '{}' returned {} format(s) but no audio for {}",
                    name,
                    candidates.len(),
                    content_id
                ),
                Ok(Err(e)) => debug!("Strategy '{}' failed for {}: {}", name, content_id, e),
                Err(_) => warn!(
                    "Strategy '{}' timed out after {:?} for {}",
                    name, self.attempt_timeout, content_id
                ),
            }
        }

        if throttled > 0 && throttled == self.strategies.len() {
            return Err(StreamError::RateLimited(self.names().join(",")));
        }
        Err(StreamError::ExtractionFailed(content_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::testing::{StubStrategy, audio};

    fn chain_of(strategies: Vec<BoxedStrategy>) -> StrategyChain {
        StrategyChain::new(
            strategies,
            Arc::new(RateGovernor::new(100, Duration::from_secs(60))),
            Duration::from_millis(50),
            Duration::from_secs(5),
        )
    }

    fn id() -> ContentId {
        ContentId::parse("abc123").unwrap()
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = StubStrategy::returning("strategy1", vec![audio("audio/mp4", 128, "U1")]);
        let second = StubStrategy::returning("strategy2", vec![audio("audio/mp4", 140, "U2")]);
        let chain = chain_of(vec![first.boxed(), second.boxed()]);

        let extraction = chain.extract(&id()).await.unwrap();
        assert_eq!(extraction.source, "strategy1");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_errors_and_empty_results_fall_through() {
        let failing = StubStrategy::failing("strategy1");
        let empty = StubStrategy::returning("strategy2", vec![]);
        let third = StubStrategy::returning("strategy3", vec![audio("audio/webm", 160, "U3")]);
        let chain = chain_of(vec![failing.boxed(), empty.boxed(), third.boxed()]);

        let extraction = chain.extract(&id()).await.unwrap();
        assert_eq!(extraction.source, "strategy3");
        assert_eq!(extraction.candidates[0].url, "U3");
        assert_eq!((failing.calls(), empty.calls(), third.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_video_only_result_falls_through() {
        let video = StubStrategy::returning("strategy1", vec![audio("video/mp4", 503, "V1")]);
        let second = StubStrategy::returning("strategy2", vec![audio("audio/mp4", 128, "U2")]);
        let chain = chain_of(vec![video.boxed(), second.boxed()]);

        let extraction = chain.extract(&id()).await.unwrap();
        assert_eq!(extraction.source, "strategy2");
        assert_eq!((video.calls(), second.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_exhaustion_is_extraction_failed() {
        let a = StubStrategy::returning("strategy1", vec![]);
        let b = StubStrategy::failing("strategy2");
        let chain = chain_of(vec![a.boxed(), b.boxed()]);

        assert!(matches!(
            chain.extract(&id()).await,
            Err(StreamError::ExtractionFailed(cid)) if cid == "abc123"
        ));
    }

    #[tokio::test]
    async fn test_slow_strategy_times_out() {
        let slow = StubStrategy::delayed(
            "strategy1",
            Duration::from_secs(10),
            vec![audio("audio/mp4", 128, "slow")],
        );
        let fast = StubStrategy::returning("strategy2", vec![audio("audio/mp4", 128, "fast")]);
        let chain = StrategyChain::new(
            vec![slow.boxed(), fast.boxed()],
            Arc::new(RateGovernor::new(100, Duration::from_secs(60))),
            Duration::from_millis(50),
            Duration::from_millis(50),
        );

        let extraction = chain.extract(&id()).await.unwrap();
        assert_eq!(extraction.source, "strategy2");
    }

    #[tokio::test]
    async fn test_throttled_strategy_is_skipped() {
        let governor = Arc::new(RateGovernor::new(1, Duration::from_secs(60)));
        assert!(governor.admit("strategy1"));

        let first = StubStrategy::returning("strategy1", vec![audio("audio/mp4", 128, "U1")]);
        let second = StubStrategy::returning("strategy2", vec![audio("audio/mp4", 128, "U2")]);
        let chain = StrategyChain::new(
            vec![first.boxed(), second.boxed()],
            governor,
            Duration::from_millis(20),
            Duration::from_secs(5),
        );

        let extraction = chain.extract(&id()).await.unwrap();
        assert_eq!(extraction.source, "strategy2");
        assert_eq!(first.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_throttled_is_rate_limited() {
        let governor = Arc::new(RateGovernor::new(1, Duration::from_secs(60)));
        assert!(governor.admit("strategy1"));

        let only = StubStrategy::returning("strategy1", vec![audio("audio/mp4", 128, "U1")]);
        let chain = StrategyChain::new(
            vec![only.boxed()],
            governor,
            Duration::from_millis(20),
            Duration::from_secs(5),
        );

        assert!(matches!(
            chain.extract(&id()).await,
            Err(StreamError::RateLimited(_))
        ));
        assert_eq!(only.calls(), 0);
    }
}

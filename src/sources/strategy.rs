use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    common::{AnyResult, ContentId},
    resolver::models::CandidateFormat,
};

/// One way of asking the upstream for the formats of a piece of media.
///
/// Implementations are stateless per call. Any error they return is treated
/// by the chain as "no candidates" and never reaches the caller.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Stable name; also the rate-limit key and the descriptor `source`.
    fn name(&self) -> &str;

    async fn try_extract(&self, content_id: &ContentId) -> AnyResult<Vec<CandidateFormat>>;
}

pub type BoxedStrategy = Arc<dyn ExtractionStrategy>;

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use super::models::StreamDescriptor;
use crate::common::{Clock, ContentId, QualityTier, SystemClock};

pub type CacheKey = (ContentId, QualityTier);

struct CacheEntry {
    descriptor: StreamDescriptor,
    inserted_at: Instant,
}

/// In-memory TTL memo of resolved descriptors.
///
/// Expired entries read as misses and are swept on the next `put`; there is
/// no background eviction.
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn get(&self, content_id: &ContentId, quality: QualityTier) -> Option<StreamDescriptor> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        entries
            .get(&(content_id.clone(), quality))
            .filter(|entry| now.saturating_duration_since(entry.inserted_at) < self.ttl)
            .map(|entry| entry.descriptor.clone())
    }

    /// Stores `descriptor`, replacing any previous entry for the same key.
    pub fn put(&self, content_id: &ContentId, quality: QualityTier, descriptor: StreamDescriptor) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < self.ttl);
        entries.insert(
            (content_id.clone(), quality),
            CacheEntry {
                descriptor,
                inserted_at: now,
            },
        );
    }

    pub fn invalidate(&self, content_id: &ContentId, quality: QualityTier) -> bool {
        self.entries
            .lock()
            .remove(&(content_id.clone(), quality))
            .is_some()
    }

    /// Number of stored entries, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

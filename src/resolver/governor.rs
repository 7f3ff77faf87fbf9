use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::common::{Clock, SystemClock};

/// Sliding-window admission control keyed by upstream surface.
///
/// Each key keeps the timestamps of its recent grants. A check first drops
/// grants older than the window, then admits while fewer than `max_requests`
/// remain. The lock only ever guards the list mutation.
pub struct RateGovernor {
    max_requests: usize,
    window: Duration,
    poll_interval: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    clock: Arc<dyn Clock>,
}

impl RateGovernor {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            poll_interval: Duration::from_millis(100),
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    /// Non-blocking check. Records a grant and returns `true` when admitted.
    pub fn admit(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        let grants = windows.entry(key.to_string()).or_default();

        while let Some(oldest) = grants.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                grants.pop_front();
            } else {
                break;
            }
        }

        if grants.len() < self.max_requests {
            grants.push_back(now);
            true
        } else {
            false
        }
    }

    /// Waits cooperatively, rechecking every poll interval, until admitted.
    pub async fn wait_until_admitted(&self, key: &str) {
        while !self.admit(key) {
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Like `wait_until_admitted` but gives up after `max_wait`.
    pub async fn wait_until_admitted_for(&self, key: &str, max_wait: Duration) -> bool {
        tokio::time::timeout(max_wait, self.wait_until_admitted(key))
            .await
            .is_ok()
    }

    /// Grants currently counted against `key`, without pruning.
    pub fn in_window(&self, key: &str) -> usize {
        self.windows.lock().get(key).map_or(0, VecDeque::len)
    }
}

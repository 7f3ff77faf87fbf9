use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::QualityTier;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolverConfig {
    /// Tier used when a request carries no `quality`.
    #[serde(default)]
    pub default_quality: QualityTier,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Extraction strategies in priority order.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
    /// InnerTube clients cycled by `youtube_standard_api`.
    #[serde(default = "default_standard_api_clients")]
    pub standard_api_clients: Vec<String>,
    /// Longest a strategy waits for rate-limit admission before being skipped.
    #[serde(default = "default_admission_wait_ms")]
    pub admission_wait_ms: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_strategies() -> Vec<String> {
    vec![
        "youtube_music_api".to_string(),
        "youtube_standard_api".to_string(),
        "modern_html_extraction".to_string(),
    ]
}

fn default_standard_api_clients() -> Vec<String> {
    vec!["ANDROID".to_string(), "WEB".to_string()]
}

fn default_admission_wait_ms() -> u64 {
    2000
}

impl ResolverConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn admission_wait(&self) -> Duration {
        Duration::from_millis(self.admission_wait_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_quality: QualityTier::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            strategies: default_strategies(),
            standard_api_clients: default_standard_api_clients(),
            admission_wait_ms: default_admission_wait_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_max_requests() -> usize {
    30
}

fn default_window_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

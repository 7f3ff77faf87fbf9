use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    /// Bound on every upstream call (strategy requests, relay connect/read).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    20
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProxyConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Client identities tried in order when the upstream refuses a relay.
    #[serde(default = "default_identities")]
    pub identities: Vec<String>,
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_identities() -> Vec<String> {
    ["IOS", "ANDROID", "MWEB", "WEB"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            identities: default_identities(),
        }
    }
}

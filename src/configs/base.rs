use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Config {
    /// Reads `config.toml`, then `config.default.toml`, else built-in
    /// defaults. `PORT` in the environment overrides `server.port`.
    pub fn load() -> AnyResult<Self> {
        let candidates = ["config.toml", "config.default.toml"];
        let mut config = match candidates
            .iter()
            .find(|p| std::path::Path::new(p).exists())
        {
            Some(path) => {
                crate::log_println!("Loading configuration from: {}", path);
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            None => {
                crate::log_println!("No configuration file found, using defaults");
                Self::default()
            }
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| format!("invalid PORT '{}': {}", port, e))?;
        }

        Ok(config)
    }

    pub fn from_toml(raw: &str) -> AnyResult<Self> {
        Ok(toml::from_str(raw)?)
    }
}

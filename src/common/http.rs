use std::time::Duration;

use reqwest::{Client, Error};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
    /// Client for upstream calls. Every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Client, Error> {
        Self::with_user_agent(DEFAULT_USER_AGENT, timeout)
    }

    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Client, Error> {
        Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
    }

    /// Client for long-lived body relays: no total deadline, but connecting
    /// and each individual read are bounded by `timeout`.
    pub fn streaming(timeout: Duration) -> Result<Client, Error> {
        Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .read_timeout(timeout)
            .build()
    }
}

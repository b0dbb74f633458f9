use reqwest::Client;
use std::time::Duration;

use crate::config::HttpConfig;

const USER_AGENT: &str = concat!("tchai/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by one session's collaborators.
/// Wikimedia rejects requests that carry no User-Agent.
pub fn build_client(config: &HttpConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
}

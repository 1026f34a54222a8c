use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

/// Create the HTTP client shared by all blob uploads of a run
pub fn create_http_client(request_timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

//! OpenAI-compatible client construction.
//!
//! Both the embedding server and the chat model speak the OpenAI wire format,
//! so one client type serves both, pointed at different base URLs.

use crate::error::{DocBrainError, Result};
use async_openai::{config::OpenAIConfig, Client};
use backoff::ExponentialBackoff;
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for an OpenAI-compatible endpoint.
///
/// Failed requests are not retried; errors surface to the caller at once.
pub fn create_client(
    api_base: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DocBrainError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(client_config(api_base, api_key))
        .with_http_client(http_client)
        .with_backoff(no_retry_backoff()))
}

/// Create a client with the default timeout.
pub fn create_default_client(api_base: &str, api_key: Option<&str>) -> Result<Client<OpenAIConfig>> {
    create_client(api_base, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

// OpenAIConfig::new() picks up OPENAI_API_KEY on its own; without a configured
// key nothing may be sent to the endpoint.
fn client_config(api_base: &str, api_key: Option<&str>) -> OpenAIConfig {
    OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(api_key.unwrap_or_default())
}

fn no_retry_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

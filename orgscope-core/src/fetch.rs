//! Raw file content retrieval.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;
use crate::USER_AGENT;

/// Retrieves the plain-text content behind a raw-content URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Unauthenticated GET against the raw-content host.
pub struct RawContentClient {
    client: Client,
}

impl RawContentClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for RawContentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for RawContentClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("Fetching raw content {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

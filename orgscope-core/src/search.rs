//! Code search client.
//!
//! One call issues exactly one query against the code search API for a
//! single organization and keyword, then classifies the response.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::{RawUrlRule, SearchConfig};
use crate::error::SearchError;
use crate::types::SearchHit;
use crate::USER_AGENT;

/// Message used when no search token is configured.
pub const MISSING_TOKEN_MESSAGE: &str = "GitHub token not set. Please go to settings.";

const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded or authentication issue. Try again later.";

/// Searches an organization's code for a keyword.
#[async_trait]
pub trait CodeSearch: Send + Sync {
    async fn search(
        &self,
        organization: &str,
        keyword: &str,
        token: &str,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    html_url: String,
    repository: SearchRepository,
}

#[derive(Debug, Deserialize)]
struct SearchRepository {
    full_name: String,
}

/// GitHub code search (`GET /search/code`).
pub struct GitHubSearchClient {
    client: Client,
    config: SearchConfig,
    raw_url: RawUrlRule,
}

impl GitHubSearchClient {
    pub fn new(config: SearchConfig, raw_url: RawUrlRule) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            config,
            raw_url,
        }
    }

    /// Build the free-text query with its scope, language and organization filters.
    pub fn build_query(&self, organization: &str, keyword: &str) -> String {
        format!(
            "{} in:file language:{} org:{}",
            keyword, self.config.language, organization
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/search/code", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CodeSearch for GitHubSearchClient {
    async fn search(
        &self,
        organization: &str,
        keyword: &str,
        token: &str,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if token.trim().is_empty() {
            return Err(SearchError::Auth(MISSING_TOKEN_MESSAGE.to_string()));
        }

        let query = self.build_query(organization, keyword);
        let endpoint = self.endpoint();
        tracing::debug!("Searching {} q={}", endpoint, query);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("q", query.as_str())])
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(AUTHORIZATION, format!("Bearer {}", token.trim()))
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!("Search response status: {}", status);

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &body));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Transport(format!("Invalid search response: {}", e)))?;

        let hits: Vec<SearchHit> = data
            .items
            .into_iter()
            .take(self.config.max_results_per_org)
            .map(|item| SearchHit {
                raw_content_url: self.raw_url.derive(&item.html_url),
                file_url: item.html_url,
                repo_full_name: item.repository.full_name,
            })
            .collect();

        tracing::debug!("{} hits kept for org:{}", hits.len(), organization);
        Ok(hits)
    }
}

/// Map a non-success search response onto the error taxonomy.
///
/// 401 is always an auth failure and 429 always a rate limit. A 403 is a
/// rate limit when the quota header reads zero or the body mentions a rate
/// limit, and an auth failure otherwise.
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> SearchError {
    match status {
        StatusCode::UNAUTHORIZED => {
            tracing::error!("Search API rejected the token: {}", body);
            SearchError::Auth(format!("GitHub API returned {}: token rejected", status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimit(RATE_LIMIT_MESSAGE.to_string()),
        StatusCode::FORBIDDEN => {
            tracing::error!("Search API error: {}", body);
            let quota_exhausted = headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "0");
            if quota_exhausted || body.to_lowercase().contains("rate limit") {
                SearchError::RateLimit(RATE_LIMIT_MESSAGE.to_string())
            } else {
                SearchError::Auth(format!(
                    "GitHub API returned {}: access forbidden",
                    status.as_u16()
                ))
            }
        }
        _ => SearchError::Transport(format!("GitHub API returned {}", status.as_u16())),
    }
}

//! AI explanation of code snippets.
//!
//! [`Explainer::explain`] always resolves to a displayable string: a missing
//! key or a failed request yields a fallback message instead of an error, so
//! one bad annotation never aborts the rest of a run.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ExplainConfig;
use crate::USER_AGENT;

/// Returned when no generative-text API key is configured.
pub const MISSING_KEY_FALLBACK: &str =
    "API key not set. Run `orgscope settings set` to add your Gemini API key.";

/// Prefix of the message returned when the explanation request fails.
pub const ERROR_FALLBACK_PREFIX: &str = "Could not generate explanation. Error: ";

/// Produces a short explanation of how a keyword is used in a snippet.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, keyword: &str, context: &str, api_key: Option<&str>) -> String;
}

#[derive(Debug, Error)]
enum ExplainError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("AI explanation service error: {0}")]
    Status(u16),

    #[error("AI explanation service returned no text")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Build the explanation prompt for one snippet.
pub fn build_prompt(
    keyword: &str,
    context: &str,
    organizations: &[String],
    language: &str,
) -> String {
    let source = if organizations.is_empty() {
        "open-source".to_string()
    } else {
        organizations.join("/")
    };
    format!(
        "\
{language} keyword/function: {keyword}

Code context from {source} repository:
```{language}
{context}
```

Explain in 3-4 sentences how this {language} keyword/function is being used in this code, focusing on:
1. The purpose of this code
2. How the keyword is used in a smart/clever way
3. Any {source}-specific patterns or techniques demonstrated
"
    )
}

/// Gemini `generateContent` client.
pub struct GeminiExplainer {
    client: Client,
    config: ExplainConfig,
    organizations: Vec<String>,
    language: String,
}

impl GeminiExplainer {
    pub fn new(
        config: ExplainConfig,
        organizations: Vec<String>,
        language: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            config,
            organizations,
            language: language.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, prompt: String, api_key: &str) -> Result<String, ExplainError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let endpoint = self.endpoint();
        tracing::debug!("Calling {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| ExplainError::Request(e.without_url()))?;

        let status = response.status();
        tracing::debug!("Explanation response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Explanation API error: {}", error_text);
            return Err(ExplainError::Status(status.as_u16()));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ExplainError::Request(e.without_url()))?;
        data.into_text().ok_or(ExplainError::EmptyResponse)
    }
}

#[async_trait]
impl Explainer for GeminiExplainer {
    async fn explain(&self, keyword: &str, context: &str, api_key: Option<&str>) -> String {
        let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return MISSING_KEY_FALLBACK.to_string();
        };

        let prompt = build_prompt(keyword, context, &self.organizations, &self.language);
        match self.generate(prompt, api_key).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("AI explanation error: {}", e);
                format!("{}{}", ERROR_FALLBACK_PREFIX, e)
            }
        }
    }
}

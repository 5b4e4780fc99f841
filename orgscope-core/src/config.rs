//! Runtime settings for the search, content and explanation clients.
//!
//! Every struct has a `Default` matching the public GitHub and Gemini
//! endpoints, so callers only override what they need (tests point the
//! base URLs at a local mock server).

use serde::{Deserialize, Serialize};

/// Organizations searched when nothing else is configured.
pub const DEFAULT_ORGANIZATIONS: &[&str] = &["fastai", "AnswerDotAI"];

/// Hits kept per organization.
pub const DEFAULT_MAX_RESULTS_PER_ORG: usize = 3;

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Organizations in submission order; results keep this order.
    pub organizations: Vec<String>,
    pub search: SearchConfig,
    pub raw_url: RawUrlRule,
    pub explain: ExplainConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            organizations: DEFAULT_ORGANIZATIONS.iter().map(|s| s.to_string()).collect(),
            search: SearchConfig::default(),
            raw_url: RawUrlRule::default(),
            explain: ExplainConfig::default(),
        }
    }
}

/// Code search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_base: String,
    /// Language filter applied to every query.
    pub language: String,
    pub max_results_per_org: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            language: "python".to_string(),
            max_results_per_org: DEFAULT_MAX_RESULTS_PER_ORG,
        }
    }
}

/// Substitution turning a web file URL into its raw-content URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUrlRule {
    pub web_base: String,
    pub raw_base: String,
}

impl Default for RawUrlRule {
    fn default() -> Self {
        Self {
            web_base: "https://github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
        }
    }
}

impl RawUrlRule {
    /// Derive the raw-content URL for a web file URL.
    ///
    /// The `web_base` prefix is swapped for `raw_base` and the first
    /// `/blob/` segment is dropped. URLs outside `web_base` keep their host.
    pub fn derive(&self, file_url: &str) -> String {
        let web_base = self.web_base.trim_end_matches('/');
        let rebased = match file_url.strip_prefix(web_base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                format!("{}{}", self.raw_base.trim_end_matches('/'), rest)
            }
            _ => file_url.to_string(),
        };
        rebased.replacen("/blob/", "/", 1)
    }
}

/// Generative-text settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-pro-latest".to_string(),
            temperature: 0.7,
            max_output_tokens: 250,
        }
    }
}

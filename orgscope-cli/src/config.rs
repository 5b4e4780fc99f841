//! Orgscope configuration loading from `.orgscope.toml`.
//!
//! Configuration is optional - orgscope searches `fastai` and `AnswerDotAI`
//! with the public GitHub and Gemini endpoints when no file exists.
//!
//! # Example Configuration
//!
//! ```toml
//! [search]
//! organizations = ["fastai", "AnswerDotAI"]
//! language = "python"
//! max_results_per_org = 3
//!
//! [content]
//! web_base = "https://github.com"
//! raw_base = "https://raw.githubusercontent.com"
//!
//! [explain]
//! model = "gemini-1.5-pro-latest"
//! temperature = 0.7
//! max_output_tokens = 250
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use std::path::{Path, PathBuf};

use orgscope_core::PipelineConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".orgscope.toml";

/// Errors surfaced only in `--strict` mode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure loaded from `.orgscope.toml`.
///
/// All sections are optional and fall back to the built-in defaults.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Code search settings.
    #[serde(default)]
    pub search: SearchSection,

    /// Raw-content URL derivation.
    #[serde(default)]
    pub content: ContentSection,

    /// Generative-text settings.
    #[serde(default)]
    pub explain: ExplainSection,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// `[search]` section.
#[derive(Debug, Deserialize, Default)]
pub struct SearchSection {
    /// Organizations to search, in result order.
    #[serde(default)]
    pub organizations: Option<Vec<String>>,

    /// Language filter for the code search query.
    #[serde(default)]
    pub language: Option<String>,

    /// Hits kept per organization.
    #[serde(default)]
    pub max_results_per_org: Option<usize>,

    /// Code search API base URL.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// `[content]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ContentSection {
    #[serde(default)]
    pub web_base: Option<String>,

    #[serde(default)]
    pub raw_base: Option<String>,
}

/// `[explain]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ExplainSection {
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format: `table`, `json` or `html`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output. Defaults to on when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

impl AppConfig {
    /// Load configuration, returning defaults on any problem.
    ///
    /// Read and parse errors are logged as warnings but don't cause failures.
    pub fn load(path: &Path) -> Self {
        match Self::load_strict(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Load configuration, failing on unreadable or invalid files.
    ///
    /// A missing file is not an error.
    pub fn load_strict(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(orgs) = &self.search.organizations {
            if orgs.iter().any(|o| o.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "search.organizations must not contain empty names".to_string(),
                ));
            }
        }
        if self.search.max_results_per_org == Some(0) {
            return Err(ConfigError::Invalid(
                "search.max_results_per_org must be at least 1".to_string(),
            ));
        }
        if let Some(t) = self.explain.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "explain.temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }
        Ok(())
    }

    /// Build the pipeline settings, filling gaps with the built-in defaults.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(orgs) = &self.search.organizations {
            config.organizations = orgs.iter().map(|o| o.trim().to_string()).collect();
        }
        if let Some(language) = &self.search.language {
            config.search.language = language.clone();
        }
        if let Some(max) = self.search.max_results_per_org {
            config.search.max_results_per_org = max;
        }
        if let Some(api_base) = &self.search.api_base {
            config.search.api_base = api_base.clone();
        }

        if let Some(web_base) = &self.content.web_base {
            config.raw_url.web_base = web_base.clone();
        }
        if let Some(raw_base) = &self.content.raw_base {
            config.raw_url.raw_base = raw_base.clone();
        }

        if let Some(api_base) = &self.explain.api_base {
            config.explain.api_base = api_base.clone();
        }
        if let Some(model) = &self.explain.model {
            config.explain.model = model.clone();
        }
        if let Some(temperature) = self.explain.temperature {
            config.explain.temperature = temperature;
        }
        if let Some(max) = self.explain.max_output_tokens {
            config.explain.max_output_tokens = max;
        }

        config
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Check if colored output should be used.
    ///
    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

/// Default location of the credential store.
pub fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orgscope")
        .join("credentials.toml")
}

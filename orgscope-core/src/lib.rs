//! Orgscope core - keyword search across GitHub organizations with
//! AI-explained snippets.
//!
//! This crate provides:
//! - [`CodeSearch`]: GitHub code search for one organization/keyword pair
//! - [`ContentFetcher`]: raw file retrieval for each hit
//! - [`extract_context`]: the line window around the first keyword match
//! - [`Explainer`]: a short Gemini-generated explanation per snippet
//! - [`ResultPipeline`]: the orchestration that merges and sorts it all
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use orgscope_core::{FileCredentialStore, PipelineConfig, ResultPipeline};
//!
//! # async fn demo() -> orgscope_core::Result<()> {
//! let store = Arc::new(FileCredentialStore::new("credentials.toml"));
//! let pipeline = ResultPipeline::with_http_clients(PipelineConfig::default(), store);
//!
//! for result in pipeline.run("patch_to").await? {
//!     println!("{} {}", result.repo_name, result.file_url);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod explain;
pub mod fetch;
pub mod pipeline;
pub mod search;
pub mod types;

pub use config::{ExplainConfig, PipelineConfig, RawUrlRule, SearchConfig};
pub use context::{extract_context, ContextExtractor};
pub use credentials::{
    load_credentials, mask_secret, save_credentials, CredentialStore, Credentials,
    FileCredentialStore, MemoryCredentialStore, StoredCredentials,
};
pub use error::{CredentialError, FetchError, PipelineError, Result, SearchError};
pub use explain::{Explainer, GeminiExplainer, MISSING_KEY_FALLBACK};
pub use fetch::{ContentFetcher, RawContentClient};
pub use pipeline::{sort_results, ResultPipeline, RunStage};
pub use search::{CodeSearch, GitHubSearchClient};
pub use types::{AnnotatedResult, RunReport, SearchHit, SkipReason, SkippedHit};

/// User-Agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("orgscope/", env!("CARGO_PKG_VERSION"));

//! Error types for orgscope-core.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors returned by the code search client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The search token is missing or was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The search service signalled quota exhaustion.
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Any other non-success response or transport failure.
    #[error("Search request failed: {0}")]
    Transport(String),
}

impl SearchError {
    /// Whether this error comes from a missing or rejected credential.
    pub fn is_auth(&self) -> bool {
        matches!(self, SearchError::Auth(_))
    }
}

/// Errors returned when retrieving raw file content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The content host answered with a non-success status.
    #[error("Content host returned {0}")]
    Status(u16),

    /// The request never produced a readable response.
    #[error("Content request failed: {0}")]
    Transport(String),
}

/// Errors raised by a credential store.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// One or both credentials were empty after trimming.
    #[error("Please enter both API keys.")]
    Incomplete,

    /// The backing file could not be read or written.
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid key/value table.
    #[error("Credential store is corrupt: {0}")]
    Parse(#[from] toml::de::Error),

    /// The key/value table could not be serialized.
    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors that stop a whole pipeline run.
///
/// Per-hit failures never show up here: they are recorded as skipped hits
/// or turned into fallback explanations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Keyword was empty after trimming; nothing was searched.
    #[error("Search keyword cannot be empty")]
    EmptyKeyword,

    /// Credentials could not be read from the store.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// The search for one organization failed.
    #[error("Search in '{organization}' failed: {source}")]
    Search {
        /// Organization whose search failed.
        organization: String,
        /// Underlying search failure.
        #[source]
        source: SearchError,
    },
}

impl PipelineError {
    /// Whether the run aborted because of a missing or rejected search token.
    pub fn is_auth(&self) -> bool {
        match self {
            PipelineError::Search { source, .. } => source.is_auth(),
            _ => false,
        }
    }
}

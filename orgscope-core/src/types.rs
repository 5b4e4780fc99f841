//! Data types shared by the search, fetch and explanation stages.

use serde::{Deserialize, Serialize};

/// Marker used to classify a context window as an import block.
pub const IMPORT_MARKER: &str = "import ";

/// A single file returned by the code search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Web URL of the matching file.
    pub file_url: String,
    /// Repository in `owner/name` form.
    pub repo_full_name: String,
    /// URL serving the plain file content, derived from `file_url`.
    pub raw_content_url: String,
}

/// A search hit with its context window and explanation attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedResult {
    pub repo_name: String,
    pub file_url: String,
    /// Lines surrounding the first keyword match.
    pub context: String,
    pub explanation: String,
}

impl AnnotatedResult {
    /// Whether the context window contains an import statement.
    pub fn is_import(&self) -> bool {
        self.context.contains(IMPORT_MARKER)
    }

    /// Last path segment of the file URL.
    pub fn file_name(&self) -> &str {
        self.file_url
            .rsplit('/')
            .next()
            .unwrap_or(self.file_url.as_str())
    }
}

/// Why a hit was dropped from the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Raw content could not be retrieved.
    FetchFailed(String),
    /// The keyword does not appear on any line of the file.
    NoContext,
}

/// A hit that was dropped without affecting its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedHit {
    pub organization: String,
    pub file_url: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub keyword: String,
    /// Sorted results, ready for display.
    pub results: Vec<AnnotatedResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedHit>,
}

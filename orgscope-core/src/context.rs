//! Context window extraction around the first keyword match.

use regex::{Regex, RegexBuilder};

/// Lines kept on each side of the matching line.
pub const DEFAULT_RADIUS: usize = 2;

/// Extract the default-sized window around the first line mentioning `keyword`.
///
/// Returns `None` when no line matches, which tells the caller to drop the hit.
pub fn extract_context(content: &str, keyword: &str) -> Option<String> {
    ContextExtractor::new(keyword)?.extract(content)
}

/// Case-insensitive, word-bounded matcher for one keyword.
#[derive(Debug, Clone)]
pub struct ContextExtractor {
    pattern: Regex,
    radius: usize,
}

impl ContextExtractor {
    /// Build an extractor for `keyword`. Regex metacharacters are matched literally.
    ///
    /// Returns `None` for a blank keyword.
    pub fn new(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }
        let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword)))
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            pattern,
            radius: DEFAULT_RADIUS,
        })
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Whether a single line contains the keyword as a whole word.
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Window of `radius` lines before through `radius` lines after the first match.
    pub fn extract(&self, content: &str) -> Option<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let index = lines.iter().position(|line| self.matches(line))?;

        let start = index.saturating_sub(self.radius);
        let end = (index + self.radius).min(lines.len() - 1);
        Some(lines[start..=end].join("\n"))
    }
}

//! HTML fragment output.
//!
//! Every interpolated value is escaped, including the explanation text
//! returned by the generative-text service.

use orgscope_core::AnnotatedResult;

/// Message shown when a run produced no results.
pub const NO_RESULTS_MESSAGE: &str = "No examples found.";

/// Escape `& < > " '` for use in element content and attribute values.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HTML formatter for annotated results
pub struct HtmlOutput;

impl HtmlOutput {
    /// Render one `example` block per result, in order.
    pub fn results(results: &[AnnotatedResult]) -> String {
        if results.is_empty() {
            return format!("<div>{}</div>", NO_RESULTS_MESSAGE);
        }
        results
            .iter()
            .map(Self::example)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn example(result: &AnnotatedResult) -> String {
        format!(
            r#"<div class="example">
  <div><strong>Repository:</strong> {repo}</div>
  <div><strong>File:</strong> <a href="{url}" target="_blank">{file}</a></div>
  <div class="code-context">
    <pre>{context}</pre>
  </div>
  <div class="explanation">
    <h4>AI Explanation:</h4>
    <p>{explanation}</p>
  </div>
</div>"#,
            repo = escape_html(&result.repo_name),
            url = escape_html(&result.file_url),
            file = escape_html(result.file_name()),
            context = escape_html(&result.context),
            explanation = escape_html(&result.explanation),
        )
    }
}

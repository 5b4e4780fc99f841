//! JSON output formatting for machine-readable output.
//!
//! Always pretty-printed.

use serde::Serialize;

/// JSON output formatter
pub struct JsonOutput;

impl JsonOutput {
    /// Format data as JSON string
    pub fn format<T: Serialize + ?Sized>(data: &T) -> String {
        serde_json::to_string_pretty(data)
            .unwrap_or_else(|e| format!("{{\n  \"error\": \"{}\"\n}}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgscope_core::AnnotatedResult;

    fn sample() -> AnnotatedResult {
        AnnotatedResult {
            repo_name: "fastai/fastcore".to_string(),
            file_url: "https://github.com/fastai/fastcore/blob/master/basics.py".to_string(),
            context: "def f():\n    pass".to_string(),
            explanation: "Does nothing.".to_string(),
        }
    }

    #[test]
    fn test_format_pretty() {
        let output = JsonOutput::format(&sample());

        assert!(output.contains("\"repo_name\": \"fastai/fastcore\""));
        assert!(output.contains("\"context\": \"def f():\\n    pass\""));
        assert!(output.contains('\n'));
    }
}

//! Settings command - save and inspect the two credentials
//!
//! `set` requires both the GitHub token and the Gemini API key; `show`
//! prints masked values and where they are stored.

use std::path::Path;

use colored::Colorize;
use orgscope_core::{
    load_credentials, mask_secret, save_credentials, Credentials, CredentialError,
    FileCredentialStore,
};
use serde::Serialize;

use crate::output::{escape_html, Output, OutputConfig, Outputter, SuccessMessage};

/// Save both credentials to the store at `path`.
pub fn run_set(
    github_token: &str,
    gemini_key: &str,
    path: &Path,
    output: OutputConfig,
) -> anyhow::Result<()> {
    let credentials = match Credentials::new(github_token, gemini_key) {
        Ok(credentials) => credentials,
        Err(CredentialError::Incomplete) => anyhow::bail!("Please enter both API keys."),
        Err(e) => return Err(e.into()),
    };

    let store = FileCredentialStore::new(path);
    save_credentials(&store, &credentials)?;
    tracing::info!("Credentials saved to {}", path.display());

    Output::new(SuccessMessage::new("Settings saved successfully!"), output).render()
}

/// Stored credentials, masked for display
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub path: String,
    pub github_token: Option<String>,
    pub gemini_key: Option<String>,
}

impl SettingsView {
    fn field(value: &Option<String>) -> String {
        value.clone().unwrap_or_else(|| "not set".to_string())
    }
}

impl Outputter for SettingsView {
    fn to_table(&self, _config: &OutputConfig) -> String {
        let mut output = format!("{} {}\n", "SETTINGS:".cyan().bold(), self.path);
        for (label, value) in [
            ("GitHub token:", &self.github_token),
            ("Gemini API key:", &self.gemini_key),
        ] {
            let shown = match value {
                Some(v) => v.green(),
                None => "not set".yellow(),
            };
            output.push_str(&format!("  {:<16} {}\n", label, shown));
        }
        output
    }

    fn to_html(&self, _config: &OutputConfig) -> String {
        format!(
            "<div class=\"settings\">\n  <div><strong>GitHub token:</strong> {}</div>\n  <div><strong>Gemini API key:</strong> {}</div>\n</div>",
            escape_html(&Self::field(&self.github_token)),
            escape_html(&Self::field(&self.gemini_key)),
        )
    }
}

/// Show the stored credentials, masked.
pub fn run_show(path: &Path, output: OutputConfig) -> anyhow::Result<()> {
    let store = FileCredentialStore::new(path);
    let stored = load_credentials(&store)?;

    let view = SettingsView {
        path: path.display().to_string(),
        github_token: stored.search_token.as_deref().map(mask_secret),
        gemini_key: stored.explanation_api_key.as_deref().map(mask_secret),
    };
    Output::new(view, output).render()
}

//! Search command - keyword search across the configured organizations
//!
//! Runs the result pipeline and renders the annotated snippets. Pipeline
//! failures are rendered in place of the results, in the selected format.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use orgscope_core::{FileCredentialStore, PipelineConfig, PipelineError, ResultPipeline, RunReport};
use serde::Serialize;

use crate::output::{ErrorMessage, HtmlOutput, Output, OutputConfig, Outputter, NO_RESULTS_MESSAGE};

/// Search results collection
#[derive(Debug, Serialize)]
pub struct SearchResults {
    #[serde(flatten)]
    pub report: RunReport,
    pub organizations: Vec<String>,
    pub duration_ms: u64,
}

impl Outputter for SearchResults {
    fn to_table(&self, _config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} \"{}\" in {}\n",
            "SEARCH:".cyan().bold(),
            self.report.keyword,
            self.organizations.join(", ")
        ));
        output.push_str(&format!(
            "Found {} results in {}ms\n\n",
            self.report.results.len().to_string().green(),
            self.duration_ms
        ));

        if self.report.results.is_empty() {
            output.push_str(&format!("{}\n", NO_RESULTS_MESSAGE.dimmed()));
        }

        for (i, result) in self.report.results.iter().enumerate() {
            output.push_str(&format!(
                "{:2}. {} {}\n",
                i + 1,
                result.repo_name.cyan().bold(),
                format!("[{}]", result.file_name()).dimmed()
            ));
            output.push_str(&format!("    {} {}\n", "File:".dimmed(), result.file_url));
            for line in result.context.lines() {
                output.push_str(&format!("    {} {}\n", "|".dimmed(), line));
            }
            output.push_str(&format!("    {}\n", "AI Explanation:".yellow()));
            for line in result.explanation.trim().lines() {
                output.push_str(&format!("    {}\n", line));
            }
            output.push('\n');
        }

        if !self.report.skipped.is_empty() {
            output.push_str(&format!(
                "{}\n",
                format!(
                    "{} hits skipped (unreadable or no matching line). Use --verbose for details.",
                    self.report.skipped.len()
                )
                .dimmed()
            ));
        }

        output
    }

    fn to_html(&self, _config: &OutputConfig) -> String {
        HtmlOutput::results(&self.report.results)
    }
}

/// Hint shown under pipeline errors.
fn error_details(err: &PipelineError) -> Option<&'static str> {
    match err {
        PipelineError::Search { .. } if err.is_auth() => Some(
            "Run 'orgscope settings set --github-token <TOKEN> --gemini-key <KEY>' to configure credentials.",
        ),
        PipelineError::Credentials(_) => Some(
            "Run 'orgscope settings set --github-token <TOKEN> --gemini-key <KEY>' to overwrite the credential store.",
        ),
        _ => None,
    }
}

/// Run the search command
pub async fn run(
    keyword: &str,
    config: PipelineConfig,
    credentials_path: &Path,
    output: OutputConfig,
) -> anyhow::Result<ExitCode> {
    if keyword.trim().is_empty() {
        anyhow::bail!("Search keyword cannot be empty. Please provide a search term.");
    }

    let start = Instant::now();
    let organizations = config.organizations.clone();
    let store = Arc::new(FileCredentialStore::new(credentials_path));
    let pipeline = ResultPipeline::with_http_clients(config, store);

    match pipeline.run_with_report(keyword).await {
        Ok(report) => {
            for skipped in &report.skipped {
                tracing::info!("Skipped {} ({:?})", skipped.file_url, skipped.reason);
            }
            let results = SearchResults {
                report,
                organizations,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            Output::new(results, output).render()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!("Search failed: {:?}", err);
            let message = match error_details(&err) {
                Some(details) => ErrorMessage::with_details(err.to_string(), details),
                None => ErrorMessage::new(err.to_string()),
            };
            Output::new(message, output).render()?;
            Ok(ExitCode::FAILURE)
        }
    }
}

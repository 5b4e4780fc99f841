//! Output formatting module for the orgscope CLI
//!
//! Renders command results as a colored terminal view (table), JSON for
//! scripts, or an HTML fragment for embedding in a page.
//!
//! Colors are disabled automatically when stdout is not a TTY, unless the
//! config file forces them on or off.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod html;
mod json;

pub use self::html::{escape_html, HtmlOutput, NO_RESULTS_MESSAGE};
pub use self::json::JsonOutput;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal view (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
    /// HTML fragment with escaped content
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// The output format to use
    pub format: OutputFormat,
    /// Disable colored output
    pub no_color: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with the specified format
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
        }
    }

    /// Create an OutputConfig with TTY detection and an optional color override.
    ///
    /// `Some(true)` forces colors on even when piped, `Some(false)` forces
    /// them off, `None` enables them only when stdout is a TTY.
    pub fn auto_detect_with_color_override(
        format: OutputFormat,
        color_override: Option<bool>,
    ) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        Self {
            no_color: !color_override.unwrap_or(is_tty),
            ..Self::new(format)
        }
    }

    /// Check if colors should be used
    pub fn use_colors(&self) -> bool {
        !self.no_color
    }
}

/// Trait for types that can be formatted as output
pub trait Outputter: Serialize + Sized {
    /// Render as the terminal view
    fn to_table(&self, config: &OutputConfig) -> String;

    /// Render as JSON format
    fn to_json(&self, _config: &OutputConfig) -> String {
        JsonOutput::format(self)
    }

    /// Render as an HTML fragment
    fn to_html(&self, config: &OutputConfig) -> String;

    /// Render using the format specified in config
    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
            OutputFormat::Html => self.to_html(config),
        }
    }
}

/// Result wrapper for formatted output with automatic format selection
pub struct Output<T> {
    data: T,
    config: OutputConfig,
}

impl<T: Outputter> Output<T> {
    /// Create a new output wrapper
    pub fn new(data: T, config: OutputConfig) -> Self {
        Self { data, config }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        colored::control::set_override(self.config.use_colors());
        println!("{}", self.data.render(&self.config));
        Ok(())
    }
}

// ============================================================================
// Built-in message types
// ============================================================================

/// Simple success message
#[derive(Debug, Serialize)]
pub struct SuccessMessage {
    pub message: String,
}

impl SuccessMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Outputter for SuccessMessage {
    fn to_table(&self, _config: &OutputConfig) -> String {
        use colored::Colorize;
        format!("{} {}", "SUCCESS:".green().bold(), self.message)
    }

    fn to_html(&self, _config: &OutputConfig) -> String {
        format!(
            "<div class=\"status success\">{}</div>",
            escape_html(&self.message)
        )
    }
}

/// Simple error message, shown where results would otherwise appear
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            details: None,
        }
    }

    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            details: Some(details.into()),
        }
    }
}

impl Outputter for ErrorMessage {
    fn to_table(&self, _config: &OutputConfig) -> String {
        use colored::Colorize;
        let mut output = format!("{} {}", "ERROR:".red().bold(), self.error);
        if let Some(details) = &self.details {
            output.push_str(&format!("\n{}", details.dimmed()));
        }
        output
    }

    fn to_html(&self, _config: &OutputConfig) -> String {
        let mut output = format!("<div class=\"error\">Error: {}", escape_html(&self.error));
        if let Some(details) = &self.details {
            output.push_str(&format!("<br>{}", escape_html(details)));
        }
        output.push_str("</div>");
        output
    }
}

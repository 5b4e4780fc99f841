//! Orgscope CLI - search GitHub organizations for a keyword and explain the
//! snippets that use it.
//!
//! Each hit's file is fetched, trimmed to the lines around the first match,
//! and annotated with a short AI-generated explanation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{search, settings};
use config::{AppConfig, CONFIG_FILE_NAME};
use output::{OutputConfig, OutputFormat};

/// Search GitHub organizations for a keyword and explain each snippet.
#[derive(Parser)]
#[command(name = "orgscope")]
#[command(author, version)]
#[command(about = "Search GitHub organizations for a keyword and explain each snippet")]
#[command(propagate_version = true)]
#[command(after_help = "Quick Start:
  orgscope settings set --github-token <T> --gemini-key <K>
  orgscope search patch_to
  orgscope search delegates --format html > results.html")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (defaults to ./.orgscope.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Credential store file
    #[arg(long, global = true, env = "ORGSCOPE_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Fail on configuration errors instead of falling back to defaults
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the configured organizations for a keyword
    #[command(visible_alias = "s")]
    Search {
        /// Keyword matched against file contents
        keyword: String,
    },

    /// Manage the GitHub token and Gemini API key
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Save both credentials
    Set {
        /// GitHub personal access token used for code search
        #[arg(long)]
        github_token: String,

        /// Gemini API key used for explanations
        #[arg(long)]
        gemini_key: String,
    },

    /// Show the stored credentials (masked)
    Show,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = if cli.strict {
        AppConfig::load_strict(&config_path)?
    } else {
        AppConfig::load(&config_path)
    };

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    let output = OutputConfig::auto_detect_with_color_override(format, config.use_color());

    let credentials_path = cli
        .credentials
        .clone()
        .unwrap_or_else(config::default_credentials_path);

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(ExitCode::SUCCESS);
        }
    };

    match command {
        Commands::Search { keyword } => {
            search::run(&keyword, config.pipeline_config(), &credentials_path, output).await
        }
        Commands::Settings { action } => {
            match action {
                SettingsAction::Set {
                    github_token,
                    gemini_key,
                } => settings::run_set(&github_token, &gemini_key, &credentials_path, output)?,
                SettingsAction::Show => settings::run_show(&credentials_path, output)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

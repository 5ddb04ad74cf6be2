//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Settings left unset here fall back to the
//! config file and then to built-in defaults.

use crate::config::{OutputFormat, Provider};
use clap::Parser;
use std::path::PathBuf;

/// Webscribe - LLM-powered web research pipeline
///
/// Plans search queries for a topic, fetches the matching pages with
/// bounded concurrency and writes a structured markdown summary.
///
/// Examples:
///   webscribe --topic "Japanese economics"
///   webscribe --topic "Rust async runtimes" --provider gemini --model gemini-2.0-flash
///   webscribe --topic "WebAssembly GC" --dry-run
///   webscribe --serve
///   webscribe --list-tools
///   webscribe --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Topic to research
    #[arg(
        short,
        long,
        value_name = "TOPIC",
        required_unless_present_any = ["serve", "init_config", "list_tools"]
    )]
    pub topic: Option<String>,

    /// Run as an MCP stdio server exposing the `research` tool
    #[arg(long, conflicts_with_all = ["topic", "dry_run"])]
    pub serve: bool,

    /// Language-model provider
    #[arg(long, value_name = "PROVIDER", env = "WEBSCRIBE_PROVIDER")]
    pub provider: Option<Provider>,

    /// Model name
    ///
    /// Can also be set via WEBSCRIBE_MODEL env var or .webscribe.toml config.
    #[arg(short, long, env = "WEBSCRIBE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .webscribe.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Maximum simultaneous page fetches for the whole run
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Maximum number of search queries to plan
    #[arg(long, value_name = "COUNT")]
    pub max_queries: Option<usize>,

    /// Search hits requested per query
    #[arg(long, value_name = "COUNT")]
    pub results_per_query: Option<usize>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Per-page fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Search region code (e.g. jp-jp)
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// URL suffixes treated as document pages (comma-separated)
    ///
    /// Example: --suffixes html,htm
    #[arg(long, value_name = "SUFFIXES", value_delimiter = ',')]
    pub suffixes: Option<Vec<String>>,

    /// Convert fetched HTML to plain text before summarizing
    #[arg(long)]
    pub extract_text: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: plan and search, list the pages that would be fetched
    ///
    /// No pages are fetched and no summary is generated.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .webscribe.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Print the server's tools as Gemini function declarations and exit
    #[arg(long, conflicts_with_all = ["serve", "dry_run"])]
    pub list_tools: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The topic, or an empty string in modes that don't need one.
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config and --list-tools
        if self.init_config || self.list_tools {
            return Ok(());
        }

        if !self.serve && self.topic().trim().is_empty() {
            return Err("Topic must not be empty".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.max_queries == Some(0) {
            return Err("Max queries must be at least 1".to_string());
        }

        if self.results_per_query == Some(0) {
            return Err("Results per query must be at least 1".to_string());
        }

        if self.timeout == Some(0) || self.fetch_timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref suffixes) = self.suffixes {
            if suffixes.iter().all(|s| s.trim().is_empty()) {
                return Err("At least one document suffix is required".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            topic: Some("Japanese economics".to_string()),
            serve: false,
            provider: None,
            model: None,
            ollama_url: None,
            config: None,
            output: None,
            format: None,
            concurrency: None,
            max_queries: None,
            results_per_query: None,
            timeout: None,
            fetch_timeout: None,
            region: None,
            suffixes: None,
            extract_text: false,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
            list_tools: false,
        }
    }

    #[test]
    fn test_valid_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_topic() {
        let mut args = make_args();
        args.topic = Some("   ".to_string());
        assert!(args.validate().is_err());

        args.serve = true;
        args.topic = None;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_queries = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.fetch_timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "webscribe",
            "--topic",
            "rust",
            "--suffixes",
            "html,htm",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.topic(), "rust");
        assert_eq!(
            args.suffixes,
            Some(vec!["html".to_string(), "htm".to_string()])
        );
        assert_eq!(args.format, Some(OutputFormat::Json));

        assert!(Args::try_parse_from(["webscribe", "--serve", "--topic", "x"]).is_err());
        assert!(Args::try_parse_from(["webscribe"]).is_err());
        assert!(Args::try_parse_from(["webscribe", "--list-tools"]).is_ok());
    }
}

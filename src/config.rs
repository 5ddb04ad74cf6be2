//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.webscribe.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".webscribe.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Research stage settings.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Page fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "research_report.md".to_string()
}

/// Which language-model backend to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend provider.
    #[serde(default)]
    pub provider: Provider,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Gemini API base URL.
    #[serde(default = "default_gemini_url")]
    pub gemini_url: String,

    /// Gemini API key. Falls back to `GEMINI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            ollama_url: default_ollama_url(),
            gemini_url: default_gemini_url(),
            api_key: None,
            temperature: default_temperature(),
            timeout_seconds: default_model_timeout(),
        }
    }
}

impl ModelConfig {
    /// Resolve the Gemini API key from config or environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    /// `provider/model`, used in logs and reports.
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.name)
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_model_timeout() -> u64 {
    300
}

/// Research stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Maximum number of planned queries.
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,

    /// Search hits requested per query (fetch fanout).
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// URL path suffixes that look like document pages.
    #[serde(default = "default_document_suffixes")]
    pub document_suffixes: Vec<String>,

    /// Skip a query whose search fails instead of aborting the run.
    #[serde(default)]
    pub isolate_search_failures: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_queries: default_max_queries(),
            results_per_query: default_results_per_query(),
            document_suffixes: default_document_suffixes(),
            isolate_search_failures: false,
        }
    }
}

fn default_max_queries() -> usize {
    5
}

fn default_results_per_query() -> usize {
    5
}

fn default_document_suffixes() -> Vec<String> {
    vec!["html".to_string()]
}

/// Search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// DuckDuckGo HTML endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Optional region code (e.g. `jp-jp`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            region: None,
            timeout_seconds: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}

fn default_search_timeout() -> u64 {
    20
}

/// Page fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum simultaneous in-flight fetches for a whole run.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-page timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Convert HTML to plain text before it enters the corpus.
    #[serde(default)]
    pub extract_text: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_seconds: default_fetch_timeout(),
            user_agent: default_user_agent(),
            extract_text: false,
        }
    }
}

fn default_concurrency() -> usize {
    20
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("Mozilla/5.0 (compatible; webscribe/{})", env!("CARGO_PKG_VERSION"))
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// List fetched sources in the report.
    #[serde(default = "default_true")]
    pub include_sources: bool,

    /// Embed full page bodies in JSON reports.
    #[serde(default)]
    pub include_content: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_sources: true,
            include_content: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.webscribe.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(max_queries) = args.max_queries {
            self.research.max_queries = max_queries;
        }
        if let Some(results) = args.results_per_query {
            self.research.results_per_query = results;
        }
        if let Some(ref suffixes) = args.suffixes {
            self.research.document_suffixes = suffixes.clone();
        }

        if let Some(ref region) = args.region {
            self.search.region = Some(region.clone());
        }

        if let Some(concurrency) = args.concurrency {
            self.fetch.concurrency = concurrency;
        }
        if let Some(timeout) = args.fetch_timeout {
            self.fetch.timeout_seconds = timeout;
        }
        if args.extract_text {
            self.fetch.extract_text = true;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.research.max_queries, 5);
        assert_eq!(config.research.results_per_query, 5);
        assert_eq!(config.fetch.concurrency, 20);
        assert_eq!(config.research.document_suffixes, vec!["html"]);
        assert!(!config.research.isolate_search_failures);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
format = "json"

[model]
provider = "gemini"
name = "gemini-2.0-flash"
temperature = 0.2

[research]
max_queries = 3
document_suffixes = ["html", "htm"]

[fetch]
concurrency = 8
extract_text = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.model.provider, Provider::Gemini);
        assert_eq!(config.model.name, "gemini-2.0-flash");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.research.max_queries, 3);
        assert_eq!(config.research.results_per_query, 5);
        assert_eq!(config.research.document_suffixes, vec!["html", "htm"]);
        assert_eq!(config.fetch.concurrency, 8);
        assert!(config.fetch.extract_text);
        assert_eq!(config.fetch.timeout_seconds, 30);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[research]"));
        assert!(toml_str.contains("[fetch]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.fetch.concurrency, 20);
        // Verbosity comes from --verbose/--quiet only
        assert!(!toml_str.contains("verbose"));
    }

    #[test]
    fn test_older_verbose_key_is_tolerated() {
        let config: Config = toml::from_str("[general]\nverbose = true\nformat = \"json\"\n").unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        let mut file = std::fs::File::create(temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();
        writeln!(file, "[search]\nregion = \"jp-jp\"").unwrap();

        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.search.region.as_deref(), Some("jp-jp"));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[fetch\nconcurrency = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_model_label() {
        let config = ModelConfig::default();
        assert_eq!(config.label(), "ollama/llama3.2:latest");
    }
}

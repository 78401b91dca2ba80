//! Application configuration for wikicorpus.
//!
//! User config lives at `~/.wikicorpus/wikicorpus.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result};
use crate::types::OutputFormat;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "wikicorpus.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".wikicorpus";

// ---------------------------------------------------------------------------
// Config structs (matching wikicorpus.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Harvest defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Remote API access.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Article text extraction.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// ISO 639-1 language code of the encyclopedia edition.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Maximum number of articles admitted per category.
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,

    /// Maximum article length in characters; longer texts are truncated.
    /// `0` disables the upper bound.
    #[serde(default = "default_max_article_length")]
    pub max_article_length: usize,

    /// Minimum article length in characters; shorter texts are rejected.
    #[serde(default)]
    pub min_article_length: usize,

    /// Corpus output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Articles fetched concurrently within one category.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            max_articles: default_max_articles(),
            max_article_length: default_max_article_length(),
            min_article_length: 0,
            output_format: OutputFormat::default(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

fn default_lang() -> String {
    "de".into()
}
fn default_max_articles() -> usize {
    1000
}
fn default_max_article_length() -> usize {
    10_000
}
fn default_fetch_concurrency() -> usize {
    1
}

/// `[remote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API endpoint; `{lang}` is replaced with the language code.
    #[serde(default = "default_api_url_template")]
    pub api_url_template: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum ms between consecutive requests.
    #[serde(default)]
    pub rate_limit_ms: u64,

    /// Retries for transient failures before a unit is given up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url_template: default_api_url_template(),
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: 0,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_api_url_template() -> String {
    "https://{lang}.wikipedia.org/w/api.php".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    1000
}

/// `[extraction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Section titles whose content (including subsections) is dropped.
    #[serde(default = "default_skip_sections")]
    pub skip_sections: Vec<String>,

    /// Articles whose title contains any of these substrings are never admitted.
    #[serde(default = "default_exclude_title_patterns")]
    pub exclude_title_patterns: Vec<String>,

    /// Keep section headings as lines of the extracted text.
    #[serde(default)]
    pub include_headings: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            skip_sections: default_skip_sections(),
            exclude_title_patterns: default_exclude_title_patterns(),
            include_headings: false,
        }
    }
}

fn default_skip_sections() -> Vec<String> {
    [
        "Literatur",
        "Weblinks",
        "Einzelnachweis",
        "Einzelnachweise",
        "Siehe auch",
        "Anmerkungen",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_exclude_title_patterns() -> Vec<String> {
    vec!["Liste von".into(), "Liste d".into()]
}

// ---------------------------------------------------------------------------
// Harvest config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime harvest configuration, merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Language code, selects the encyclopedia edition.
    pub lang: String,
    /// Per-category admission cap.
    pub max_articles: usize,
    /// Lower length bound in characters.
    pub min_article_length: usize,
    /// Upper length bound in characters; `None` means unbounded.
    pub max_article_length: Option<usize>,
    /// Corpus output format.
    pub output_format: OutputFormat,
    /// Articles fetched concurrently within one category.
    pub fetch_concurrency: usize,
    /// API endpoint template (`{lang}` placeholder).
    pub api_url_template: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between consecutive requests in ms.
    pub rate_limit_ms: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// Base delay of the retry backoff in ms.
    pub retry_backoff_ms: u64,
    /// Section titles dropped from article text.
    pub skip_sections: Vec<String>,
    /// Title substrings that exclude an article before admission.
    pub exclude_title_patterns: Vec<String>,
    /// Keep section headings in the extracted text.
    pub include_headings: bool,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        let max_len = config.defaults.max_article_length;
        Self {
            lang: config.defaults.lang.clone(),
            max_articles: config.defaults.max_articles,
            min_article_length: config.defaults.min_article_length,
            max_article_length: (max_len > 0).then_some(max_len),
            output_format: config.defaults.output_format,
            fetch_concurrency: config.defaults.fetch_concurrency,
            api_url_template: config.remote.api_url_template.clone(),
            timeout_secs: config.remote.timeout_secs,
            rate_limit_ms: config.remote.rate_limit_ms,
            max_retries: config.remote.max_retries,
            retry_backoff_ms: config.remote.retry_backoff_ms,
            skip_sections: config.extraction.skip_sections.clone(),
            exclude_title_patterns: config.extraction.exclude_title_patterns.clone(),
            include_headings: config.extraction.include_headings,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl HarvestConfig {
    /// Reject contradictory or unusable settings before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.lang.is_empty()
            || !self
                .lang
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(CorpusError::config(format!(
                "invalid language code '{}'",
                self.lang
            )));
        }
        if self.max_articles == 0 {
            return Err(CorpusError::config("max_articles must be at least 1"));
        }
        if self.fetch_concurrency == 0 {
            return Err(CorpusError::config("fetch_concurrency must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(CorpusError::config("timeout_secs must be at least 1"));
        }
        if let Some(max) = self.max_article_length {
            if self.min_article_length > max {
                return Err(CorpusError::config(format!(
                    "min_article_length ({}) exceeds max_article_length ({max})",
                    self.min_article_length
                )));
            }
        }
        if !self.api_url_template.contains("://") {
            return Err(CorpusError::config(format!(
                "api_url_template is not a URL: {}",
                self.api_url_template
            )));
        }
        Ok(())
    }

    /// The API endpoint for the configured language.
    pub fn api_url(&self) -> String {
        self.api_url_template.replace("{lang}", &self.lang)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.wikicorpus/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CorpusError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.wikicorpus/wikicorpus.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CorpusError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CorpusError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CorpusError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CorpusError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

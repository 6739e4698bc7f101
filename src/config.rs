//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Hard ceiling on the number of titles taken from a listing page.
pub const MAX_LISTING_ITEMS: usize = 50;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site root used to build the listing URL and absolutise relative links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the listing page below `base_url`
    #[serde(default = "default_listing_path")]
    pub listing_path: String,

    /// Proxy URL (e.g., socks5h://tor:9050)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between title page requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of titles to crawl (never more than 50)
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Directory receiving movies_detailed.json / movies_detailed.csv
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// How the User-Agent header is chosen
    #[serde(default)]
    pub user_agent_mode: UserAgentMode,

    /// User-Agent pool; `Fixed` mode always sends the first entry
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header value
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Automatic retry for transient failures; `None` sends each request once
    #[serde(default = "default_retry")]
    pub retry: Option<RetryPolicy>,
}

fn default_base_url() -> String {
    "https://www.imdb.com".to_string()
}

fn default_listing_path() -> String {
    "/chart/top/".to_string()
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_items() -> usize {
    MAX_LISTING_ITEMS
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_retry() -> Option<RetryPolicy> {
    Some(RetryPolicy::default())
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            timeout_secs: default_timeout_secs(),
            max_items: default_max_items(),
            format: OutputFormat::Table,
            output_dir: None,
            user_agent_mode: UserAgentMode::Rotate,
            user_agents: default_user_agents(),
            accept_language: default_accept_language(),
            retry: default_retry(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("imdb-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("IMDB_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("IMDB_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(timeout) = std::env::var("IMDB_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }

        self
    }

    /// Full URL of the listing page.
    pub fn listing_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(&self.listing_path)
    }

    /// Points the crawl at a full listing URL, splitting it into site root and path.
    pub fn set_listing_url(&mut self, url: &str) -> Result<()> {
        let parsed =
            Url::parse(url).with_context(|| format!("Invalid listing URL: {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Listing URL must use http or https: {}", url);
        }

        self.base_url = parsed.origin().ascii_serialization();
        self.listing_path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        Ok(())
    }

    /// Number of listing items to process, clamped to the hard ceiling.
    pub fn item_cap(&self) -> usize {
        self.max_items.min(MAX_LISTING_ITEMS)
    }
}

/// User-Agent selection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAgentMode {
    /// Pick a random pool entry for every request
    #[default]
    Rotate,
    /// Always send the first pool entry
    Fixed,
}

/// Retry behaviour for transient HTTP failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before retry `n` is `backoff_base_ms * 2^(n-1)`
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Status codes worth retrying
    #[serde(default = "default_retryable_status")]
    pub retryable_status: Vec<u16>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_retryable_status() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            retryable_status: default_retryable_status(),
        }
    }
}

impl RetryPolicy {
    /// Sleep before the given retry (1-based).
    pub fn backoff_ms(&self, retry: u32) -> u64 {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_base_ms.saturating_mul(1u64 << exponent)
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

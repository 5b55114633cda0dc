mod env_manager;

use crate::error::{Result, ScopeError};
use crate::github::TimeRange;
use crate::insights::{DedupPolicy, DEFAULT_MAX_POINTS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub use env_manager::{get_env_value, EnvOverrides};

/// Default GitHub REST endpoint
pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";
/// Default text-generation endpoint
pub const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Main configuration struct for the application
///
/// Every section has defaults, so a config file only needs the keys it
/// changes. Environment variables are applied on top by
/// [`Config::with_env_overrides`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API access
    pub github: GitHubSettings,
    /// Text-generation service access
    pub llm: LlmSettings,
    /// Report layout and cleanup rules
    pub report: ReportSettings,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
}

/// Settings for the GitHub data source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Personal access token, raises the anonymous rate limit
    pub token: Option<String>,
    /// User-Agent header, required by GitHub
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Page size for list endpoints
    pub per_page: u32,
}

/// Settings for the text-generation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// `generateContent` URL
    pub endpoint: String,
    /// API key appended as the `key` query parameter
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Settings for report formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Maximum number of insight bullets
    pub max_insights: usize,
    /// Trending results shown before demotion
    pub trending_limit: usize,
    /// Search results shown before demotion
    pub search_limit: usize,
    /// Repositories listed in a user report
    pub top_user_repos: usize,
    /// Creation window for trending queries
    pub time_range: TimeRange,
    /// Keywords marking configuration-like repositories
    pub demote_keywords: Vec<String>,
    /// Duplicate detection for insight lines
    pub dedup: DedupPolicy,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: GITHUB_API_BASE_URL.to_string(),
            token: None,
            user_agent: format!("gitscope/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
            per_page: 100,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: GEMINI_API_URL.to_string(),
            api_key: None,
            timeout_seconds: 60,
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_insights: DEFAULT_MAX_POINTS,
            trending_limit: 10,
            search_limit: 8,
            top_user_repos: 3,
            time_range: TimeRange::default(),
            demote_keywords: crate::formatter::CONFIG_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            dedup: DedupPolicy::default(),
        }
    }
}

impl Config {
    /// Default location of the config file: `<config dir>/gitscope/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ScopeError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("gitscope").join("config.toml"))
    }

    /// Loads configuration from the default config file location
    ///
    /// If the config file doesn't exist, returns the default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Loads configuration from an explicit TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScopeError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies environment overrides (`GITHUB_TOKEN`, `GEMINI_API_KEY`, ...)
    pub fn with_env_overrides(self) -> Self {
        EnvOverrides::from_env().apply(self)
    }

    /// Log level to use, falling back to `info`
    pub fn log_level(&self) -> &str {
        if self.log_level.trim().is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }

    /// Validates URLs, tokens and limits
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.github.api_base_url)?;
        Url::parse(&self.llm.endpoint)?;
        self.ensure_tokens()?;

        if self.github.per_page == 0 || self.github.per_page > 100 {
            return Err(ScopeError::Config(format!(
                "github.per_page must be between 1 and 100, got {}",
                self.github.per_page
            )));
        }
        if self.report.max_insights == 0 {
            return Err(ScopeError::Config("report.max_insights must be at least 1".into()));
        }
        if self.report.trending_limit == 0 || self.report.search_limit == 0 {
            return Err(ScopeError::Config("report result limits must be at least 1".into()));
        }
        Ok(())
    }

    /// Rejects tokens that are present but blank
    pub fn ensure_tokens(&self) -> Result<()> {
        if let Some(token) = &self.github.token {
            if token.trim().is_empty() {
                return Err(ScopeError::Config("GitHub token is empty".into()));
            }
        }
        if let Some(key) = &self.llm.api_key {
            if key.trim().is_empty() {
                return Err(ScopeError::Config("Gemini API key is empty".into()));
            }
        }
        Ok(())
    }
}

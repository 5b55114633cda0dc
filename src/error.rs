use std::io;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Errors that can occur while answering a chat query
#[derive(Debug, Error)]
pub enum ScopeError {
    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// The requested repository or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// API rate limit exceeded errors
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// GitHub API specific errors
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Text generation errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ScopeError {
    /// Checks if this error is transient, i.e. the same query may succeed later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Http(_) | Self::RateLimitExceeded(_) | Self::Io(_)
        )
    }

    /// Checks if this error comes from the GitHub data source
    pub fn is_github(&self) -> bool {
        matches!(
            self,
            Self::GitHubApi(_) | Self::NotFound(_) | Self::RateLimitExceeded(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        let transient = ScopeError::Network("connection timeout".into());
        let fatal = ScopeError::Validation("empty query".into());

        assert!(transient.is_transient());
        assert!(!fatal.is_transient());
    }

    #[test]
    fn test_github_errors_display() {
        let err = ScopeError::NotFound("repos/octocat/missing".into());
        assert!(err.is_github());
        assert_eq!(err.to_string(), "Not found: repos/octocat/missing");
        assert!(!ScopeError::Llm("boom".into()).is_github());
    }
}

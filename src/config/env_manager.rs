use super::Config;

/// Configuration values taken from the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    /// `GITHUB_TOKEN`
    pub github_token: Option<String>,
    /// `GITHUB_API_BASE_URL`
    pub github_api_base_url: Option<String>,
    /// `GEMINI_API_KEY`
    pub gemini_api_key: Option<String>,
    /// `GEMINI_API_URL`
    pub gemini_api_url: Option<String>,
}

impl EnvOverrides {
    /// Reads overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(get_env_value)
    }

    /// Reads overrides through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            github_token: lookup("GITHUB_TOKEN"),
            github_api_base_url: lookup("GITHUB_API_BASE_URL"),
            gemini_api_key: lookup("GEMINI_API_KEY"),
            gemini_api_url: lookup("GEMINI_API_URL"),
        }
    }

    /// Applies every override that is set, leaving the rest of the config intact
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(token) = self.github_token {
            config.github.token = Some(token);
        }
        if let Some(url) = self.github_api_base_url {
            config.github.api_base_url = url;
        }
        if let Some(key) = self.gemini_api_key {
            config.llm.api_key = Some(key);
        }
        if let Some(url) = self.gemini_api_url {
            config.llm.endpoint = url;
        }
        config
    }
}

/// Returns a non-empty environment variable
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let overrides = EnvOverrides::from_lookup(|key| match key {
            "GITHUB_TOKEN" => Some("ghp_env".to_string()),
            "GEMINI_API_URL" => Some("http://localhost:9999/generate".to_string()),
            _ => None,
        });
        let config = overrides.apply(Config::default());

        assert_eq!(config.github.token.as_deref(), Some("ghp_env"));
        assert_eq!(config.llm.endpoint, "http://localhost:9999/generate");
        assert_eq!(config.github.api_base_url, super::super::GITHUB_API_BASE_URL);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let config = EnvOverrides::default().apply(Config::default());
        assert_eq!(config.github.api_base_url, super::super::GITHUB_API_BASE_URL);
        assert!(config.github.token.is_none());
    }
}

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::github::DEFAULT_API_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read token from terminal: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("No GitHub token: set [github] token, GITHUB_TOKEN, or enter one at the prompt")]
    MissingToken,
}

/// Top-level configuration loaded from .contrib-metrics.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    /// REST API base URL, for GitHub Enterprise installs.
    pub api_url: Option<String>,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from .contrib-metrics.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".contrib-metrics.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Config file value takes precedence, then the GITHUB_TOKEN env var.
    /// Blank values count as absent.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Resolve the token, asking `prompt` only when neither the config file nor
    /// the environment provides one. The prompt's answer is trimmed, and a blank
    /// answer is rejected.
    pub fn resolve_token<F>(&self, prompt: F) -> Result<String, ConfigError>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        if let Some(token) = self.github_token() {
            return Ok(token);
        }
        let entered = prompt().map_err(ConfigError::Prompt)?;
        let token = entered.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(token.to_string())
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.api_url(), "https://api.github.com");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "ghp_example"
api_url = "https://github.example.com/api/v3"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token().as_deref(), Some("ghp_example"));
        assert_eq!(config.api_url(), "https://github.example.com/api/v3");
    }

    #[test]
    fn test_resolve_token_skips_prompt_when_configured() {
        let config: Config = toml::from_str("[github]\ntoken = \"ghp_file\"\n").unwrap();
        let token = config
            .resolve_token(|| panic!("prompt must not run when a token is configured"))
            .unwrap();
        assert_eq!(token, "ghp_file");
    }

    #[test]
    fn test_resolve_token_from_prompt() {
        let config = Config::default();
        if config.github_token().is_some() {
            return; // GITHUB_TOKEN set in this environment
        }
        let token = config.resolve_token(|| Ok("  ghp_typed\n".to_string())).unwrap();
        assert_eq!(token, "ghp_typed");
    }

    #[test]
    fn test_resolve_token_rejects_blank_prompt() {
        let config = Config::default();
        if config.github_token().is_some() {
            return;
        }
        assert!(matches!(
            config.resolve_token(|| Ok("   ".to_string())),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            config.resolve_token(|| Err(std::io::Error::other("no tty"))),
            Err(ConfigError::Prompt(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config: Config = toml::from_str("[github]\ntoken = \"ghp_secret\"\n").unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("ghp_secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("contrib-metrics-test-config.toml");
        std::fs::write(&path, "[github]\napi_url = \"http://localhost:8080\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url(), "http://localhost:8080");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_invalid_file() {
        let path = std::env::temp_dir().join("contrib-metrics-test-invalid.toml");
        std::fs::write(&path, "[github\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_file(&path).ok();
    }
}

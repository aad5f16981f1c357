//! Configuration management for the file agent service.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the chat completions endpoint.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. The chat model to use. Defaults to `gpt-4o-mini`.
//! - `WORKSPACE_PATH` - Optional. Base for relative `root_dir` values. Defaults to current directory.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_ITERATIONS` - Optional. Cap on agent loop iterations. Unbounded when unset.
//! - `PROMPT_TEMPLATE_URL` - Optional. Fetch the agent instruction template from this URL.

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat API key
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Chat model identifier
    pub default_model: String,

    /// Directory relative `root_dir` values are resolved against
    pub workspace_path: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum iterations for the agent loop (`None` = unbounded)
    pub max_iterations: Option<usize>,

    /// Remote instruction template; the built-in one is used when unset
    pub prompt_template_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .ok()
            .map(|v| parse_iterations(&v))
            .transpose()?;

        let prompt_template_url = std::env::var("PROMPT_TEMPLATE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_key,
            base_url,
            default_model,
            workspace_path,
            host,
            port,
            max_iterations,
            prompt_template_url,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            workspace_path,
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: None,
            prompt_template_url: None,
        }
    }

    /// Set an iteration cap on the agent loop.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

fn parse_iterations(value: &str) -> Result<usize, ConfigError> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue(
            "MAX_ITERATIONS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_unbounded() {
        let config = Config::new("key".into(), "m".into(), PathBuf::from("/tmp"));
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.prompt_template_url.is_none());
    }

    #[test]
    fn with_max_iterations_sets_cap() {
        let config = Config::new("key".into(), "m".into(), PathBuf::from("/tmp")).with_max_iterations(3);
        assert_eq!(config.max_iterations, Some(3));
    }

    #[test]
    fn parse_iterations_rejects_zero_and_garbage() {
        assert_eq!(parse_iterations(" 12 ").unwrap(), 12);
        assert!(matches!(
            parse_iterations("0"),
            Err(ConfigError::InvalidValue(name, _)) if name == "MAX_ITERATIONS"
        ));
        assert!(parse_iterations("lots").is_err());
    }
}

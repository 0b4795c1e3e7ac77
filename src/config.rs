//! Configuration management for GovernAI
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{GovernaiError, Result};
use crate::session::streaming::RevealTiming;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for GovernAI
///
/// Holds the API connection settings, copilot session behavior,
/// and local storage overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Copilot session behavior
    #[serde(default)]
    pub copilot: CopilotConfig,
    /// Local persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the governance API (scheme, host, port)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Copilot session configuration
///
/// Controls the free-tier threshold and the cosmetic word reveal used
/// when presenting assistant answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotConfig {
    /// Number of free queries/uploads before the upgrade prompt blocks input
    #[serde(default = "default_free_query_limit")]
    pub free_query_limit: u32,

    /// Delay between revealed words for query answers (milliseconds)
    #[serde(default = "default_query_reveal_delay")]
    pub query_reveal_delay_ms: u64,

    /// Delay between revealed words for upload confirmations (milliseconds)
    #[serde(default = "default_upload_reveal_delay")]
    pub upload_reveal_delay_ms: u64,

    /// Pause after the last word before the message is committed (milliseconds)
    #[serde(default = "default_trailing_pause")]
    pub reveal_trailing_pause_ms: u64,

    /// Enable the word-by-word reveal in the terminal
    #[serde(default = "default_reveal_enabled")]
    pub reveal_enabled: bool,
}

fn default_free_query_limit() -> u32 {
    5
}

fn default_query_reveal_delay() -> u64 {
    20
}

fn default_upload_reveal_delay() -> u64 {
    15
}

fn default_trailing_pause() -> u64 {
    100
}

fn default_reveal_enabled() -> bool {
    true
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            free_query_limit: default_free_query_limit(),
            query_reveal_delay_ms: default_query_reveal_delay(),
            upload_reveal_delay_ms: default_upload_reveal_delay(),
            reveal_trailing_pause_ms: default_trailing_pause(),
            reveal_enabled: default_reveal_enabled(),
        }
    }
}

impl CopilotConfig {
    /// Reveal timing for query answers
    pub fn query_timing(&self) -> RevealTiming {
        self.timing(self.query_reveal_delay_ms)
    }

    /// Reveal timing for upload confirmations
    pub fn upload_timing(&self) -> RevealTiming {
        self.timing(self.upload_reveal_delay_ms)
    }

    fn timing(&self, word_delay_ms: u64) -> RevealTiming {
        if !self.reveal_enabled {
            return RevealTiming::instant();
        }
        RevealTiming {
            word_delay: Duration::from_millis(word_delay_ms),
            trailing_pause: Duration::from_millis(self.reveal_trailing_pause_ms),
        }
    }
}

/// Local persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Optional path to the usage database; defaults to the user data directory
    #[serde(default)]
    pub usage_db: Option<String>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GovernaiError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GovernaiError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("GOVERNAI_API_URL") {
            tracing::debug!(base_url = %base_url, "Env override: GOVERNAI_API_URL");
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("GOVERNAI_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid GOVERNAI_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(limit) = std::env::var("GOVERNAI_FREE_QUERY_LIMIT") {
            if let Ok(value) = limit.parse() {
                self.copilot.free_query_limit = value;
            } else {
                tracing::warn!("Invalid GOVERNAI_FREE_QUERY_LIMIT: {}", limit);
            }
        }

        if let Ok(reveal) = std::env::var("GOVERNAI_REVEAL") {
            match reveal.to_lowercase().as_str() {
                "1" | "true" | "on" => self.copilot.reveal_enabled = true,
                "0" | "false" | "off" => self.copilot.reveal_enabled = false,
                _ => tracing::warn!("Invalid GOVERNAI_REVEAL: {}", reveal),
            }
        }

        if let Ok(db_path) = std::env::var("GOVERNAI_USAGE_DB") {
            self.storage.usage_db = Some(db_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }
        if let Some(db_path) = &cli.usage_db {
            self.storage.usage_db = Some(db_path.clone());
        }
        if cli.no_reveal {
            self.copilot.reveal_enabled = false;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not an absolute http(s) URL, or if
    /// the timeout or free query limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(GovernaiError::Config("api.base_url cannot be empty".to_string()).into());
        }

        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            GovernaiError::Config(format!(
                "Invalid api.base_url '{}': {}",
                self.api.base_url, e
            ))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GovernaiError::Config(format!(
                "api.base_url must use http or https, got: {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(GovernaiError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.copilot.free_query_limit == 0 {
            return Err(GovernaiError::Config(
                "copilot.free_query_limit must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    fn cli(args: &[&str]) -> crate::cli::Cli {
        let mut full = vec!["governai"];
        full.extend_from_slice(args);
        crate::cli::Cli::parse_from(full)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_seconds, 120);
        assert_eq!(config.copilot.free_query_limit, 5);
        assert!(config.storage.usage_db.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = Config::default();
        config.api.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_non_http_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_limit() {
        let mut config = Config::default();
        config.copilot.free_query_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
api:
  base_url: "https://governance.example.com"
  timeout_seconds: 30
copilot:
  free_query_limit: 10
  reveal_enabled: false
storage:
  usage_db: "/tmp/usage.db"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://governance.example.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.copilot.free_query_limit, 10);
        assert!(!config.copilot.reveal_enabled);
        assert_eq!(config.copilot.query_reveal_delay_ms, 20);
        assert_eq!(config.storage.usage_db.as_deref(), Some("/tmp/usage.db"));
    }

    #[test]
    fn test_disabled_reveal_yields_instant_timing() {
        let mut copilot = CopilotConfig::default();
        assert_eq!(copilot.query_timing().word_delay, Duration::from_millis(20));
        assert_eq!(copilot.upload_timing().word_delay, Duration::from_millis(15));

        copilot.reveal_enabled = false;
        assert_eq!(copilot.query_timing(), RevealTiming::instant());
    }

    #[test]
    #[serial]
    fn test_unparsable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "api: [not, a, map").unwrap();

        let err = Config::load(path.to_str().unwrap(), &cli(&["usage", "show"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GovernaiError>(),
            Some(GovernaiError::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("/nonexistent/governai.yaml", &cli(&["usage", "show"])).unwrap();
        assert_eq!(config.copilot.free_query_limit, 5);
    }

    #[test]
    #[serial]
    fn test_env_vars_override_file_values() {
        std::env::set_var("GOVERNAI_API_URL", "http://api.internal:9000");
        std::env::set_var("GOVERNAI_FREE_QUERY_LIMIT", "12");
        std::env::set_var("GOVERNAI_REVEAL", "off");

        let config = Config::load("/nonexistent/governai.yaml", &cli(&["usage", "show"])).unwrap();

        std::env::remove_var("GOVERNAI_API_URL");
        std::env::remove_var("GOVERNAI_FREE_QUERY_LIMIT");
        std::env::remove_var("GOVERNAI_REVEAL");

        assert_eq!(config.api.base_url, "http://api.internal:9000");
        assert_eq!(config.copilot.free_query_limit, 12);
        assert!(!config.copilot.reveal_enabled);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_take_precedence() {
        std::env::set_var("GOVERNAI_API_URL", "http://from-env:9000");
        let config = Config::load(
            "/nonexistent/governai.yaml",
            &cli(&["--api-url", "http://from-cli:7000", "--no-reveal", "usage", "show"]),
        )
        .unwrap();
        std::env::remove_var("GOVERNAI_API_URL");

        assert_eq!(config.api.base_url, "http://from-cli:7000");
        assert!(!config.copilot.reveal_enabled);
    }
}

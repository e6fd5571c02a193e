//! Configuration management for Diagchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{DiagchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound accepted for `chat.vehicle_search_limit`
const MAX_VEHICLE_SEARCH_LIMIT: usize = 50;

/// Main configuration structure for Diagchat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Diagnosis service connection settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Conversation behaviour settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Diagnosis service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base url every endpoint is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("diagchat/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Conversation behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Hold suspicious free text until the operator confirms it
    #[serde(default = "default_true")]
    pub guard_enabled: bool,

    /// Maximum vehicle lookup results requested
    #[serde(default = "default_vehicle_search_limit")]
    pub vehicle_search_limit: usize,

    /// Print cited manual passages under assistant turns
    #[serde(default = "default_true")]
    pub show_citations: bool,
}

fn default_true() -> bool {
    true
}

fn default_vehicle_search_limit() -> usize {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            guard_enabled: true,
            vehicle_search_limit: default_vehicle_search_limit(),
            show_citations: true,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
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
            .map_err(|e| DiagchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DiagchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("DIAGCHAT_BASE_URL") {
            self.service.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("DIAGCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DIAGCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(guard) = std::env::var("DIAGCHAT_GUARD_ENABLED") {
            match parse_bool(&guard) {
                Some(value) => self.chat.guard_enabled = value,
                None => tracing::warn!("Invalid DIAGCHAT_GUARD_ENABLED: {}", guard),
            }
        }

        if let Ok(limit) = std::env::var("DIAGCHAT_VEHICLE_SEARCH_LIMIT") {
            if let Ok(value) = limit.parse() {
                self.chat.vehicle_search_limit = value;
            } else {
                tracing::warn!("Invalid DIAGCHAT_VEHICLE_SEARCH_LIMIT: {}", limit);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            tracing::debug!("Overriding base_url from command line: {}", base_url);
            self.service.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base url does not parse, the timeout is zero, or
    /// the vehicle search limit is outside 1..=50
    pub fn validate(&self) -> Result<()> {
        crate::service::http::parse_base_url(&self.service.base_url)?;

        if self.service.timeout_seconds == 0 {
            return Err(DiagchatError::Config(
                "service.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.vehicle_search_limit == 0
            || self.chat.vehicle_search_limit > MAX_VEHICLE_SEARCH_LIMIT
        {
            return Err(DiagchatError::Config(format!(
                "chat.vehicle_search_limit must be between 1 and {}",
                MAX_VEHICLE_SEARCH_LIMIT
            ))
            .into());
        }

        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_VARS: &[&str] = &[
        "DIAGCHAT_BASE_URL",
        "DIAGCHAT_TIMEOUT_SECONDS",
        "DIAGCHAT_GUARD_ENABLED",
        "DIAGCHAT_VEHICLE_SEARCH_LIMIT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn cli() -> Cli {
        Cli {
            config: None,
            verbose: false,
            json_logs: false,
            base_url: None,
            command: Commands::Chat,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:8000/api");
        assert_eq!(config.service.timeout_seconds, 120);
        assert!(config.service.user_agent.starts_with("diagchat/"));
        assert!(config.chat.guard_enabled);
        assert_eq!(config.chat.vehicle_search_limit, 10);
        assert!(config.chat.show_citations);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = Config::default();
        config.service.base_url = "localhost without scheme".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.service.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_search_limit_range() {
        let mut config = Config::default();
        config.chat.vehicle_search_limit = 0;
        assert!(config.validate().is_err());
        config.chat.vehicle_search_limit = 51;
        assert!(config.validate().is_err());
        config.chat.vehicle_search_limit = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
service:
  base_url: "https://diag.example.test/api"
  timeout_seconds: 30
chat:
  guard_enabled: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.service.base_url, "https://diag.example.test/api");
        assert_eq!(config.service.timeout_seconds, 30);
        assert!(config.service.user_agent.starts_with("diagchat/"));
        assert!(!config.chat.guard_enabled);
        assert_eq!(config.chat.vehicle_search_limit, 10);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.service.timeout_seconds, 120);
        assert!(config.chat.show_citations);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let config = Config::load("nonexistent.yaml", &cli()).unwrap();
        assert_eq!(config.service.base_url, "http://localhost:8000/api");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chat:\n  vehicle_search_limit: 5").unwrap();

        let config = Config::load(file.path().to_str().unwrap(), &cli()).unwrap();
        assert_eq!(config.chat.vehicle_search_limit, 5);
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_fails() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "service: [unterminated").unwrap();

        let result = Config::load(file.path().to_str().unwrap(), &cli());
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_env_vars_override_file() {
        clear_env();
        std::env::set_var("DIAGCHAT_BASE_URL", "http://env.example.test");
        std::env::set_var("DIAGCHAT_TIMEOUT_SECONDS", "7");
        std::env::set_var("DIAGCHAT_GUARD_ENABLED", "false");
        std::env::set_var("DIAGCHAT_VEHICLE_SEARCH_LIMIT", "3");

        let config = Config::load("nonexistent.yaml", &cli()).unwrap();
        clear_env();

        assert_eq!(config.service.base_url, "http://env.example.test");
        assert_eq!(config.service.timeout_seconds, 7);
        assert!(!config.chat.guard_enabled);
        assert_eq!(config.chat.vehicle_search_limit, 3);
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        clear_env();
        std::env::set_var("DIAGCHAT_TIMEOUT_SECONDS", "soon");
        std::env::set_var("DIAGCHAT_GUARD_ENABLED", "maybe");

        let config = Config::load("nonexistent.yaml", &cli()).unwrap();
        clear_env();

        assert_eq!(config.service.timeout_seconds, 120);
        assert!(config.chat.guard_enabled);
    }

    #[test]
    #[serial]
    fn test_cli_base_url_wins_over_env() {
        clear_env();
        std::env::set_var("DIAGCHAT_BASE_URL", "http://env.example.test");
        let mut cli = cli();
        cli.base_url = Some("http://cli.example.test".to_string());

        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        clear_env();

        assert_eq!(config.service.base_url, "http://cli.example.test");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nah"), None);
    }
}

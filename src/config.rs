use std::path::Path;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_CONFIG_PATH: &str = "taskdeck.toml";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_HEALTH_POLL_SECONDS: u64 = 60;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub health_poll_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub health_poll_seconds: u64,
}

impl Config {
    /// Load from `--config` (which must exist), falling back to
    /// `taskdeck.toml` in the working directory, falling back to defaults.
    /// CLI flags win over file values.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        let config = merge(file_config, cli);
        validate(&config)?;
        Ok(config)
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

fn validate(config: &Config) -> Result<()> {
    if config.api_url.trim().is_empty() {
        return Err(Error::ConfigValidation("api_url must not be empty".to_string()));
    }
    if config.timeout_seconds == 0 {
        return Err(Error::ConfigValidation(
            "timeout_seconds must be > 0".to_string(),
        ));
    }
    if config.health_poll_seconds == 0 {
        return Err(Error::ConfigValidation(
            "health_poll_seconds must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    Config {
        api_url: cli
            .api_url
            .clone()
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        timeout_seconds: cli
            .timeout
            .or(file.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        health_poll_seconds: file
            .health_poll_seconds
            .unwrap_or(DEFAULT_HEALTH_POLL_SECONDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
api_url = "http://tasks.local/api/v1"
timeout_seconds = 10
health_poll_seconds = 30
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://tasks.local/api/v1"));
        assert_eq!(config.timeout_seconds, Some(10));
        assert_eq!(config.health_poll_seconds, Some(30));
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(parse_config("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_parse_unknown_field_rejected() {
        let err = parse_config(r#"bogus = 1"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_defaults_applied() {
        let cli = Cli::parse_from(["taskdeck", "list"]);
        let config = merge(ConfigFile::default(), &cli);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.health_poll_seconds, DEFAULT_HEALTH_POLL_SECONDS);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = ConfigFile {
            api_url: Some("http://file.local".to_string()),
            timeout_seconds: Some(99),
            health_poll_seconds: Some(5),
        };
        let cli = Cli::parse_from([
            "taskdeck",
            "list",
            "--api-url",
            "http://cli.local",
            "--timeout",
            "7",
        ]);
        let config = merge(file, &cli);
        assert_eq!(config.api_url, "http://cli.local");
        assert_eq!(config.timeout_seconds, 7);
        assert_eq!(config.health_poll_seconds, 5); // file value kept
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = Cli::parse_from(["taskdeck", "list", "--timeout", "0"]);
        let config = merge(ConfigFile::default(), &cli);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("timeout_seconds must be > 0"));
    }

    #[test]
    fn test_zero_poll_rejected() {
        let file = ConfigFile {
            health_poll_seconds: Some(0),
            ..Default::default()
        };
        let cli = Cli::parse_from(["taskdeck", "list"]);
        let err = validate(&merge(file, &cli)).unwrap_err();
        assert!(err.to_string().contains("health_poll_seconds"));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let cli = Cli::parse_from([
            "taskdeck",
            "list",
            "--config",
            "/nonexistent/taskdeck.toml",
        ]);
        let err = Config::load(&cli).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "api_url = \"http://tasks.local\"\n").unwrap();
        let cli = Cli::parse_from([
            "taskdeck",
            "list",
            "--config",
            path.to_str().unwrap(),
        ]);
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api_url, "http://tasks.local");
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "not valid {{{{ toml").unwrap();
        let cli = Cli::parse_from([
            "taskdeck",
            "list",
            "--config",
            path.to_str().unwrap(),
        ]);
        let err = Config::load(&cli).unwrap_err();
        assert!(err.to_string().contains("config parse error"));
    }
}

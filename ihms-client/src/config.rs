use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::client::DEFAULT_TIMEOUT;

#[derive(Debug, Parser)]
#[command(
    name = "ihms-client",
    version,
    about = "Session, route-guard and request pipeline for the iHMS hospital API"
)]
pub struct Cli {
    /// Base URL of the hospital API (falls back to IHMS_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout, e.g. `10s` or `500ms`.
    #[arg(long, global = true, value_name = "DURATION")]
    pub timeout: Option<String>,

    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in, trying the admin endpoint before the user endpoint.
    Login {
        #[arg(long, short = 'u')]
        username: String,
        #[arg(long, short = 'p')]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Show whether a token is held.
    Status,
    /// Walk the given client routes through their guards.
    Navigate {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,
    },
    /// List client routes with their area and guard.
    Routes,
    /// Send an authenticated request and print the normalized body.
    Request {
        #[arg(value_name = "METHOD")]
        method: String,
        #[arg(value_name = "PATH")]
        path: String,
        /// JSON body; keys may be written in camelCase.
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub timeout: Duration,
    pub data_dir: PathBuf,
    pub remember_session: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("no API base URL configured; pass --api-url, set IHMS_API_URL or add api_url to the config file")]
    MissingApiUrl,
    #[error("invalid API base URL {value}: {reason}")]
    InvalidApiUrl { value: String, reason: String },
    #[error("invalid timeout {value}: {reason}")]
    InvalidTimeout { value: String, reason: String },
    #[error("invalid boolean value for env var {key}: {value}")]
    InvalidEnvBool { key: String, value: String },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    timeout: Option<String>,
    data_dir: Option<PathBuf>,
    remember_session: Option<bool>,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        let env_api_url = read_env_string("IHMS_API_URL")?;
        let env_remember = read_env_bool("IHMS_REMEMBER_SESSION")?;

        let raw_url = cli
            .api_url
            .clone()
            .or(env_api_url)
            .or(from_file.api_url)
            .ok_or(ConfigError::MissingApiUrl)?;
        let api_url = parse_api_url(&raw_url)?;

        let timeout = match cli.timeout.clone().or(from_file.timeout) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let data_dir = cli
            .data_dir
            .clone()
            .or(from_file.data_dir)
            .unwrap_or_else(|| PathBuf::from("./.ihms"));
        let remember_session = env_remember.or(from_file.remember_session).unwrap_or(true);

        Ok(Self {
            api_url,
            timeout,
            data_dir,
            remember_session,
        })
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingApiUrl);
    }
    let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidApiUrl {
        value: String::from(raw),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl {
            value: String::from(raw),
            reason: String::from("scheme must be http or https"),
        });
    }
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let timeout = humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidTimeout {
        value: String::from(raw),
        reason: e.to_string(),
    })?;
    if timeout.is_zero() {
        return Err(ConfigError::InvalidTimeout {
            value: String::from(raw),
            reason: String::from("must be greater than zero"),
        });
    }
    Ok(timeout)
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidApiUrl {
            value: String::from("<non-unicode>"),
            reason: format!("{key} is not valid unicode"),
        }),
    }
}

fn read_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_bool_value(key, &value).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from("<non-unicode>"),
        }),
    }
}

fn parse_bool_value(key: &str, raw: &str) -> Result<bool, ConfigError> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from(raw),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use clap::Parser;
    use tempfile::tempdir;

    use super::{
        parse_api_url, parse_bool_value, parse_timeout, read_file_config, AppConfig, Cli, Command,
        ConfigError,
    };

    #[test]
    fn parse_bool_value_accepts_common_true_values() {
        assert_eq!(parse_bool_value("K", "true").ok(), Some(true));
        assert_eq!(parse_bool_value("K", "1").ok(), Some(true));
        assert_eq!(parse_bool_value("K", "YES").ok(), Some(true));
        assert_eq!(parse_bool_value("K", " on ").ok(), Some(true));
    }

    #[test]
    fn parse_bool_value_accepts_common_false_values() {
        assert_eq!(parse_bool_value("K", "false").ok(), Some(false));
        assert_eq!(parse_bool_value("K", "0").ok(), Some(false));
        assert_eq!(parse_bool_value("K", "NO").ok(), Some(false));
        assert_eq!(parse_bool_value("K", " off ").ok(), Some(false));
    }

    #[test]
    fn parse_bool_value_rejects_invalid_values() {
        assert!(parse_bool_value("K", "maybe").is_err());
    }

    #[test]
    fn api_url_must_be_http() {
        assert!(parse_api_url("http://localhost:8000/api").is_ok());
        assert!(parse_api_url("https://hms.example.org").is_ok());
        assert!(matches!(
            parse_api_url("ftp://hms.example.org"),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            parse_api_url("not a url"),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(parse_api_url("  "), Err(ConfigError::MissingApiUrl)));
    }

    #[test]
    fn timeout_uses_humantime_and_rejects_zero() {
        assert_eq!(parse_timeout("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_timeout("250ms").unwrap(), Duration::from_millis(250));
        assert!(parse_timeout("0s").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn file_config_supplies_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ihms.toml");
        std::fs::write(
            &path,
            "api_url = \"http://localhost:8000/api\"\ntimeout = \"3s\"\nremember_session = false\n",
        )?;

        let file = read_file_config(Some(&path))?;
        assert_eq!(file.api_url.as_deref(), Some("http://localhost:8000/api"));
        assert_eq!(file.timeout.as_deref(), Some("3s"));
        assert_eq!(file.remember_session, Some(false));
        Ok(())
    }

    #[test]
    fn cli_flags_win_over_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ihms.toml");
        std::fs::write(
            &path,
            "api_url = \"http://file.local/api\"\ntimeout = \"3s\"\n",
        )?;

        let cli = Cli::try_parse_from([
            "ihms-client",
            "--api-url",
            "http://cli.local/api",
            "--config",
            path.to_str().unwrap(),
            "status",
        ])?;
        assert!(matches!(cli.command, Command::Status));

        let config = AppConfig::from_cli(&cli)?;
        assert_eq!(config.api_url.as_str(), "http://cli.local/api");
        assert_eq!(config.timeout, Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn malformed_file_is_a_parse_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ihms.toml");
        std::fs::write(&path, "api_url = [")?;
        assert!(matches!(
            read_file_config(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
        Ok(())
    }

    #[test]
    fn missing_api_url_everywhere_fails_fast() -> Result<()> {
        std::env::remove_var("IHMS_API_URL");

        let cli = Cli::try_parse_from(["ihms-client", "status"])?;
        assert!(matches!(
            AppConfig::from_cli(&cli),
            Err(ConfigError::MissingApiUrl)
        ));

        let dir = tempdir()?;
        let path = dir.path().join("ihms.toml");
        std::fs::write(&path, "timeout = \"3s\"\n")?;
        let cli = Cli::try_parse_from(["ihms-client", "-c", path.to_str().unwrap(), "status"])?;
        assert!(matches!(
            AppConfig::from_cli(&cli),
            Err(ConfigError::MissingApiUrl)
        ));
        Ok(())
    }
}

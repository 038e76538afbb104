pub mod api;
pub mod error;
pub mod logging;
pub mod tracker;
pub mod webhook;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ListenerError, Result};
use crate::tracker::JiraClient;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_CONFIG_PATH: &str = "listener_config.toml";
pub const DEFAULT_DESCRIPTION_FIELD: &str = "description";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ListenerConfig {
    pub server: ServerConfig,
    pub jira: JiraConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct JiraConfig {
    pub server: String,
    pub email: String,
    pub api_token: String,
    /// Issue field read as the ticket description. Jira instances that keep
    /// acceptance criteria in a custom field use e.g. `customfield_10034`.
    pub description_field: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            email: String::new(),
            api_token: String::new(),
            description_field: DEFAULT_DESCRIPTION_FIELD.to_string(),
        }
    }
}

// Hand-written so the API token never reaches a log line.
impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("server", &self.server)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("description_field", &self.description_field)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling log files; console-only when unset.
    pub directory: Option<PathBuf>,
    /// One of `minutely`, `hourly`, `daily`, `never`. Defaults to daily.
    pub rotation: Option<String>,
}

impl ListenerConfig {
    /// Reads the TOML config at `path`. A missing file yields the defaults so
    /// the whole configuration can come from the environment instead.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path).map_err(|e| {
            ListenerError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: ListenerConfig = toml::from_str(&config_str).map_err(|e| {
            ListenerError::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps an environment variable
    /// name to its value. Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = get("JIRA_SERVER") {
            self.jira.server = v;
        }
        if let Some(v) = get("JIRA_EMAIL") {
            self.jira.email = v;
        }
        if let Some(v) = get("JIRA_API_TOKEN") {
            self.jira.api_token = v;
        }
        if let Some(v) = get("JIRA_DESCRIPTION_FIELD") {
            self.jira.description_field = v;
        }
        if let Some(v) = get("LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(v));
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("jira.server", &self.jira.server),
            ("jira.email", &self.jira.email),
            ("jira.api_token", &self.jira.api_token),
            ("jira.description_field", &self.jira.description_field),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ListenerError::ConfigError(format!(
                    "'{}' must be set",
                    name
                )));
            }
        }

        if !(self.jira.server.starts_with("http://") || self.jira.server.starts_with("https://"))
        {
            return Err(ListenerError::ConfigError(format!(
                "'jira.server' must be an http(s) URL, got '{}'",
                self.jira.server
            )));
        }

        Ok(())
    }
}

/// Load the config file, layer environment overrides on top and validate.
pub fn load_config(path: &Path) -> Result<ListenerConfig> {
    let config = ListenerConfig::from_file(path)?.with_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

pub struct AppState {
    pub config: ListenerConfig,
    pub tracker: JiraClient,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ListenerConfig) -> Result<Self> {
        let tracker = JiraClient::from_config(&config.jira)?;
        Ok(Self {
            config,
            tracker,
            start_time: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config: ListenerConfig = toml::from_str(
            r#"
            [jira]
            server = "https://example.atlassian.net"
            email = "qa@example.com"
            api_token = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.jira.description_field, DEFAULT_DESCRIPTION_FIELD);
        assert!(config.logging.directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let config: ListenerConfig = toml::from_str(
            r#"
            [server]
            bind_address = "0.0.0.0:9000"

            [jira]
            server = "https://file.atlassian.net"
            email = "file@example.com"
            api_token = "file-token"
            "#,
        )
        .unwrap();

        let config = config.with_env_overrides(env(&[
            ("JIRA_SERVER", "https://env.atlassian.net"),
            ("JIRA_API_TOKEN", "env-token"),
            ("JIRA_DESCRIPTION_FIELD", "customfield_10034"),
            ("JIRA_EMAIL", "  "),
            ("LOG_DIR", "/var/log/listener"),
        ]));

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.jira.server, "https://env.atlassian.net");
        assert_eq!(config.jira.email, "file@example.com");
        assert_eq!(config.jira.api_token, "env-token");
        assert_eq!(config.jira.description_field, "customfield_10034");
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/var/log/listener"))
        );
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let config = ListenerConfig::default().with_env_overrides(env(&[(
            "JIRA_SERVER",
            "https://example.atlassian.net",
        )]));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jira.email"));
    }

    #[test]
    fn non_http_server_fails_validation() {
        let config = ListenerConfig::default().with_env_overrides(env(&[
            ("JIRA_SERVER", "example.atlassian.net"),
            ("JIRA_EMAIL", "qa@example.com"),
            ("JIRA_API_TOKEN", "secret"),
        ]));

        assert!(matches!(
            config.validate(),
            Err(ListenerError::ConfigError(_))
        ));
    }

    #[test]
    fn unparsable_config_file_is_config_error() {
        let path = std::env::temp_dir().join(format!(
            "qa_listener_bad_config_{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[jira\nserver = ").unwrap();

        let result = ListenerConfig::from_file(&path);
        fs::remove_file(&path).ok();

        match result {
            Err(ListenerError::ConfigError(msg)) => {
                assert!(msg.contains("Failed to parse config file"));
                assert!(msg.contains("qa_listener_bad_config_"));
            }
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = ListenerConfig::from_file(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
        assert!(config.jira.server.is_empty());
    }

    #[test]
    fn debug_output_redacts_api_token() {
        let mut config = JiraConfig::default();
        config.api_token = "super-secret".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

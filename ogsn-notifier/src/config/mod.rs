//! Configuration module for ogsn-notifier.
//!
//! Handles loading configuration from the TOML file and CLI overrides, and
//! turns it into the validated runtime types of `ogsn-core`.

pub mod file;

use crate::config::file::{ConnectionSection, FileConfig, NotifierSection, StatusSection};
use ogsn_core::config::{ConnectionConfig, FilterSettings, KeepaliveConfig, PollConfig};
use ogsn_core::connection::BackoffPolicy;
use ogsn_sdk::client::DEFAULT_BASE_URL;
use ogsn_sdk::objects::GameList;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub connection: ConnectionConfig,
    pub keepalive: KeepaliveConfig,
    pub poll: PollConfig,
    pub filter: FilterSettings,
    pub notifier: NotifierSection,
    pub status: StatusSection,
}

/// CLI values applied over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub list: Option<GameList>,
    pub endpoint: Option<Url>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// A missing file is treated as empty, so every default applies.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = ?self.config_path, "Config file not found, using defaults");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(list) = self.overrides.list {
            file_config.poll.list = list;
        }
        if let Some(endpoint) = &self.overrides.endpoint {
            file_config.connection.endpoint = Some(endpoint.clone());
        }

        self.validate(&file_config)?;
        self.build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let filter = &config.filter;
        if filter.board_size <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "filter.board_size must be positive, got {}",
                filter.board_size
            )));
        }
        if !filter.min_median_rating.is_finite() {
            return Err(ConfigError::ValidationError(
                "filter.min_median_rating must be finite".to_string(),
            ));
        }
        let factor = config.connection.backoff_factor;
        if factor.is_nan() || factor < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "connection.backoff_factor must be at least 1, got {factor}"
            )));
        }
        if config.poll.limit <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "poll.limit must be positive, got {}",
                config.poll.limit
            )));
        }
        let endpoint = endpoint(&config.connection)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "connection.endpoint must be http(s), got {endpoint}"
            )));
        }
        Ok(())
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let FileConfig {
            connection,
            keepalive,
            poll,
            filter,
            notifier,
            status,
        } = file_config;

        let backoff = BackoffPolicy {
            initial: secs("connection.backoff_initial_secs", connection.backoff_initial_secs)?,
            factor: connection.backoff_factor,
            max: secs("connection.backoff_max_secs", connection.backoff_max_secs)?,
        };
        let handshake_timeout = secs(
            "connection.handshake_timeout_secs",
            connection.handshake_timeout_secs,
        )?;

        let mut connection_config = ConnectionConfig::new(endpoint(&connection)?);
        connection_config.protocol = connection.protocol;
        connection_config.handshake_timeout = handshake_timeout;
        connection_config.backoff = backoff;

        Ok(LoadedConfig {
            connection: connection_config,
            keepalive: KeepaliveConfig {
                interval: secs("keepalive.interval_secs", keepalive.interval_secs)?,
            },
            poll: PollConfig {
                interval: secs("poll.interval_secs", poll.interval_secs)?,
                request_timeout: secs("poll.request_timeout_secs", poll.request_timeout_secs)?,
                list: poll.list,
                sort_by: poll.sort_by,
                from: poll.from,
                limit: poll.limit,
                max_entries: poll.max_entries,
            },
            filter,
            notifier,
            status,
        })
    }
}

/// The configured server base URL, or the public server.
fn endpoint(section: &ConnectionSection) -> Result<Url, ConfigError> {
    match &section.endpoint {
        Some(url) => Ok(url.clone()),
        None => Url::parse(DEFAULT_BASE_URL).map_err(|e| {
            ConfigError::ValidationError(format!("invalid default endpoint: {e}"))
        }),
    }
}

/// A strictly positive duration in seconds.
fn secs(field: &str, value: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(value) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(ConfigError::ValidationError(format!(
            "{field} must be a positive number of seconds, got {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ogsn-{}-{name}.toml", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let loader = ConfigLoader::new("/nonexistent/ogsn-config.toml", Overrides::default());
        let loaded = loader.load().unwrap();
        assert_eq!(loaded.connection.endpoint.as_str(), "https://online-go.com/");
        assert_eq!(loaded.poll.interval, Duration::from_secs(30));
        assert_eq!(loaded.keepalive.interval, Duration::from_secs(25));
        assert_eq!(loaded.connection.backoff, BackoffPolicy::default());
        assert_eq!(loaded.filter, FilterSettings::default());
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let path = write_config(
            "overrides",
            "[poll]\nlist = \"live\"\n[connection]\nendpoint = \"https://online-go.com\"\n",
        );
        let loader = ConfigLoader::new(
            &path,
            Overrides {
                list: Some(GameList::Correspondence),
                endpoint: Some("http://127.0.0.1:8080".parse().unwrap()),
            },
        );
        let loaded = loader.load().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.poll.list, GameList::Correspondence);
        assert_eq!(
            loaded.connection.socket_url().as_str(),
            "ws://127.0.0.1:8080/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_validation_errors() {
        for (name, content) in [
            ("board", "[filter]\nboard_size = 0\n"),
            ("factor", "[connection]\nbackoff_factor = 0.5\n"),
            ("interval", "[poll]\ninterval_secs = 0\n"),
            ("negative", "[keepalive]\ninterval_secs = -1\n"),
            ("scheme", "[connection]\nendpoint = \"ftp://online-go.com\"\n"),
        ] {
            let path = write_config(name, content);
            let result = ConfigLoader::new(&path, Overrides::default()).load();
            std::fs::remove_file(&path).unwrap();
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "{name} should fail validation"
            );
        }
    }

    #[test]
    fn test_parse_error() {
        let path = write_config("parse", "[poll\n");
        let result = ConfigLoader::new(&path, Overrides::default()).load();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}

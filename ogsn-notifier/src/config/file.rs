//! TOML file configuration structures.
//!
//! These structs directly map to the `ogsn-config.toml` file format. Every
//! section and field has a default, so an empty file is a valid config.
//! Durations are given in seconds.

use ogsn_core::config::FilterSettings;
use ogsn_sdk::codec::ProtocolVersion;
use ogsn_sdk::objects::GameList;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub connection: ConnectionSection,
    pub keepalive: KeepaliveSection,
    pub poll: PollSection,
    pub filter: FilterSettings,
    pub notifier: NotifierSection,
    pub status: StatusSection,
}

/// `[connection]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Server base URL; the public server when unset.
    pub endpoint: Option<Url>,
    pub protocol: ProtocolVersion,
    pub handshake_timeout_secs: f64,
    pub backoff_initial_secs: f64,
    pub backoff_factor: f64,
    pub backoff_max_secs: f64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            protocol: ProtocolVersion::default(),
            handshake_timeout_secs: 10.0,
            backoff_initial_secs: 1.0,
            backoff_factor: 1.5,
            backoff_max_secs: 30.0,
        }
    }
}

/// `[keepalive]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveSection {
    pub interval_secs: f64,
}

impl Default for KeepaliveSection {
    fn default() -> Self {
        Self {
            interval_secs: 25.0,
        }
    }
}

/// `[poll]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSection {
    pub interval_secs: f64,
    pub request_timeout_secs: f64,
    pub list: GameList,
    pub sort_by: String,
    pub from: i32,
    pub limit: i32,
    /// Largest snapshot accepted; unset means unbounded.
    pub max_entries: Option<usize>,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_secs: 30.0,
            request_timeout_secs: 10.0,
            list: GameList::Live,
            sort_by: "rank".to_string(),
            from: 0,
            limit: 300,
            max_entries: None,
        }
    }
}

/// Desktop notification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifierBackend {
    /// `notify-send` on Linux, `osascript` on macOS.
    #[default]
    Command,
    /// Only write notifications to the log.
    Log,
}

/// `[notifier]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSection {
    pub backend: NotifierBackend,
    pub icon: Option<PathBuf>,
}

/// `[status]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSection {
    /// Address for the status API. Disabled when unset.
    pub listen: Option<SocketAddr>,
}

//! Socket connection configuration.

use std::time::Duration;

use ogsn_sdk::codec::ProtocolVersion;
use url::Url;

use crate::connection::BackoffPolicy;

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server base URL; the socket path is derived from it.
    pub endpoint: Url,
    pub protocol: ProtocolVersion,
    /// Upper bound on dial-to-namespace-connected.
    pub handshake_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl ConnectionConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            protocol: ProtocolVersion::default(),
            handshake_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }

    /// The WebSocket URL that gets dialed.
    pub fn socket_url(&self) -> Url {
        self.protocol.socket_url(&self.endpoint)
    }
}

/// Heartbeat period.
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveConfig {
    pub interval: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(25),
        }
    }
}

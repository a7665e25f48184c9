//! Heartbeat messages used for clock synchronisation.

use serde::{Deserialize, Serialize};

/// Outbound heartbeat event name.
pub const PING_EVENT: &str = "net/ping";
/// Inbound heartbeat reply event name.
pub const PONG_EVENT: &str = "net/pong";

/// `net/ping` payload.
///
/// `client` is epoch milliseconds; `drift` and `latency` are the last
/// known estimates in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PingRequest {
    pub client: i64,
    pub drift: f64,
    pub latency: f64,
}

/// `net/pong` payload: the echoed client timestamp and the server's clock,
/// both in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PongResponse {
    pub client: i64,
    pub server: i64,
}

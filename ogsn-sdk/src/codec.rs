//! Socket framing for the realtime API.
//!
//! The server speaks Socket.IO over Engine.IO over a WebSocket. Every text
//! frame is one Engine.IO packet; `message` packets carry one Socket.IO
//! packet:
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,"pingTimeout":20000}   open
//! 2 / 3                                                    ping / pong
//! 40                                                       namespace connect
//! 42["net/ping",{"client":1000,"drift":0,"latency":0}]     event
//! 4217["gamelist/query",{...}]                             event expecting ack 17
//! 4317[{...}]                                              ack 17
//! ```
//!
//! Binary attachments are not used by this API and are rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Frame asking the default namespace to connect.
pub const CONNECT_FRAME: &str = "40";
/// Engine.IO ping frame.
pub const PING_FRAME: &str = "2";
/// Engine.IO pong frame.
pub const PONG_FRAME: &str = "3";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("empty frame")]
    Empty,
    #[error("unknown engine packet type {0:?}")]
    UnknownEnginePacket(char),
    #[error("unknown socket packet type {0:?}")]
    UnknownSocketPacket(char),
    #[error("binary socket packets are not supported")]
    BinaryUnsupported,
    #[error("event packet without a name")]
    MissingEventName,
    #[error("ack packet without an id")]
    MissingAckId,
    #[error("ack packet without arguments")]
    EmptyAck,
    #[error("invalid ack id: {0}")]
    InvalidAckId(#[from] std::num::ParseIntError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine.IO protocol revision.
///
/// Revision 4 servers send pings and expect pongs; with revision 3 the
/// client is the one that pings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[serde(rename = "3")]
    V3,
    #[default]
    #[serde(rename = "4")]
    V4,
}

impl ProtocolVersion {
    pub fn eio(self) -> &'static str {
        match self {
            ProtocolVersion::V3 => "3",
            ProtocolVersion::V4 => "4",
        }
    }

    /// Whether the client is responsible for sending transport pings.
    pub fn client_pings(self) -> bool {
        matches!(self, ProtocolVersion::V3)
    }

    /// Whether the client must request the namespace connect itself.
    pub fn client_connects(self) -> bool {
        matches!(self, ProtocolVersion::V4)
    }

    /// Build the WebSocket transport URL for a server base URL.
    ///
    /// `https://online-go.com` becomes
    /// `wss://online-go.com/socket.io/?EIO=4&transport=websocket`.
    pub fn socket_url(self, base: &Url) -> Url {
        let mut url = base.clone();
        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            _ => "wss",
        };
        // Only fails for cannot-be-a-base URLs, which never reach here
        // with a scheme that http(s) accepted.
        let _ = url.set_scheme(scheme);
        url.set_path("/socket.io/");
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", self.eio())
            .append_pair("transport", "websocket");
        url
    }
}

/// Payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// One decoded Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// One decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    /// An event. `args` excludes the event name.
    Event {
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    /// A reply to an acknowledged event. `args` is the raw JSON array,
    /// left undecoded so the requester can report its size on failure.
    Ack { id: u64, args: String },
    ConnectError(String),
}

/// Decode one text frame.
pub fn decode(frame: &str) -> Result<EnginePacket, CodecError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_string())),
        '3' => Ok(EnginePacket::Pong(rest.to_string())),
        '4' => decode_socket(rest).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(CodecError::UnknownEnginePacket(other)),
    }
}

fn decode_socket(packet: &str) -> Result<SocketPacket, CodecError> {
    let mut chars = packet.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let rest = strip_namespace(chars.as_str());

    let id_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let id = if id_end > 0 {
        Some(rest[..id_end].parse::<u64>()?)
    } else {
        None
    };
    let body = &rest[id_end..];

    match kind {
        '0' => Ok(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let mut args: Vec<Value> = serde_json::from_str(body)?;
            let name = match args.first() {
                Some(Value::String(name)) => name.clone(),
                _ => return Err(CodecError::MissingEventName),
            };
            args.remove(0);
            Ok(SocketPacket::Event { id, name, args })
        }
        '3' => Ok(SocketPacket::Ack {
            id: id.ok_or(CodecError::MissingAckId)?,
            args: body.to_string(),
        }),
        '4' => Ok(SocketPacket::ConnectError(body.to_string())),
        '5' | '6' => Err(CodecError::BinaryUnsupported),
        other => Err(CodecError::UnknownSocketPacket(other)),
    }
}

/// Drop a leading `/namespace,` if present.
fn strip_namespace(packet: &str) -> &str {
    if !packet.starts_with('/') {
        return packet;
    }
    match packet.find(',') {
        Some(comma) => &packet[comma + 1..],
        None => "",
    }
}

/// Encode a fire-and-forget event.
pub fn encode_event<T: Serialize>(name: &str, payload: &T) -> Result<String, CodecError> {
    let body = serde_json::to_string(&(name, payload))?;
    Ok(format!("42{body}"))
}

/// Encode an event that the server must acknowledge with `id`.
pub fn encode_ack_request<T: Serialize>(
    id: u64,
    name: &str,
    payload: &T,
) -> Result<String, CodecError> {
    let body = serde_json::to_string(&(name, payload))?;
    Ok(format!("42{id}{body}"))
}

/// Decode the first argument of an ack reply.
pub fn decode_ack_args<T: DeserializeOwned>(args: &str) -> Result<T, CodecError> {
    let mut values: Vec<Value> = serde_json::from_str(args)?;
    if values.is_empty() {
        return Err(CodecError::EmptyAck);
    }
    Ok(serde_json::from_value(values.swap_remove(0))?)
}

/// Decode the first argument of an event.
pub fn decode_event_arg<T: DeserializeOwned>(args: &[Value]) -> Result<T, CodecError> {
    let first = args.first().cloned().ok_or(CodecError::EmptyAck)?;
    Ok(serde_json::from_value(first)?)
}

//! In-memory dialer and server used by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ogsn_sdk::codec::{self, CONNECT_FRAME, EnginePacket, SocketPacket};
use ogsn_sdk::objects::{PING_EVENT, PingRequest};
use tokio::sync::mpsc;
use url::Url;

use super::{Channel, ConnectionError, Dialer, TransportFrame};
use crate::config::ConnectionConfig;

const OPEN: &str = r#"0{"sid":"fake","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

/// What the next dial does.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Refuse,
    Serve(Reply),
    /// Complete the handshake, then close the link.
    ServeThenDrop,
}

/// How the fake server answers acknowledged requests.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Reply with this JSON array as `results`.
    Games(String),
    Ignore,
    Malformed,
    HangUp,
}

struct Inner {
    steps: Mutex<VecDeque<Step>>,
    dials: AtomicUsize,
    frames: Arc<Mutex<Vec<String>>>,
}

/// Plays one [`Step`] per dial; refuses once the script runs out.
#[derive(Clone)]
pub(crate) struct ScriptedDialer {
    inner: Arc<Inner>,
}

impl ScriptedDialer {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            inner: Arc::new(Inner {
                steps: Mutex::new(steps.into_iter().collect()),
                dials: AtomicUsize::new(0),
                frames: Arc::new(Mutex::new(Vec::new())),
            }),
        }
    }

    pub(crate) fn dials(&self) -> usize {
        self.inner.dials.load(Ordering::SeqCst)
    }

    /// Every frame the servers received, in order.
    pub(crate) fn frames(&self) -> Vec<String> {
        self.inner.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, _url: &Url) -> Result<Channel, ConnectionError> {
        self.inner.dials.fetch_add(1, Ordering::SeqCst);
        let step = self
            .inner
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Refuse);
        let (channel, from_client, to_client) = Channel::pair();
        let frames = Arc::clone(&self.inner.frames);
        match step {
            Step::Refuse => return Err(ConnectionError::Connect("refused".to_string())),
            Step::Serve(reply) => {
                tokio::spawn(serve(reply, false, frames, from_client, to_client));
            }
            Step::ServeThenDrop => {
                tokio::spawn(serve(Reply::Ignore, true, frames, from_client, to_client));
            }
        }
        Ok(channel)
    }
}

pub(crate) fn test_config() -> ConnectionConfig {
    ConnectionConfig::new("http://127.0.0.1:9".parse().unwrap())
}

async fn serve(
    reply: Reply,
    drop_after_handshake: bool,
    frames: Arc<Mutex<Vec<String>>>,
    mut from_client: mpsc::Receiver<String>,
    to_client: mpsc::Sender<TransportFrame>,
) {
    let send = |text: String| {
        let to_client = to_client.clone();
        async move {
            let _ = to_client.send(TransportFrame::Text(text)).await;
        }
    };

    send(OPEN.to_string()).await;
    while let Some(frame) = from_client.recv().await {
        frames.lock().unwrap().push(frame.clone());
        if frame == CONNECT_FRAME {
            send("40".to_string()).await;
            break;
        }
    }
    if drop_after_handshake {
        let _ = to_client.send(TransportFrame::Closed).await;
        return;
    }

    while let Some(frame) = from_client.recv().await {
        frames.lock().unwrap().push(frame.clone());
        let Ok(EnginePacket::Message(SocketPacket::Event { id, name, args })) =
            codec::decode(&frame)
        else {
            continue;
        };
        if name == PING_EVENT {
            if let Ok(ping) = codec::decode_event_arg::<PingRequest>(&args) {
                send(format!(
                    r#"42["net/pong",{{"client":{},"server":{}}}]"#,
                    ping.client, ping.client
                ))
                .await;
            }
            continue;
        }
        let Some(id) = id else { continue };
        match &reply {
            Reply::Games(results) => {
                send(format!(
                    r#"43{id}[{{"list":"live","by":"rank","size":0,"where":{{}},"from":0,"limit":300,"results":{results}}}]"#
                ))
                .await
            }
            Reply::Ignore => {}
            Reply::Malformed => send(format!(r#"43{id}[{{"results":"not a list"}}]"#)).await,
            Reply::HangUp => {
                let _ = to_client.send(TransportFrame::Closed).await;
                return;
            }
        }
    }
}

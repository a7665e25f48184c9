//! Inbound event routing.
//!
//! Each live link has one receive loop. It answers transport pings, hands
//! ack replies to [`PendingReplies`], and routes named events through a
//! fixed table. When the link ends, the loop reports it once, tagged with
//! the link's generation so a superseded link can never disturb a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ogsn_sdk::codec::{self, EnginePacket, PONG_FRAME, SocketPacket};
use ogsn_sdk::objects::{PONG_EVENT, PongResponse};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::ConnectionState;
use super::pending::PendingReplies;
use super::transport::TransportFrame;
use crate::keepalive::ClockState;
use crate::utils::epoch::now_millis;

/// What a routed event means for the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Connect,
    Disconnect,
    Error,
    Pong,
}

const ROUTES: [(&str, Route); 4] = [
    ("connect", Route::Connect),
    ("disconnect", Route::Disconnect),
    ("error", Route::Error),
    (PONG_EVENT, Route::Pong),
];

/// Look up the route for an event name.
pub fn route(name: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(event, _)| *event == name)
        .map(|(_, route)| *route)
}

/// Notice that the link of `generation` is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLost {
    pub generation: u64,
    pub reason: String,
}

enum Flow {
    Continue,
    Lost { reason: String, errored: bool },
}

/// State shared between the manager and its receive loops.
pub(crate) struct Dispatcher {
    pub(crate) pending: PendingReplies,
    pub(crate) clock_tx: watch::Sender<ClockState>,
    pub(crate) state_tx: watch::Sender<ConnectionState>,
    live_generation: AtomicU64,
    lost_tx: mpsc::UnboundedSender<LinkLost>,
}

impl Dispatcher {
    pub(crate) fn new(lost_tx: mpsc::UnboundedSender<LinkLost>) -> Self {
        let (clock_tx, _) = watch::channel(ClockState::default());
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            pending: PendingReplies::default(),
            clock_tx,
            state_tx,
            live_generation: AtomicU64::new(0),
            lost_tx,
        }
    }

    pub(crate) fn live_generation(&self) -> u64 {
        self.live_generation.load(Ordering::SeqCst)
    }

    pub(crate) fn set_live(&self, generation: u64) {
        self.live_generation.store(generation, Ordering::SeqCst);
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "connection state changed");
        }
    }

    fn dispatch(&self, name: &str, args: &[Value]) -> Flow {
        match route(name) {
            Some(Route::Connect) => {
                debug!("namespace connected");
                Flow::Continue
            }
            Some(Route::Disconnect) => Flow::Lost {
                reason: "disconnected".to_string(),
                errored: false,
            },
            Some(Route::Error) => Flow::Lost {
                reason: args
                    .first()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "transport error".to_string()),
                errored: true,
            },
            Some(Route::Pong) => {
                match codec::decode_event_arg::<PongResponse>(args) {
                    Ok(pong) => self.on_pong(&pong),
                    Err(e) => warn!(error = %e, "malformed pong"),
                }
                Flow::Continue
            }
            None => {
                debug!(event = name, "dropping unrouted event");
                Flow::Continue
            }
        }
    }

    fn on_pong(&self, pong: &PongResponse) {
        let clock = ClockState::from_pong(pong, now_millis());
        self.clock_tx.send_replace(clock);
        debug!(
            drift = clock.drift,
            latency = clock.latency,
            "clock synchronised"
        );
    }

    async fn link_lost(&self, generation: u64, reason: String, errored: bool) {
        if generation != self.live_generation() {
            debug!(generation, "ignoring end of superseded link");
            return;
        }
        let failed = self.pending.fail_all().await;
        self.set_state(if errored {
            ConnectionState::Errored
        } else {
            ConnectionState::Disconnected
        });
        warn!(generation, reason = %reason, failed_requests = failed, "link lost");
        let _ = self.lost_tx.send(LinkLost { generation, reason });
    }
}

/// Drive one link until it ends.
pub(crate) async fn receive_loop(
    dispatcher: Arc<Dispatcher>,
    generation: u64,
    mut inbound: mpsc::Receiver<TransportFrame>,
    outbound: mpsc::Sender<String>,
) {
    let (reason, errored) = loop {
        let Some(frame) = inbound.recv().await else {
            break ("transport ended".to_string(), false);
        };
        let flow = match frame {
            TransportFrame::Text(text) => match codec::decode(&text) {
                Ok(packet) => handle_packet(&dispatcher, &outbound, packet).await,
                Err(e) => {
                    warn!(error = %e, size = text.len(), "dropping undecodable frame");
                    Flow::Continue
                }
            },
            TransportFrame::Closed => dispatcher.dispatch("disconnect", &[]),
            TransportFrame::Error(e) => dispatcher.dispatch("error", &[Value::String(e)]),
        };
        if let Flow::Lost { reason, errored } = flow {
            break (reason, errored);
        }
    };
    dispatcher.link_lost(generation, reason, errored).await;
}

async fn handle_packet(
    dispatcher: &Dispatcher,
    outbound: &mpsc::Sender<String>,
    packet: EnginePacket,
) -> Flow {
    match packet {
        EnginePacket::Ping(payload) => {
            if outbound.send(format!("{PONG_FRAME}{payload}")).await.is_err() {
                debug!("could not answer transport ping");
            }
            Flow::Continue
        }
        EnginePacket::Message(SocketPacket::Ack { id, args }) => {
            if !dispatcher.pending.resolve(id, args).await {
                debug!(ack_id = id, "ack for unknown or expired request");
            }
            Flow::Continue
        }
        EnginePacket::Message(SocketPacket::Event { name, args, .. }) => {
            dispatcher.dispatch(&name, &args)
        }
        EnginePacket::Message(SocketPacket::Connect) => dispatcher.dispatch("connect", &[]),
        EnginePacket::Message(SocketPacket::Disconnect) | EnginePacket::Close => {
            dispatcher.dispatch("disconnect", &[])
        }
        EnginePacket::Message(SocketPacket::ConnectError(reason)) => {
            dispatcher.dispatch("error", &[Value::String(reason)])
        }
        EnginePacket::Open(_) | EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {
            Flow::Continue
        }
    }
}

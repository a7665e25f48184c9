//! Connection Manager.
//!
//! Owns the single logical socket link. The link sits in a slot behind a
//! `tokio::sync::RwLock`: requests and heartbeats hold a read guard for the
//! duration of their call, `reconnect()` holds the write guard for the whole
//! backoff loop. Callers therefore see either a fully established link or a
//! defined [`ConnectionError`], never a half-torn-down one.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnected | Errored
//!                                   ^                 |
//!                                   +- Reconnecting <-+      Closed (terminal)
//! ```
//!
//! A receive loop per link routes inbound events (see [`dispatch`]) and, when
//! the link ends, posts a [`LinkLost`] notice that the [`Supervisor`] turns
//! into a `reconnect()`.

mod backoff;
pub mod dispatch;
mod error;
mod handshake;
mod pending;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use backoff::{Backoff, BackoffPolicy};
pub use dispatch::LinkLost;
pub use error::ConnectionError;
pub use transport::{Channel, Dialer, TransportFrame, WsDialer};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ogsn_sdk::codec::ProtocolVersion;
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::keepalive::ClockState;
use dispatch::Dispatcher;
use pending::PendingReplies;

/// Lifecycle of the logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Errored,
    Reconnecting,
    Closed,
}

struct Link {
    generation: u64,
    outbound: mpsc::Sender<String>,
    reader: JoinHandle<()>,
}

impl Link {
    /// Stop the receive loop; dropping `outbound` closes the transport.
    fn shutdown(self) {
        self.reader.abort();
    }
}

enum Slot {
    Idle,
    Live(Link),
    Aborted,
    Closed,
}

impl Slot {
    fn unavailable(&self) -> ConnectionError {
        match self {
            Slot::Aborted => ConnectionError::ReconnectAborted,
            Slot::Closed => ConnectionError::Closed,
            Slot::Idle | Slot::Live(_) => ConnectionError::NotConnected,
        }
    }
}

/// Borrowed view of the live link. Holding it blocks `reconnect()`.
pub struct LinkHandle<'a> {
    link: RwLockReadGuard<'a, Link>,
}

impl LinkHandle<'_> {
    pub fn generation(&self) -> u64 {
        self.link.generation
    }

    pub async fn send(&self, frame: String) -> Result<(), ConnectionError> {
        self.link
            .outbound
            .send(frame)
            .await
            .map_err(|_| ConnectionError::Send)
    }
}

struct Shared<D> {
    dialer: D,
    config: ConnectionConfig,
    slot: RwLock<Slot>,
    stop_tx: watch::Sender<bool>,
    generation: AtomicU64,
    dispatcher: Arc<Dispatcher>,
}

/// Cloneable handle to the connection.
pub struct ConnectionManager<D> {
    inner: Arc<Shared<D>>,
}

impl<D> Clone for ConnectionManager<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Dialer> ConnectionManager<D> {
    /// Create a manager and the supervisor that keeps it connected.
    ///
    /// Nothing is dialed until [`open`](Self::open).
    pub fn new(dialer: D, config: ConnectionConfig) -> (Self, Supervisor<D>) {
        let (lost_tx, lost_rx) = mpsc::unbounded_channel();
        let (stop_tx, _) = watch::channel(false);
        let manager = Self {
            inner: Arc::new(Shared {
                dialer,
                config,
                slot: RwLock::new(Slot::Idle),
                stop_tx,
                generation: AtomicU64::new(0),
                dispatcher: Arc::new(Dispatcher::new(lost_tx)),
            }),
        };
        let supervisor = Supervisor {
            manager: manager.clone(),
            lost_rx,
        };
        (manager, supervisor)
    }

    /// Dial once. Failure is returned as is; there is no retry here.
    pub async fn open(&self) -> Result<(), ConnectionError> {
        let mut slot = self.inner.slot.write().await;
        match &*slot {
            Slot::Live(_) => return Ok(()),
            Slot::Idle => {}
            other => return Err(other.unavailable()),
        }

        self.inner.dispatcher.set_state(ConnectionState::Connecting);
        match self.establish().await {
            Ok(link) => {
                *slot = Slot::Live(link);
                self.inner.dispatcher.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.inner.dispatcher.set_state(ConnectionState::Errored);
                Err(e)
            }
        }
    }

    /// Replace the link, retrying with backoff until a dial succeeds or
    /// [`close`](Self::close) is called.
    ///
    /// Holds the write guard throughout, so no request runs meanwhile.
    pub async fn reconnect(&self) -> Result<(), ConnectionError> {
        let mut stop_rx = self.inner.stop_tx.subscribe();
        let mut slot = self.inner.slot.write().await;
        if *stop_rx.borrow_and_update() || matches!(*slot, Slot::Closed | Slot::Aborted) {
            return Err(ConnectionError::ReconnectAborted);
        }
        if let Slot::Live(old) = std::mem::replace(&mut *slot, Slot::Idle) {
            old.shutdown();
        }

        self.inner
            .dispatcher
            .set_state(ConnectionState::Reconnecting);
        let mut delays = self.inner.config.backoff.schedule();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = stop_rx.changed() => None,
                result = self.establish() => Some(result),
            };
            let error = match result {
                None => break,
                Some(Ok(link)) => {
                    info!(attempt, generation = link.generation, "reconnected");
                    *slot = Slot::Live(link);
                    self.inner.dispatcher.set_state(ConnectionState::Connected);
                    return Ok(());
                }
                Some(Err(e)) => e,
            };

            let delay = delays.next().unwrap_or(self.inner.config.backoff.max);
            warn!(attempt, error = %error, retry_in = ?delay, "reconnect attempt failed");
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(attempt, "reconnect aborted by shutdown");
        *slot = Slot::Aborted;
        self.inner.dispatcher.set_state(ConnectionState::Closed);
        Err(ConnectionError::ReconnectAborted)
    }

    /// Signal shutdown, abort any reconnect in progress and drop the link.
    /// Idempotent.
    pub async fn close(&self) {
        self.inner.stop_tx.send_replace(true);
        let mut slot = self.inner.slot.write().await;
        match std::mem::replace(&mut *slot, Slot::Closed) {
            Slot::Live(link) => {
                debug!(generation = link.generation, "closing link");
                link.shutdown();
            }
            Slot::Aborted => *slot = Slot::Aborted,
            Slot::Idle | Slot::Closed => {}
        }
        drop(slot);
        self.inner.dispatcher.pending.fail_all().await;
        self.inner.dispatcher.set_state(ConnectionState::Closed);
    }

    /// Borrow the live link, waiting out any reconnect in progress.
    pub async fn link(&self) -> Result<LinkHandle<'_>, ConnectionError> {
        let guard = self.inner.slot.read().await;
        RwLockReadGuard::try_map(guard, |slot| match slot {
            Slot::Live(link) => Some(link),
            _ => None,
        })
        .map(|link| LinkHandle { link })
        .map_err(|slot| slot.unavailable())
    }

    pub(crate) fn pending(&self) -> &PendingReplies {
        &self.inner.dispatcher.pending
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.inner.config.protocol
    }

    /// Latest clock estimate.
    pub fn clock(&self) -> ClockState {
        *self.inner.dispatcher.clock_tx.borrow()
    }

    pub fn watch_clock(&self) -> watch::Receiver<ClockState> {
        self.inner.dispatcher.clock_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.dispatcher.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.dispatcher.state_tx.subscribe()
    }

    /// Generation of the most recently established link (0 before any).
    pub fn live_generation(&self) -> u64 {
        self.inner.dispatcher.live_generation()
    }

    async fn establish(&self) -> Result<Link, ConnectionError> {
        let config = &self.inner.config;
        let url = config.socket_url();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%url, generation, "dialing");

        let mut channel = self.inner.dialer.dial(&url).await?;
        let open = tokio::time::timeout(
            config.handshake_timeout,
            handshake::handshake(&mut channel, config.protocol),
        )
        .await
        .map_err(|_| ConnectionError::Handshake("timed out".to_string()))??;
        info!(sid = %open.sid, generation, "connected");

        self.inner.dispatcher.set_live(generation);
        let Channel { outbound, inbound } = channel;
        let reader = tokio::spawn(dispatch::receive_loop(
            Arc::clone(&self.inner.dispatcher),
            generation,
            inbound,
            outbound.clone(),
        ));
        Ok(Link {
            generation,
            outbound,
            reader,
        })
    }
}

// -- Supervisor ---------------------------------------------------------

/// Turns link-lost notices into reconnects.
pub struct Supervisor<D> {
    manager: ConnectionManager<D>,
    lost_rx: mpsc::UnboundedReceiver<LinkLost>,
}

impl<D: Dialer> Supervisor<D> {
    /// Run until shutdown or until reconnecting becomes impossible.
    ///
    /// Shutdown closes the manager, which aborts a reconnect in progress.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), ConnectionError> {
        info!("Connection supervisor started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Connection supervisor received shutdown signal");
                        break;
                    }
                }

                Some(notice) = self.lost_rx.recv() => {
                    if notice.generation != self.manager.live_generation() {
                        debug!(generation = notice.generation, "stale link-lost notice");
                        continue;
                    }
                    info!(generation = notice.generation, reason = %notice.reason, "Reconnecting");

                    let result = tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => None,
                        result = self.manager.reconnect() => Some(result),
                    };
                    match result {
                        None => {
                            info!("Shutdown during reconnect");
                            break;
                        }
                        Some(Ok(())) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Connection supervisor stopping");
                            return Err(e);
                        }
                    }
                }

                else => break,
            }
        }

        self.manager.close().await;
        info!("Connection supervisor shutdown complete");
        Ok(())
    }
}

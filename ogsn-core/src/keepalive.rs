//! Keepalive / clock sync.
//!
//! Every tick sends `net/ping` with the local epoch-millisecond clock and the
//! last drift/latency estimate. The server echoes the client timestamp with
//! its own clock in `net/pong`; the receive loop feeds that to
//! [`ClockState::from_pong`]. Heartbeats are fire-and-forget: a failed send
//! is logged and the timer keeps going.

use std::time::Duration;

use ogsn_sdk::codec::{self, PING_FRAME};
use ogsn_sdk::objects::{PING_EVENT, PingRequest, PongResponse};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::KeepaliveConfig;
use crate::connection::{ConnectionError, ConnectionManager, Dialer};
use crate::utils::epoch::now_millis;

/// Clock estimates in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ClockState {
    /// Local clock minus server clock, corrected for half the round trip.
    pub drift: f64,
    /// Round trip of the last heartbeat.
    pub latency: f64,
}

impl ClockState {
    /// Derive new estimates from a pong received at `now_ms`.
    pub fn from_pong(pong: &PongResponse, now_ms: i64) -> Self {
        let latency_ms = now_ms - pong.client;
        let drift_ms = (now_ms - latency_ms / 2) - pong.server;
        Self {
            drift: drift_ms as f64 / 1000.0,
            latency: latency_ms as f64 / 1000.0,
        }
    }
}

pub struct Keepalive<D> {
    manager: ConnectionManager<D>,
    interval: Duration,
}

impl<D: Dialer> Keepalive<D> {
    pub fn new(manager: ConnectionManager<D>, config: KeepaliveConfig) -> Self {
        Self {
            manager,
            interval: config.interval,
        }
    }

    /// Send one heartbeat on the current link.
    pub async fn beat(&self) -> Result<(), ConnectionError> {
        let link = self.manager.link().await?;
        let clock = self.manager.clock();
        let ping = PingRequest {
            client: now_millis(),
            drift: clock.drift,
            latency: clock.latency,
        };
        link.send(codec::encode_event(PING_EVENT, &ping)?).await?;
        if self.manager.protocol().client_pings() {
            link.send(PING_FRAME.to_string()).await?;
        }
        debug!(client = ping.client, "heartbeat sent");
        Ok(())
    }

    /// Tick until shutdown. The first heartbeat goes out immediately.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(interval = ?self.interval, "Keepalive started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Keepalive received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    // A beat can wait on a reconnect; shutdown must not.
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                        result = self.beat() => {
                            if let Err(e) = result {
                                warn!(error = %e, "Heartbeat not sent");
                            }
                        }
                    }
                }
            }
        }

        info!("Keepalive shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::fake::{Reply, ScriptedDialer, Step, test_config};

    #[test]
    fn test_clock_from_pong() {
        let pong = PongResponse {
            client: 1000,
            server: 1050,
        };
        let clock = ClockState::from_pong(&pong, 1100);
        assert_eq!(clock.latency, 0.1);
        assert_eq!(clock.drift, 0.0);
    }

    #[test]
    fn test_clock_drift_sign() {
        // Server is 2s behind: local 10_000 at receipt, 200ms round trip.
        let pong = PongResponse {
            client: 9_800,
            server: 7_900,
        };
        let clock = ClockState::from_pong(&pong, 10_000);
        assert_eq!(clock.latency, 0.2);
        assert_eq!(clock.drift, 2.0);
    }

    #[tokio::test]
    async fn test_beat_updates_clock_through_pong() {
        let dialer = ScriptedDialer::new([Step::Serve(Reply::Ignore)]);
        let (manager, _supervisor) = ConnectionManager::new(dialer.clone(), test_config());
        manager.open().await.unwrap();
        let mut clock_rx = manager.watch_clock();

        let keepalive = Keepalive::new(manager.clone(), KeepaliveConfig::default());
        keepalive.beat().await.unwrap();
        clock_rx.changed().await.unwrap();

        assert!(clock_rx.borrow().latency >= 0.0);
        assert!(
            dialer
                .frames()
                .iter()
                .any(|f| f.starts_with(r#"42["net/ping""#))
        );
    }

    #[tokio::test]
    async fn test_beat_without_link_fails_without_panicking() {
        let dialer = ScriptedDialer::new([]);
        let (manager, _supervisor) = ConnectionManager::new(dialer, test_config());
        let keepalive = Keepalive::new(manager, KeepaliveConfig::default());
        assert!(matches!(
            keepalive.beat().await,
            Err(ConnectionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dialer = ScriptedDialer::new([]);
        let (manager, _supervisor) = ConnectionManager::new(dialer, test_config());
        let keepalive = Keepalive::new(
            manager,
            KeepaliveConfig {
                interval: Duration::from_millis(10),
            },
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(keepalive.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .unwrap()
            .unwrap();
    }
}

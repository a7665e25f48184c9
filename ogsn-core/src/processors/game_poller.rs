//! GamePoller processor.
//!
//! One cycle per tick: query the game list, filter every entry against a
//! copy of the current settings, replace the snapshot, and emit a
//! `GameNotification` for each created match. A cycle runs to completion
//! before the next tick is acted upon.
//!
//! Timeouts and undecodable replies skip the cycle. A terminal connection
//! error stops the poller. A settings update starts the next cycle at once.

use std::sync::Arc;

use kanau::processor::Processor;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigStore, FilterSettings, PollConfig};
use crate::correlator::{GameListSource, RequestError};
use crate::events::{GameNotification, GameNotificationSender};
use crate::filter;
use crate::store::{ReplaceAll, SnapshotStore, StoreError};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("game list request failed: {0}")]
    Request(#[from] RequestError),

    #[error("snapshot not replaced: {0}")]
    Store(#[from] StoreError),
}

impl PollError {
    pub fn is_terminal(&self) -> bool {
        match self {
            PollError::Request(e) => e.is_terminal(),
            PollError::Store(StoreError::Closed) => true,
            PollError::Store(_) => false,
        }
    }
}

/// Drives one poll cycle.
#[derive(Debug, Clone, Copy)]
pub struct PollTick {
    pub cycle: u64,
}

/// What one completed cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub received: usize,
    pub rejected: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Entities the store refused individually.
    pub invalid: usize,
    pub notified: usize,
}

pub struct GamePoller<S> {
    source: S,
    store: Arc<SnapshotStore>,
    settings: ConfigStore<FilterSettings>,
    config: PollConfig,
    notify_tx: GameNotificationSender,
}

impl<S: GameListSource> GamePoller<S> {
    pub fn new(
        source: S,
        store: Arc<SnapshotStore>,
        settings: ConfigStore<FilterSettings>,
        config: PollConfig,
        notify_tx: GameNotificationSender,
    ) -> Self {
        Self {
            source,
            store,
            settings,
            config,
            notify_tx,
        }
    }

    /// Poll until shutdown or a terminal error. The first cycle starts
    /// immediately.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), PollError> {
        info!(interval = ?self.config.interval, "GamePoller started");
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut settings_watcher = self.settings.subscribe();
        let mut cycle = 0u64;

        let result = loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("GamePoller received shutdown signal");
                        break Ok(());
                    }
                }

                Ok(version) = settings_watcher.changed() => {
                    info!(version, "Filter settings updated, polling now");
                    ticker.reset_immediately();
                }

                _ = ticker.tick() => {
                    cycle += 1;
                    let outcome = tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break Ok(());
                            }
                            continue;
                        }
                        outcome = self.process(PollTick { cycle }) => outcome,
                    };
                    match outcome {
                        Ok(report) => debug!(?report, "Poll cycle complete"),
                        Err(e) if e.is_terminal() => {
                            error!(cycle, error = %e, "GamePoller stopping");
                            break Err(e);
                        }
                        Err(e @ PollError::Store(_)) => {
                            error!(cycle, error = %e, "Poll cycle failed, nothing notified");
                        }
                        Err(e) => warn!(cycle, error = %e, "Poll cycle skipped"),
                    }
                }
            }
        };

        info!("GamePoller shutdown complete");
        result
    }
}

impl<S: GameListSource> Processor<PollTick> for GamePoller<S> {
    type Output = CycleReport;
    type Error = PollError;
    #[tracing::instrument(skip_all, err, name = "GamePoller:cycle", fields(cycle = tick.cycle))]
    async fn process(&self, tick: PollTick) -> Result<CycleReport, PollError> {
        let settings = self.settings.snapshot().await;
        let response = self
            .source
            .query_games(&self.config.query(), self.config.request_timeout)
            .await?;

        let mut report = CycleReport {
            cycle: tick.cycle,
            received: response.results.len(),
            ..CycleReport::default()
        };
        let mut candidates = Vec::with_capacity(response.results.len());
        for entry in &response.results {
            match filter::evaluate(entry, &settings) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    report.rejected += 1;
                    debug!(game_id = entry.id, %reason, "Game filtered out");
                }
            }
        }

        let diff = self.store.process(ReplaceAll { candidates }).await?;
        report.created = diff.created_ids().len();
        report.updated = diff.updated_ids().len();
        report.deleted = diff.deleted_ids().len();
        report.invalid = diff.skipped;

        for game in filter::notify_set(&diff) {
            let game_id = game.id;
            let event = GameNotification {
                game,
                cycle: tick.cycle,
            };
            if self.notify_tx.send(event).await.is_err() {
                warn!(game_id, "Notification channel closed, dropping notify set");
                break;
            }
            report.notified += 1;
        }

        info!(
            received = report.received,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            "Snapshot replaced"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::game_notification_channel;
    use async_trait::async_trait;
    use ogsn_sdk::objects::{GameListEntry, GameListQuery, GameListResponse, GamePlayer, Ratings};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers queries from a queue of canned outcomes.
    struct FakeSource {
        replies: Mutex<VecDeque<Result<Vec<GameListEntry>, RequestError>>>,
    }

    impl FakeSource {
        fn new(replies: Vec<Result<Vec<GameListEntry>, RequestError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait]
    impl GameListSource for FakeSource {
        async fn query_games(
            &self,
            _query: &GameListQuery,
            timeout: Duration,
        ) -> Result<GameListResponse, RequestError> {
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Ok(results)) => Ok(GameListResponse {
                    results,
                    ..GameListResponse::default()
                }),
                Some(Err(e)) => Err(e),
                None => Err(RequestError::Timeout {
                    event: "gamelist/query",
                    timeout,
                }),
            }
        }
    }

    fn seat(id: i64, rating: f64) -> GamePlayer {
        let mut player = GamePlayer {
            id,
            username: format!("p{id}").into(),
            ratings: Ratings::default(),
            ..GamePlayer::default()
        };
        player.ratings.overall.rating = rating;
        player.ratings.overall.deviation = 65.0;
        player.ratings.overall.volatility = 0.06;
        player
    }

    fn entry(id: i64, width: i32) -> GameListEntry {
        GameListEntry {
            id,
            name: format!("game {id}"),
            width,
            height: width,
            black: seat(id * 10, 2300.0),
            white: seat(id * 10 + 1, 2250.0),
            in_middle: true,
            ..GameListEntry::default()
        }
    }

    fn poller(
        source: FakeSource,
        store: Arc<SnapshotStore>,
    ) -> (GamePoller<FakeSource>, crate::events::GameNotificationReceiver) {
        let (notify_tx, notify_rx) = game_notification_channel();
        let poller = GamePoller::new(
            source,
            store,
            ConfigStore::new(FilterSettings::default()),
            PollConfig::default(),
            notify_tx,
        );
        (poller, notify_rx)
    }

    #[tokio::test]
    async fn test_cycle_notifies_only_new_match() {
        let store = Arc::new(SnapshotStore::new(None));
        let source = FakeSource::new(vec![
            Ok(vec![entry(2, 19)]),
            Ok(vec![entry(1, 13), entry(3, 19), entry(2, 19)]),
        ]);
        let (poller, mut notify_rx) = poller(source, store);

        poller.process(PollTick { cycle: 1 }).await.unwrap();
        notify_rx.recv().await.unwrap();

        let report = poller.process(PollTick { cycle: 2 }).await.unwrap();
        assert_eq!(report.received, 3);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.notified, 1);

        let notification = notify_rx.recv().await.unwrap();
        assert_eq!(notification.cycle, 2);
        assert_eq!(notification.game.id, 3);
        assert_eq!(notification.game.name, "game 3");
        assert_eq!(notification.game.median_strength, 2275.0);
        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_settings_change_applies_next_cycle() {
        let store = Arc::new(SnapshotStore::new(None));
        let source = FakeSource::new(vec![Ok(vec![entry(1, 19)]), Ok(vec![entry(1, 19)])]);
        let (poller, _notify_rx) = poller(source, store.clone());

        poller.process(PollTick { cycle: 1 }).await.unwrap();
        assert_eq!(store.len().await, 1);

        poller
            .settings
            .update(FilterSettings {
                min_median_rating: 2500.0,
                ..FilterSettings::default()
            })
            .await;
        let report = poller.process(PollTick { cycle: 2 }).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_settings_update_starts_cycle_early() {
        let store = Arc::new(SnapshotStore::new(None));
        let source = FakeSource::new(vec![Ok(vec![entry(1, 19)]), Ok(vec![entry(1, 19)])]);
        let settings = ConfigStore::new(FilterSettings::default());
        let config = PollConfig {
            interval: Duration::from_secs(3600),
            ..PollConfig::default()
        };
        let (notify_tx, _notify_rx) = game_notification_channel();
        let poller = GamePoller::new(source, store.clone(), settings.clone(), config, notify_tx);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poller.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.len().await, 1);

        settings
            .update(FilterSettings {
                min_median_rating: 2500.0,
                ..FilterSettings::default()
            })
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.len().await, 0);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_timeout_skips_cycle_and_keeps_snapshot() {
        let store = Arc::new(SnapshotStore::new(None));
        let source = FakeSource::new(vec![Ok(vec![entry(1, 19)])]);
        let (poller, _notify_rx) = poller(source, store.clone());

        poller.process(PollTick { cycle: 1 }).await.unwrap();
        let err = poller.process(PollTick { cycle: 2 }).await.unwrap_err();
        assert!(matches!(err, PollError::Request(RequestError::Timeout { .. })));
        assert!(!err.is_terminal());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_failure_notifies_nothing() {
        let store = Arc::new(SnapshotStore::new(Some(1)));
        let source = FakeSource::new(vec![Ok(vec![entry(1, 19), entry(2, 19)])]);
        let (poller, mut notify_rx) = poller(source, store.clone());

        let err = poller.process(PollTick { cycle: 1 }).await.unwrap_err();
        assert!(matches!(
            err,
            PollError::Store(StoreError::CapacityExceeded { .. })
        ));
        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_terminal_error() {
        let store = Arc::new(SnapshotStore::new(None));
        let source = FakeSource::new(vec![Err(RequestError::Connection(
            crate::connection::ConnectionError::Closed,
        ))]);
        let (poller, _notify_rx) = poller(source, store);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = tokio::time::timeout(Duration::from_secs(1), poller.run(shutdown_rx))
            .await
            .unwrap();
        assert!(result.unwrap_err().is_terminal());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(SnapshotStore::new(None));
        let (poller, _notify_rx) = poller(FakeSource::new(vec![]), store);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poller.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}

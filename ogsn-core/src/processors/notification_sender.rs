//! NotificationSender processor.
//!
//! Receives `GameNotification` events, renders a title and body for each
//! match and hands them to the desktop [`Notifier`]. A failed notification
//! is logged and the next one is attempted; nothing here stops the poller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kanau::processor::Processor;
use ogsn_sdk::rank::rank_label;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::entities::{Match, MatchPlayer};
use crate::events::{GameNotification, GameNotificationReceiver};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),

    #[error("notifier exited with {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("notifier I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// OS-level notification sink. Fire-and-forget from the caller's side.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str, icon: Option<&Path>)
    -> Result<(), NotifyError>;
}

pub struct NotificationSender<N> {
    notifier: N,
    icon: Option<PathBuf>,
    site: Url,
}

impl<N: Notifier> NotificationSender<N> {
    /// `site` is the web root game links are built from.
    pub fn new(notifier: N, icon: Option<PathBuf>, site: Url) -> Self {
        Self {
            notifier,
            icon,
            site,
        }
    }

    pub async fn run(
        self,
        mut event_rx: GameNotificationReceiver,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("NotificationSender started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("NotificationSender received shutdown signal");
                        break;
                    }
                }

                event = event_rx.recv() => {
                    let Some(event) = event else {
                        info!("GameNotification channel closed");
                        break;
                    };
                    let game_id = event.game.id;
                    if let Err(e) = self.process(event).await {
                        warn!(game_id, error = %e, "Notification not delivered");
                    }
                }
            }
        }

        info!("NotificationSender shutdown complete");
    }

    fn game_url(&self, id: i64) -> String {
        match self.site.join(&format!("game/{id}")) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}game/{id}", self.site),
        }
    }
}

impl<N: Notifier> Processor<GameNotification> for NotificationSender<N> {
    type Output = ();
    type Error = NotifyError;
    async fn process(&self, event: GameNotification) -> Result<(), NotifyError> {
        let title = title(&event.game);
        let body = format!("{}\n{}", body(&event.game), self.game_url(event.game.id));
        debug!(game_id = event.game.id, cycle = event.cycle, %title, "Sending notification");
        self.notifier
            .notify(&title, &body, self.icon.as_deref())
            .await
    }
}

fn seat(player: &MatchPlayer) -> String {
    if player.professional {
        format!("{} [pro]", player.username)
    } else {
        format!("{} [{}]", player.username, rank_label(player.rating.rating))
    }
}

fn title(game: &Match) -> String {
    format!("{} vs {}", seat(&game.black), seat(&game.white))
}

fn body(game: &Match) -> String {
    let mut body = format!(
        "{}x{}, median {:.0} ({})",
        game.board_width,
        game.board_height,
        game.median_strength,
        rank_label(game.median_strength)
    );
    if !game.name.is_empty() {
        body = format!("{}\n{body}", game.name);
    }
    if game.is_ranked {
        body.push_str(", ranked");
    }
    body
}

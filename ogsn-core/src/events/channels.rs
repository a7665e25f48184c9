//! Event channel factories and handles.

use super::types::GameNotification;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// One poll cycle can create up to a full page of matches at once.
pub const DEFAULT_CHANNEL_BUFFER: usize = 512;

/// Sender handle for GameNotification events.
pub type GameNotificationSender = mpsc::Sender<GameNotification>;
/// Receiver handle for GameNotification events.
pub type GameNotificationReceiver = mpsc::Receiver<GameNotification>;

/// Create a new GameNotification channel.
pub fn game_notification_channel() -> (GameNotificationSender, GameNotificationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

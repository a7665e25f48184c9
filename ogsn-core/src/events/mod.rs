//! Events passed between the poll cycle and the notification side.
//!
//! # Event Flow
//!
//! 1. `GamePoller` replaces the snapshot and emits one `GameNotification`
//!    per newly created match, strongest first.
//! 2. `NotificationSender` turns each into a desktop notification.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, GameNotificationReceiver, GameNotificationSender,
    game_notification_channel,
};

pub use types::GameNotification;

//! Long-running processors.
//!
//! - `GamePoller`: on each tick, queries the game list, filters, replaces the
//!   snapshot and emits `GameNotification`
//! - `NotificationSender`: receives `GameNotification`, delivers desktop
//!   notifications

pub mod game_poller;
pub mod notification_sender;

pub use game_poller::{CycleReport, GamePoller, PollError, PollTick};
pub use notification_sender::{NotificationSender, Notifier, NotifyError};

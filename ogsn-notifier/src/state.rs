//! Application state shared across all request handlers.

use ogsn_core::config::{ConfigStore, FilterSettings};
use ogsn_core::connection::{ConnectionState, WsDialer};
use ogsn_core::keepalive::ClockState;
use ogsn_core::store::SnapshotStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc
/// or a watch channel).
#[derive(Clone)]
pub struct AppState {
    /// The current snapshot of tracked matches.
    pub store: Arc<SnapshotStore>,
    /// Filter settings (can be reloaded via SIGHUP).
    pub settings: ConfigStore<FilterSettings>,
    pub clock: watch::Receiver<ClockState>,
    pub connection: watch::Receiver<ConnectionState>,
}

impl AppState {
    pub fn new(
        store: Arc<SnapshotStore>,
        settings: ConfigStore<FilterSettings>,
        manager: &ogsn_core::connection::ConnectionManager<WsDialer>,
    ) -> Self {
        Self {
            store,
            settings,
            clock: manager.watch_clock(),
            connection: manager.watch_state(),
        }
    }
}

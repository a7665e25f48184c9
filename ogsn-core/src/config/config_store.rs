//! Versioned settings cell with change notification.
//!
//! The poll loop copies the current value at the start of each cycle, so a
//! reload (SIGHUP) lands between cycles and never in the middle of one.

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, watch};

/// A shared, versioned value with change notification.
///
/// Every [`update`](ConfigStore::update) bumps the version published on an
/// internal watch channel; [`ConfigWatcher`]s await the next bump.
pub struct ConfigStore<T> {
    inner: Arc<ConfigStoreInner<T>>,
}

struct ConfigStoreInner<T> {
    data: RwLock<T>,
    version_tx: watch::Sender<u64>,
}

/// Receives notifications when a [`ConfigStore`] is updated.
pub struct ConfigWatcher {
    version_rx: watch::Receiver<u64>,
}

// -- ConfigStore --------------------------------------------------------

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(ConfigStoreInner {
                data: RwLock::new(initial),
                version_tx,
            }),
        }
    }

    /// Replace the stored value, returning the new version.
    pub async fn update(&self, value: T) -> u64 {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        let mut version = 0;
        self.inner.version_tx.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        drop(guard);
        version
    }

    /// Borrow the current value.
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }

    pub fn subscribe(&self) -> ConfigWatcher {
        ConfigWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl<T: Clone> ConfigStore<T> {
    /// Copy of the current value, detached from the lock.
    pub async fn snapshot(&self) -> T {
        self.inner.data.read().await.clone()
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// -- ConfigWatcher ------------------------------------------------------

impl ConfigWatcher {
    /// Wait until the store is updated. Errors once the store is dropped.
    pub async fn changed(&mut self) -> Result<u64, watch::error::RecvError> {
        self.version_rx.changed().await?;
        Ok(*self.version_rx.borrow_and_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterSettings;

    #[tokio::test]
    async fn test_update_bumps_version_and_notifies() {
        let store = ConfigStore::new(FilterSettings::default());
        let mut watcher = store.subscribe();

        let updated = FilterSettings {
            board_size: 13,
            ..FilterSettings::default()
        };
        assert_eq!(store.update(updated).await, 1);
        assert_eq!(watcher.changed().await.unwrap(), 1);
        assert_eq!(store.read().await.board_size, 13);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let store = ConfigStore::new(FilterSettings::default());
        let before = store.snapshot().await;
        store
            .update(FilterSettings {
                min_median_rating: 1000.0,
                ..before
            })
            .await;
        assert_eq!(before.min_median_rating, 2200.0);
        assert_eq!(store.snapshot().await.min_median_rating, 1000.0);
    }

    #[tokio::test]
    async fn test_watcher_errors_after_store_dropped() {
        let store = ConfigStore::new(0u8);
        let mut watcher = store.subscribe();
        drop(store);
        assert!(watcher.changed().await.is_err());
    }
}

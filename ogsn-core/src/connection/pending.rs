//! Outstanding acknowledged requests, keyed by ack id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, oneshot};

#[derive(Default)]
pub struct PendingReplies {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, oneshot::Sender<String>>>,
}

impl PendingReplies {
    /// Allocate an ack id and the receiver its reply will arrive on.
    pub async fn register(&self) -> (u64, oneshot::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().await.insert(id, tx);
        (id, rx)
    }

    /// Hand raw ack arguments to whoever waits on `id`.
    ///
    /// Returns `false` for unknown ids (late replies after a timeout).
    pub async fn resolve(&self, id: u64, args: String) -> bool {
        let Some(tx) = self.waiters.lock().await.remove(&id) else {
            return false;
        };
        tx.send(args).is_ok()
    }

    pub async fn cancel(&self, id: u64) {
        self.waiters.lock().await.remove(&id);
    }

    /// Drop every waiter so their receivers error out. Returns how many.
    pub async fn fail_all(&self) -> usize {
        let mut waiters = self.waiters.lock().await;
        let count = waiters.len();
        waiters.clear();
        count
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.waiters.lock().await.len()
    }
}

//! Snapshot Store & Diff Engine.
//!
//! Holds the current set of matches keyed by id, plus ordered indexes on
//! median, white and black strength. Every poll cycle replaces the whole
//! set with [`ReplaceAll`]: the new snapshot is staged and validated off to
//! the side, then swapped in under the write lock, so a failed replace
//! leaves the previous snapshot untouched.
//!
//! All operations are `kanau` processor commands on [`SnapshotStore`].

mod diff;
mod index;

pub use diff::{Change, DiffResult};
pub use index::{ScanOrder, StrengthIndex, ordered_key};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use kanau::processor::Processor;
use tokio::sync::RwLock;
use tracing::warn;

use crate::entities::Match;
use index::FloatIndex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot store is closed")]
    Closed,

    #[error("snapshot of {size} matches exceeds capacity {capacity}")]
    CapacityExceeded { size: usize, capacity: usize },
}

#[derive(Debug, Default)]
struct Snapshot {
    matches: BTreeMap<i64, Match>,
    by_median: FloatIndex,
    by_white: FloatIndex,
    by_black: FloatIndex,
}

impl Snapshot {
    fn build(matches: BTreeMap<i64, Match>) -> Self {
        let mut snapshot = Snapshot {
            matches: BTreeMap::new(),
            by_median: FloatIndex::default(),
            by_white: FloatIndex::default(),
            by_black: FloatIndex::default(),
        };
        for (id, m) in &matches {
            snapshot.by_median.insert(m.median_strength, *id);
            snapshot.by_white.insert(m.white.rating.rating, *id);
            snapshot.by_black.insert(m.black.rating.rating, *id);
        }
        snapshot.matches = matches;
        snapshot
    }

    fn index(&self, index: StrengthIndex) -> &FloatIndex {
        match index {
            StrengthIndex::Median => &self.by_median,
            StrengthIndex::White => &self.by_white,
            StrengthIndex::Black => &self.by_black,
        }
    }
}

/// In-memory snapshot of tracked matches.
pub struct SnapshotStore {
    inner: RwLock<Snapshot>,
    capacity: Option<usize>,
    closed: AtomicBool,
}

impl SnapshotStore {
    /// `capacity` bounds how many matches one snapshot may hold.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(Snapshot::default()),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.matches.len()
    }

    /// Refuse every further command.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

// -- Commands -----------------------------------------------------------

/// Replace the whole snapshot with `candidates` and report what changed.
///
/// Candidates are taken in order; a repeated id keeps the last one.
#[derive(Debug, Clone)]
pub struct ReplaceAll {
    pub candidates: Vec<Match>,
}

/// Matches whose `index` value is `>= min`.
#[derive(Debug, Clone, Copy)]
pub struct RangeScan {
    pub index: StrengthIndex,
    pub min: f64,
    pub order: ScanOrder,
}

#[derive(Debug, Clone, Copy)]
pub struct GetMatch {
    pub id: i64,
}

/// Every match, in id order.
#[derive(Debug, Clone, Copy)]
pub struct ListMatches;

impl Processor<ReplaceAll> for SnapshotStore {
    type Output = DiffResult;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "Store:ReplaceAll")]
    async fn process(&self, cmd: ReplaceAll) -> Result<DiffResult, StoreError> {
        self.ensure_open()?;

        let mut staged = BTreeMap::new();
        let mut skipped = 0;
        for candidate in cmd.candidates {
            if let Err(e) = candidate.validate() {
                warn!(game_id = candidate.id, error = %e, "Skipping invalid match");
                skipped += 1;
                continue;
            }
            staged.insert(candidate.id, candidate);
        }
        if let Some(capacity) = self.capacity {
            if staged.len() > capacity {
                return Err(StoreError::CapacityExceeded {
                    size: staged.len(),
                    capacity,
                });
            }
        }
        let next = Snapshot::build(staged);

        let mut current = self.inner.write().await;
        self.ensure_open()?;
        let changes = diff::diff(&current.matches, &next.matches);
        *current = next;
        Ok(DiffResult { changes, skipped })
    }
}

impl Processor<RangeScan> for SnapshotStore {
    type Output = Vec<Match>;
    type Error = StoreError;
    async fn process(&self, scan: RangeScan) -> Result<Vec<Match>, StoreError> {
        self.ensure_open()?;
        let snapshot = self.inner.read().await;
        Ok(snapshot
            .index(scan.index)
            .at_least(scan.min, scan.order)
            .into_iter()
            .filter_map(|id| snapshot.matches.get(&id).cloned())
            .collect())
    }
}

impl Processor<GetMatch> for SnapshotStore {
    type Output = Option<Match>;
    type Error = StoreError;
    async fn process(&self, get: GetMatch) -> Result<Option<Match>, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.read().await.matches.get(&get.id).cloned())
    }
}

impl Processor<ListMatches> for SnapshotStore {
    type Output = Vec<Match>;
    type Error = StoreError;
    async fn process(&self, _: ListMatches) -> Result<Vec<Match>, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.read().await.matches.values().cloned().collect())
    }
}

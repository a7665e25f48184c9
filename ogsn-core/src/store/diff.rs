//! Per-cycle change set between two snapshots.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::entities::Match;

/// One entity's change between consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Created(Match),
    Updated(Match),
    Deleted(i64),
}

impl Change {
    pub fn id(&self) -> i64 {
        match self {
            Change::Created(m) | Change::Updated(m) => m.id,
            Change::Deleted(id) => *id,
        }
    }
}

/// Outcome of one `ReplaceAll`. Consumed once by the notify stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Ordered by id.
    pub changes: Vec<Change>,
    /// Candidates refused by per-entity validation.
    pub skipped: usize,
}

impl DiffResult {
    pub fn created(&self) -> impl Iterator<Item = &Match> {
        self.changes.iter().filter_map(|c| match c {
            Change::Created(m) => Some(m),
            _ => None,
        })
    }

    pub fn created_ids(&self) -> Vec<i64> {
        self.created().map(|m| m.id).collect()
    }

    pub fn updated_ids(&self) -> Vec<i64> {
        self.ids_where(|c| matches!(c, Change::Updated(_)))
    }

    pub fn deleted_ids(&self) -> Vec<i64> {
        self.ids_where(|c| matches!(c, Change::Deleted(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn ids_where(&self, pred: impl Fn(&Change) -> bool) -> Vec<i64> {
        self.changes.iter().filter(|c| pred(c)).map(Change::id).collect()
    }
}

/// Classify every id present in either map.
pub(crate) fn diff(before: &BTreeMap<i64, Match>, after: &BTreeMap<i64, Match>) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut old = before.iter().peekable();
    let mut new = after.iter().peekable();

    loop {
        let change = match (old.peek().copied(), new.peek().copied()) {
            (None, None) => break,
            (Some((&id, _)), None) => {
                old.next();
                Change::Deleted(id)
            }
            (None, Some((_, m))) => {
                new.next();
                Change::Created(m.clone())
            }
            (Some((&old_id, old_match)), Some((&new_id, new_match))) => {
                match old_id.cmp(&new_id) {
                    Ordering::Less => {
                        old.next();
                        Change::Deleted(old_id)
                    }
                    Ordering::Greater => {
                        new.next();
                        Change::Created(new_match.clone())
                    }
                    Ordering::Equal => {
                        old.next();
                        new.next();
                        if old_match == new_match {
                            continue;
                        }
                        Change::Updated(new_match.clone())
                    }
                }
            }
        };
        changes.push(change);
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::game_match::tests::sample_match;

    fn snapshot(matches: &[Match]) -> BTreeMap<i64, Match> {
        matches.iter().map(|m| (m.id, m.clone())).collect()
    }

    #[test]
    fn test_diff_classifies_changes() {
        let before = snapshot(&[sample_match(1, 2000.0, 2000.0), sample_match(2, 2100.0, 2100.0)]);
        let mut changed = sample_match(2, 2100.0, 2100.0);
        changed.phase.in_end = true;
        let after = snapshot(&[changed, sample_match(3, 2200.0, 2200.0)]);

        let result = DiffResult {
            changes: diff(&before, &after),
            skipped: 0,
        };
        assert_eq!(result.created_ids(), vec![3]);
        assert_eq!(result.updated_ids(), vec![2]);
        assert_eq!(result.deleted_ids(), vec![1]);
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_empty() {
        let both = snapshot(&[sample_match(1, 2000.0, 2000.0), sample_match(2, 2100.0, 2100.0)]);
        assert!(diff(&both, &both).is_empty());
    }

    #[test]
    fn test_diff_from_and_to_empty() {
        let some = snapshot(&[sample_match(4, 2000.0, 2000.0)]);
        let none = BTreeMap::new();
        assert_eq!(diff(&none, &some), vec![Change::Created(sample_match(4, 2000.0, 2000.0))]);
        assert_eq!(diff(&some, &none), vec![Change::Deleted(4)]);
    }
}

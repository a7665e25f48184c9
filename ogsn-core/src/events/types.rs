//! Event type definitions.

use crate::entities::Match;

/// A match that appeared in the snapshot this cycle.
///
/// Carries the full record: the snapshot may have moved on by the time the
/// notification is rendered.
#[derive(Debug, Clone)]
pub struct GameNotification {
    pub game: Match,
    /// Poll cycle that created the match.
    pub cycle: u64,
}

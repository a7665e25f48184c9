//! Selection rules applied to every listed game.

use serde::{Deserialize, Serialize};

/// User-tunable selection rules.
///
/// Read-only from the poll loop's point of view: each cycle copies the
/// current value out of a [`ConfigStore`](super::ConfigStore) and uses that
/// copy throughout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Keep games where either seat is a professional.
    pub include_professional_games: bool,
    /// Keep games flagged as bot games.
    pub include_bot_games: bool,
    /// Minimum median rating of the two players.
    pub min_median_rating: f64,
    /// Required board width.
    pub board_size: i32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            include_professional_games: true,
            include_bot_games: false,
            min_median_rating: 2200.0,
            board_size: 19,
        }
    }
}

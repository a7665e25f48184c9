//! Game objects as they appear inside a `gamelist/query` reply.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Glicko-2 style strength estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub deviation: f64,
    #[serde(default)]
    pub volatility: f64,
}

/// Rating categories attached to a player. Only `overall` is read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ratings {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub overall: Rating,
}

/// A player seat in a listed game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GamePlayer {
    pub id: i64,
    #[serde(default)]
    pub username: CompactString,
    #[serde(default)]
    pub rank: f64,
    #[serde(default)]
    pub professional: bool,
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub ratings: Ratings,
}

impl GamePlayer {
    /// Overall rating value, the number every strength computation uses.
    pub fn overall_rating(&self) -> f64 {
        self.ratings.overall.rating
    }
}

/// A single in-progress game as transmitted by the server.
///
/// Fields the notifier does not interpret are kept loosely typed and
/// defaulted, since the server omits them freely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameListEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub player_to_move: i64,
    #[serde(default)]
    pub move_number: i32,
    #[serde(default)]
    pub paused: i32,
    #[serde(default)]
    pub private: bool,
    pub black: GamePlayer,
    pub white: GamePlayer,
    #[serde(default)]
    pub time_per_move: i64,
    #[serde(default)]
    pub ranked: bool,
    #[serde(default)]
    pub handicap: i32,
    #[serde(default)]
    pub komi: f32,
    #[serde(default)]
    pub bot_game: bool,
    #[serde(default)]
    pub in_beginning: bool,
    #[serde(default)]
    pub in_middle: bool,
    #[serde(default)]
    pub in_end: bool,
}

impl GameListEntry {
    /// Whether either seat is held by a professional.
    pub fn has_professional(&self) -> bool {
        self.black.professional || self.white.professional
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transmitted_game() {
        let json = r#"{
            "id": 51234567,
            "group_ids": [],
            "phase": "play",
            "name": "Friendly Match",
            "player_to_move": 1001,
            "width": 19,
            "height": 19,
            "move_number": 42,
            "paused": 0,
            "private": false,
            "black": {
                "id": 1001,
                "username": "kuroneko",
                "rank": 31.2,
                "professional": false,
                "accepted": true,
                "ratings": {"version": 5, "overall": {"rating": 2210.5, "deviation": 62.1, "volatility": 0.06}}
            },
            "white": {
                "id": 1002,
                "username": "shiro",
                "rank": 30.1,
                "professional": true,
                "accepted": true,
                "ratings": {"version": 5, "overall": {"rating": 2150.0, "deviation": 70.0, "volatility": 0.061}}
            },
            "time_per_move": 20,
            "ranked": true,
            "handicap": 0,
            "komi": 6.5,
            "bot_game": false,
            "in_beginning": false,
            "in_middle": true,
            "in_end": false,
            "group_ids_map": {}
        }"#;

        let game: GameListEntry = serde_json::from_str(json).unwrap();
        assert_eq!(game.id, 51234567);
        assert_eq!(game.width, 19);
        assert_eq!(game.black.username, "kuroneko");
        assert_eq!(game.black.overall_rating(), 2210.5);
        assert!(game.has_professional());
        assert!(game.in_middle);
    }

    #[test]
    fn test_parse_sparse_game() {
        let json = r#"{"id": 7, "black": {"id": 1}, "white": {"id": 2}}"#;
        let game: GameListEntry = serde_json::from_str(json).unwrap();
        assert_eq!(game.width, 0);
        assert_eq!(game.white.overall_rating(), 0.0);
        assert!(!game.bot_game);
    }
}

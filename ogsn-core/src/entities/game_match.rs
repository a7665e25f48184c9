//! The tracked game record held in the snapshot.

use compact_str::CompactString;
use ogsn_sdk::objects::{GameListEntry, GamePlayer, Rating as SdkRating};
use serde::Serialize;

/// Strength estimate of one player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rating {
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64,
}

impl From<SdkRating> for Rating {
    fn from(value: SdkRating) -> Self {
        Self {
            rating: value.rating,
            deviation: value.deviation,
            volatility: value.volatility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPlayer {
    pub id: i64,
    pub username: CompactString,
    pub professional: bool,
    pub rating: Rating,
}

impl From<&GamePlayer> for MatchPlayer {
    fn from(value: &GamePlayer) -> Self {
        Self {
            id: value.id,
            username: value.username.clone(),
            professional: value.professional,
            rating: value.ratings.overall.into(),
        }
    }
}

/// Which part of the game is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PhaseFlags {
    pub in_beginning: bool,
    pub in_middle: bool,
    pub in_end: bool,
}

/// A game that passed the filter, with its derived median strength.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub id: i64,
    pub name: String,
    pub board_width: i32,
    pub board_height: i32,
    pub black: MatchPlayer,
    pub white: MatchPlayer,
    pub is_bot_game: bool,
    pub is_ranked: bool,
    pub phase: PhaseFlags,
    /// Computed by the filter each cycle; never taken from the wire.
    pub median_strength: f64,
}

impl Match {
    pub fn from_entry(entry: &GameListEntry, median_strength: f64) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            board_width: entry.width,
            board_height: entry.height,
            black: (&entry.black).into(),
            white: (&entry.white).into(),
            is_bot_game: entry.bot_game,
            is_ranked: entry.ranked,
            phase: PhaseFlags {
                in_beginning: entry.in_beginning,
                in_middle: entry.in_middle,
                in_end: entry.in_end,
            },
            median_strength,
        }
    }

    pub fn has_professional(&self) -> bool {
        self.black.professional || self.white.professional
    }

    /// Check that the record can be indexed.
    pub fn validate(&self) -> Result<(), InsertError> {
        if self.id <= 0 {
            return Err(InsertError::InvalidId(self.id));
        }
        if self.board_width <= 0 || self.board_height <= 0 {
            return Err(InsertError::InvalidBoard {
                width: self.board_width,
                height: self.board_height,
            });
        }
        if !self.median_strength.is_finite() {
            return Err(InsertError::NonFinite("median_strength"));
        }
        for (seat, player) in [("black", &self.black), ("white", &self.white)] {
            let rating = &player.rating;
            if !rating.rating.is_finite()
                || !rating.deviation.is_finite()
                || !rating.volatility.is_finite()
            {
                return Err(InsertError::NonFinite(seat));
            }
            if rating.deviation < 0.0 || rating.volatility < 0.0 {
                return Err(InsertError::NegativeUncertainty(seat));
            }
        }
        Ok(())
    }
}

/// Why a single record was refused by the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsertError {
    #[error("invalid game id {0}")]
    InvalidId(i64),
    #[error("invalid board {width}x{height}")]
    InvalidBoard { width: i32, height: i32 },
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    #[error("negative deviation or volatility for {0}")]
    NegativeUncertainty(&'static str),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A valid 19x19 match between two amateurs.
    pub(crate) fn sample_match(id: i64, black: f64, white: f64) -> Match {
        let player = |pid: i64, name: &str, rating: f64| MatchPlayer {
            id: pid,
            username: CompactString::from(name),
            professional: false,
            rating: Rating {
                rating,
                deviation: 60.0,
                volatility: 0.06,
            },
        };
        Match {
            id,
            name: format!("game {id}"),
            board_width: 19,
            board_height: 19,
            black: player(id * 10, "black", black),
            white: player(id * 10 + 1, "white", white),
            is_bot_game: false,
            is_ranked: true,
            phase: PhaseFlags {
                in_middle: true,
                ..PhaseFlags::default()
            },
            median_strength: (black + white) / 2.0,
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample_match(1, 2000.0, 2100.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        let mut m = sample_match(0, 2000.0, 2000.0);
        assert_eq!(m.validate(), Err(InsertError::InvalidId(0)));

        m = sample_match(2, 2000.0, 2000.0);
        m.board_height = 0;
        assert!(matches!(m.validate(), Err(InsertError::InvalidBoard { .. })));

        m = sample_match(3, 2000.0, 2000.0);
        m.median_strength = f64::NAN;
        assert_eq!(m.validate(), Err(InsertError::NonFinite("median_strength")));

        m = sample_match(4, 2000.0, 2000.0);
        m.white.rating.deviation = -1.0;
        assert_eq!(m.validate(), Err(InsertError::NegativeUncertainty("white")));
    }

    #[test]
    fn test_from_entry_copies_wire_fields() {
        let entry: GameListEntry = serde_json::from_str(
            r#"{"id": 9, "width": 13, "height": 13, "bot_game": true, "in_end": true,
                "black": {"id": 1, "username": "a", "ratings": {"overall": {"rating": 1800.0}}},
                "white": {"id": 2, "username": "b", "professional": true}}"#,
        )
        .unwrap();
        let m = Match::from_entry(&entry, 1234.0);
        assert_eq!(m.board_width, 13);
        assert!(m.is_bot_game);
        assert!(m.phase.in_end);
        assert_eq!(m.black.rating.rating, 1800.0);
        assert!(m.has_professional());
        assert_eq!(m.median_strength, 1234.0);
    }
}

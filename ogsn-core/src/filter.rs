//! Filter & Decision.
//!
//! Pure functions of `(candidate, settings)`: which listed games enter the
//! snapshot, with what median strength, and which of a cycle's changes get
//! notified.

use std::cmp::Ordering;
use std::fmt;

use ogsn_sdk::objects::GameListEntry;

use crate::config::FilterSettings;
use crate::entities::Match;
use crate::store::DiffResult;

/// Median strength assigned to games with a professional player. Their
/// ratings are not on the amateur scale, so they are not averaged.
pub const PROFESSIONAL_STRENGTH: f64 = 2400.0;

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    BoardSize { width: i32 },
    BotGame,
    ProfessionalGame,
    BelowMinimum { strength: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BoardSize { width } => write!(f, "board width {width}"),
            Rejection::BotGame => write!(f, "bot game"),
            Rejection::ProfessionalGame => write!(f, "professional game"),
            Rejection::BelowMinimum { strength } => write!(f, "median strength {strength}"),
        }
    }
}

/// Median strength of a listed game, or `None` if it has a professional.
pub fn median_strength(entry: &GameListEntry) -> Option<f64> {
    if entry.has_professional() {
        return None;
    }
    Some((entry.black.overall_rating() + entry.white.overall_rating()) / 2.0)
}

/// Decide whether `entry` enters the snapshot under `settings`.
pub fn evaluate(entry: &GameListEntry, settings: &FilterSettings) -> Result<Match, Rejection> {
    if entry.width != settings.board_size {
        return Err(Rejection::BoardSize { width: entry.width });
    }
    if entry.bot_game && !settings.include_bot_games {
        return Err(Rejection::BotGame);
    }
    let strength = match median_strength(entry) {
        Some(strength) => strength,
        None if settings.include_professional_games => PROFESSIONAL_STRENGTH,
        None => return Err(Rejection::ProfessionalGame),
    };
    if strength < settings.min_median_rating {
        return Err(Rejection::BelowMinimum { strength });
    }
    Ok(Match::from_entry(entry, strength))
}

/// The matches to notify for one cycle: exactly the created ones,
/// strongest first, ties by id.
pub fn notify_set(diff: &DiffResult) -> Vec<Match> {
    let mut created: Vec<Match> = diff.created().cloned().collect();
    created.sort_by(|a, b| {
        b.median_strength
            .partial_cmp(&a.median_strength)
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    created
}

pub mod game_match;

pub use game_match::{InsertError, Match, MatchPlayer, PhaseFlags, Rating};

//! Rating-service player objects returned by the REST players listing.
//!
//! These are independent of [`GamePlayer`](super::game::GamePlayer): the
//! notifier never joins the two.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::game::Ratings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub username: CompactString,
    #[serde(default)]
    pub country: CompactString,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub ratings: Ratings,
}

impl Player {
    pub fn overall_rating(&self) -> f64 {
        self.ratings.overall.rating
    }
}

/// One page of the players listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayersPage {
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Player>,
}

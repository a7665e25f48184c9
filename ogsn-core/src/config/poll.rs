//! Poll loop configuration.

use std::time::Duration;

use ogsn_sdk::objects::{GameList, GameListQuery};

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Deadline for each list query.
    pub request_timeout: Duration,
    pub list: GameList,
    pub sort_by: String,
    pub from: i32,
    pub limit: i32,
    /// Largest snapshot the store accepts, if any.
    pub max_entries: Option<usize>,
}

impl PollConfig {
    /// The query sent each cycle.
    pub fn query(&self) -> GameListQuery {
        let mut query = GameListQuery::new(self.list, self.limit);
        query.sort_by = self.sort_by.clone();
        query.from = self.from;
        query
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            list: GameList::Live,
            sort_by: "rank".to_string(),
            from: 0,
            limit: 300,
            max_entries: None,
        }
    }
}

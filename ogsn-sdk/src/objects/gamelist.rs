//! `gamelist/query` request and reply.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::game::GameListEntry;

/// Event name of the acknowledged list query.
pub const GAMELIST_QUERY_EVENT: &str = "gamelist/query";

/// Which list of games to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameList {
    #[default]
    Live,
    Correspondence,
}

impl std::fmt::Display for GameList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameList::Live => write!(f, "live"),
            GameList::Correspondence => write!(f, "correspondence"),
        }
    }
}

/// Outbound query payload.
///
/// `sort_by` and `where` are passed through but the server does not apply
/// them reliably; callers re-filter and re-sort locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameListQuery {
    pub list: GameList,
    pub sort_by: String,
    #[serde(rename = "where")]
    pub where_: Map<String, Value>,
    pub from: i32,
    pub limit: i32,
}

impl GameListQuery {
    /// Query the first `limit` games of `list`, sorted by rank.
    pub fn new(list: GameList, limit: i32) -> Self {
        Self {
            list,
            sort_by: "rank".to_string(),
            where_: Map::new(),
            from: 0,
            limit,
        }
    }
}

/// Reply to [`GameListQuery`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameListResponse {
    #[serde(default)]
    pub list: String,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub size: i32,
    #[serde(default, rename = "where")]
    pub where_: Map<String, Value>,
    #[serde(default)]
    pub from: i32,
    #[serde(default)]
    pub limit: i32,
    #[serde(default)]
    pub results: Vec<GameListEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wire_shape() {
        let query = GameListQuery::new(GameList::Live, 300);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "list": "live",
                "sort_by": "rank",
                "where": {},
                "from": 0,
                "limit": 300
            })
        );
    }

    #[test]
    fn test_response_without_results() {
        let json = r#"{"list":"live","by":"rank","size":0,"where":{},"from":0,"limit":10}"#;
        let response: GameListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.by, "rank");
        assert!(response.results.is_empty());
    }
}

pub mod game;
pub mod gamelist;
pub mod net;
pub mod players;

pub use game::{GameListEntry, GamePlayer, Rating, Ratings};
pub use gamelist::{GAMELIST_QUERY_EVENT, GameList, GameListQuery, GameListResponse};
pub use net::{PING_EVENT, PONG_EVENT, PingRequest, PongResponse};
pub use players::{Player, PlayersPage};

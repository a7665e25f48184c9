//! Request Correlator.
//!
//! Sends an acknowledged event and waits for the reply carrying the same ack
//! id, or for the caller's deadline. The shared link guard is held for the
//! whole exchange, so a reconnect waits for in-flight requests (which fail
//! fast when their link drops) and new requests wait for the reconnect.

use std::time::Duration;

use async_trait::async_trait;
use ogsn_sdk::codec::{self, CodecError};
use ogsn_sdk::objects::{GAMELIST_QUERY_EVENT, GameListQuery, GameListResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::connection::{ConnectionError, ConnectionManager, Dialer};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("no reply to {event} within {timeout:?}")]
    Timeout {
        event: &'static str,
        timeout: Duration,
    },

    #[error("undecodable reply ({size} bytes): {source}")]
    Decode {
        size: usize,
        #[source]
        source: CodecError,
    },

    #[error("could not encode request: {0}")]
    Encode(#[source] CodecError),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
}

impl RequestError {
    /// Whether the caller should give up rather than retry later.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestError::Connection(e) if e.is_terminal())
    }
}

pub struct RequestCorrelator<D> {
    manager: ConnectionManager<D>,
}

impl<D: Dialer> RequestCorrelator<D> {
    pub fn new(manager: ConnectionManager<D>) -> Self {
        Self { manager }
    }

    /// Send `payload` as `event` and decode the first reply argument.
    pub async fn request<Req, Resp>(
        &self,
        event: &'static str,
        payload: &Req,
        timeout: Duration,
    ) -> Result<Resp, RequestError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let link = self.manager.link().await?;
        let pending = self.manager.pending();
        let (id, reply_rx) = pending.register().await;

        let frame = match codec::encode_ack_request(id, event, payload) {
            Ok(frame) => frame,
            Err(e) => {
                pending.cancel(id).await;
                return Err(RequestError::Encode(e));
            }
        };
        if let Err(e) = link.send(frame).await {
            pending.cancel(id).await;
            return Err(e.into());
        }
        debug!(event, ack_id = id, generation = link.generation(), "request sent");

        let raw = match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(_)) => return Err(ConnectionError::LinkLost.into()),
            Err(_) => {
                pending.cancel(id).await;
                return Err(RequestError::Timeout { event, timeout });
            }
        };
        drop(link);

        codec::decode_ack_args(&raw).map_err(|source| RequestError::Decode {
            size: raw.len(),
            source,
        })
    }
}

/// Anything that can answer a game list query.
#[async_trait]
pub trait GameListSource: Send + Sync {
    async fn query_games(
        &self,
        query: &GameListQuery,
        timeout: Duration,
    ) -> Result<GameListResponse, RequestError>;
}

#[async_trait]
impl<D: Dialer> GameListSource for RequestCorrelator<D> {
    async fn query_games(
        &self,
        query: &GameListQuery,
        timeout: Duration,
    ) -> Result<GameListResponse, RequestError> {
        self.request(GAMELIST_QUERY_EVENT, query, timeout).await
    }
}

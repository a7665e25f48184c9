//! Text-frame transport beneath the connection manager.
//!
//! A [`Dialer`] produces a [`Channel`]: an outbound sender of text frames
//! and an inbound receiver of [`TransportFrame`]s. Dropping the outbound
//! sender closes the underlying socket.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tracing::{debug, trace};
use url::Url;

use super::ConnectionError;

const OUTBOUND_BUFFER: usize = 64;
const INBOUND_BUFFER: usize = 256;

/// One event read from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFrame {
    Text(String),
    /// Orderly close by the peer, or end of stream.
    Closed,
    Error(String),
}

/// An established transport.
pub struct Channel {
    pub outbound: mpsc::Sender<String>,
    pub inbound: mpsc::Receiver<TransportFrame>,
}

impl Channel {
    /// Create a connected pair: the channel and the peer's ends of it.
    pub fn pair() -> (Channel, mpsc::Receiver<String>, mpsc::Sender<TransportFrame>) {
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (in_tx, in_rx) = mpsc::channel(INBOUND_BUFFER);
        (
            Channel {
                outbound: out_tx,
                inbound: in_rx,
            },
            out_rx,
            in_tx,
        )
    }
}

/// Opens transports.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, url: &Url) -> Result<Channel, ConnectionError>;
}

/// WebSocket dialer backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &Url) -> Result<Channel, ConnectionError> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();
        let (channel, mut out_rx, in_tx) = Channel::pair();

        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                trace!(frame = %text, "ws send");
                if let Err(e) = write.send(WsMessage::Text(text.into())).await {
                    debug!(error = %e, "ws write failed");
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            let last = loop {
                match read.next().await {
                    Some(Ok(WsMessage::Text(text))) => {
                        trace!(frame = %text, "ws recv");
                        if in_tx.send(TransportFrame::Text(text.to_string())).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break TransportFrame::Closed,
                    // Control frames are answered by tungstenite; binary is unused.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break TransportFrame::Error(e.to_string()),
                }
            };
            let _ = in_tx.send(last).await;
        });

        Ok(channel)
    }
}

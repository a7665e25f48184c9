//! Open / namespace-connect exchange run on a freshly dialed channel.

use ogsn_sdk::codec::{self, CONNECT_FRAME, EnginePacket, Handshake, PONG_FRAME, ProtocolVersion, SocketPacket};

use super::ConnectionError;
use super::transport::{Channel, TransportFrame};

/// Wait for the open packet, request the default namespace if the protocol
/// needs it, then wait for the namespace connect.
pub(crate) async fn handshake(
    channel: &mut Channel,
    protocol: ProtocolVersion,
) -> Result<Handshake, ConnectionError> {
    let open = loop {
        match next_packet(channel).await? {
            EnginePacket::Open(open) => break open,
            EnginePacket::Noop => continue,
            other => {
                return Err(ConnectionError::Handshake(format!(
                    "expected open packet, got {other:?}"
                )));
            }
        }
    };

    if protocol.client_connects() {
        channel
            .outbound
            .send(CONNECT_FRAME.to_string())
            .await
            .map_err(|_| ConnectionError::Send)?;
    }

    loop {
        match next_packet(channel).await? {
            EnginePacket::Message(SocketPacket::Connect) => return Ok(open),
            EnginePacket::Message(SocketPacket::ConnectError(reason)) => {
                return Err(ConnectionError::Handshake(reason));
            }
            EnginePacket::Ping(payload) => {
                channel
                    .outbound
                    .send(format!("{PONG_FRAME}{payload}"))
                    .await
                    .map_err(|_| ConnectionError::Send)?;
            }
            _ => {}
        }
    }
}

async fn next_packet(channel: &mut Channel) -> Result<EnginePacket, ConnectionError> {
    match channel.inbound.recv().await {
        Some(TransportFrame::Text(text)) => {
            codec::decode(&text).map_err(|e| ConnectionError::Handshake(e.to_string()))
        }
        Some(TransportFrame::Error(e)) => Err(ConnectionError::Handshake(e)),
        Some(TransportFrame::Closed) | None => Err(ConnectionError::Handshake(
            "closed during handshake".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: &str = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    #[tokio::test]
    async fn test_v4_handshake_sends_namespace_connect() {
        let (mut channel, mut peer_rx, peer_tx) = Channel::pair();
        peer_tx.send(TransportFrame::Text(OPEN.into())).await.unwrap();
        let server = tokio::spawn(async move {
            assert_eq!(peer_rx.recv().await.unwrap(), "40");
            peer_tx.send(TransportFrame::Text("40".into())).await.unwrap();
            (peer_rx, peer_tx)
        });

        let open = handshake(&mut channel, ProtocolVersion::V4).await.unwrap();
        assert_eq!(open.sid, "s1");
        let _keep = server.await.unwrap();
    }

    #[tokio::test]
    async fn test_v3_handshake_waits_for_server_connect() {
        let (mut channel, mut peer_rx, peer_tx) = Channel::pair();
        peer_tx.send(TransportFrame::Text(OPEN.into())).await.unwrap();
        peer_tx.send(TransportFrame::Text("40".into())).await.unwrap();

        handshake(&mut channel, ProtocolVersion::V3).await.unwrap();
        assert!(peer_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_error_fails_handshake() {
        let (mut channel, _peer_rx, peer_tx) = Channel::pair();
        peer_tx.send(TransportFrame::Text(OPEN.into())).await.unwrap();
        peer_tx
            .send(TransportFrame::Text(r#"44{"message":"denied"}"#.into()))
            .await
            .unwrap();

        let err = handshake(&mut channel, ProtocolVersion::V4).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Handshake(reason) if reason.contains("denied")));
    }

    #[tokio::test]
    async fn test_close_before_open_fails_handshake() {
        let (mut channel, _peer_rx, peer_tx) = Channel::pair();
        drop(peer_tx);
        assert!(matches!(
            handshake(&mut channel, ProtocolVersion::V4).await,
            Err(ConnectionError::Handshake(_))
        ));
    }
}

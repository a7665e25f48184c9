use ogsn_sdk::codec::CodecError;

/// Connection-level failures.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The dial itself failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Dialed, but the open / namespace connect exchange did not complete.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Shutdown was observed while reconnecting.
    #[error("retry aborted")]
    ReconnectAborted,

    /// The manager was closed.
    #[error("connection closed")]
    Closed,

    /// No link has been established yet.
    #[error("not connected")]
    NotConnected,

    /// The link dropped while a caller was waiting on it.
    #[error("link lost")]
    LinkLost,

    /// The link's writer has gone away.
    #[error("send failed: link writer closed")]
    Send,

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ConnectionError {
    /// Whether no further progress is possible without a new manager.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionError::ReconnectAborted | ConnectionError::Closed
        )
    }
}

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A send was attempted while the channel is not open.
    #[error("channel not ready (state: {0})")]
    NotReady(crate::ChannelState),

    /// The outbound queue is full. Sends fail fast instead of queueing.
    #[error("outbound queue full")]
    Backpressure,

    /// The server URL could not be parsed into a WebSocket request.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The connection could not be established.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

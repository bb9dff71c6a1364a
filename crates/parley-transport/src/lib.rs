//! Channel abstraction layer for Parley.
//!
//! Provides the [`Channel`] trait: one full-duplex, message-oriented
//! connection to the chat server. A channel has its own lifecycle,
//! independent of any chat semantics:
//!
//! ```text
//! Connecting ──(handshake ok)──→ Open ──(close / error)──→ Closed
//!      │                                                     ↑
//!      └───────────────(connect failed)──────────────────────┘
//! ```
//!
//! Received data is delivered upward as discrete [`ChannelEvent`]s on a
//! receiver returned when the channel is opened. There is no automatic
//! reconnect and no buffering of sends while the channel is not open.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketChannel;

use std::fmt;

use tokio::sync::mpsc;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// The connection is being established.
    Connecting,
    /// Frames can be sent and received.
    Open,
    /// The connection is gone. Terminal.
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Something that happened on a channel, delivered in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection is established. Emitted at most once.
    Opened,
    /// A text frame arrived from the server.
    Frame(String),
    /// The connection is gone. Emitted exactly once, always last.
    ///
    /// Transport errors (including a failed connect) surface here too.
    Closed {
        /// Why the channel closed, when known.
        reason: Option<String>,
    },
}

/// Receiving half of a channel's event stream.
pub type ChannelEvents = mpsc::UnboundedReceiver<ChannelEvent>;

/// Configuration for a channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// How many encoded frames may wait for the socket writer before
    /// [`Channel::send`] starts failing with [`TransportError::Backpressure`].
    ///
    /// Default: 64. Values below 1 are clamped to 1.
    pub outbound_capacity: usize,
}

impl ChannelConfig {
    /// Sets the outbound queue capacity.
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 64,
        }
    }
}

/// A single client connection that can send text frames.
///
/// All methods are synchronous and never block: callers issue sends from
/// non-async code paths and receive through [`ChannelEvents`].
pub trait Channel: Send + Sync + 'static {
    /// The error type for channel operations.
    type Error: std::error::Error + Send + Sync;

    /// Queues an already-encoded frame for transmission.
    ///
    /// Fails immediately if the channel is not [`ChannelState::Open`] or
    /// the outbound queue is full. Nothing is buffered for later.
    fn send(&self, frame: &str) -> Result<(), Self::Error>;

    /// Closes the connection from the local side.
    ///
    /// A [`ChannelEvent::Closed`] follows once the socket is released.
    /// Calling this on a channel that is already closed does nothing.
    fn close(&self);

    /// Returns the current lifecycle state.
    fn state(&self) -> ChannelState;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns `true` if frames can be sent right now.
    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }
}

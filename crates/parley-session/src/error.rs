//! Error types for the session layer.
//!
//! Two kinds of failure live here:
//!
//! - [`SessionError`]: a local intent was refused. Returned to the caller;
//!   nothing was sent and no state changed (unless documented otherwise).
//! - [`Violation`]: a server event broke a protocol invariant. Logged and
//!   handed back inside [`Outcome::Discarded`](crate::Outcome::Discarded);
//!   it never propagates as an `Err` and never ends the session.

use parley_protocol::UserId;

/// Why a local intent was refused.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server has not assigned an identity yet.
    #[error("not registered yet")]
    NotRegistered,

    /// A registration request is already in flight.
    #[error("registration already requested")]
    RegistrationPending,

    /// This connection already has an identity.
    #[error("already registered as {0}")]
    AlreadyRegistered(UserId),

    /// Starting a chat requires being idle.
    #[error("already chatting with {0}")]
    NotIdle(UserId),

    /// The operation needs an active pairing.
    #[error("no active chat")]
    NotPaired,

    /// The message is empty after trimming whitespace.
    #[error("message is empty")]
    EmptyMessage,

    /// The chat target is not a valid peer (empty, or ourselves).
    #[error("invalid chat target {0:?}")]
    InvalidTarget(String),

    /// The channel closed; the session is over.
    #[error("session closed")]
    Closed,

    /// The channel is not open, so the intent could not be sent.
    #[error("channel not ready")]
    ChannelNotReady,

    /// The channel's send queue is full. Nothing was sent; retry later.
    #[error("send queue full")]
    Backpressure,

    /// The intent could not be encoded or handed to the channel.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A server event that would corrupt local state if applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// A second `registered` arrived for a connection that has an identity.
    #[error("duplicate registration: already {current}, got {received}")]
    DuplicateRegistration { current: UserId, received: UserId },

    /// An event that needs our identity arrived before `registered`.
    #[error("{kind} received before registration")]
    Unregistered { kind: &'static str },

    /// `chat_started` named a pair that does not include us exactly once.
    #[error("pairing {pair:?} does not involve us")]
    ForeignPairing { pair: [UserId; 2] },

    /// A message arrived with no active pairing.
    #[error("message from {from} while not chatting")]
    MessageWhileUnpaired { from: UserId },

    /// A message arrived from someone other than the current peer.
    #[error("message from {from} while chatting with {peer}")]
    MessageFromStranger { from: UserId, peer: UserId },
}

//! Wire types for Parley.
//!
//! Every frame on the wire is a JSON object with a mandatory `type` tag.
//! Frames flow in two directions and each direction has its own closed
//! enum:
//!
//! - [`ServerEvent`]: server → client, drives session transitions
//! - [`ClientIntent`]: client → server, requests an action
//!
//! The two enums share the `message` tag but never the same type, so a
//! frame is only ever decoded as the direction it travels in.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A server-assigned user identifier.
///
/// Opaque to the client: it is compared for equality and echoed back to
/// the server, never parsed. `#[serde(transparent)]` keeps it a plain JSON
/// string on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Creates a `UserId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One connected user as listed in a presence snapshot.
///
/// The server also sends bookkeeping fields (`connected`, `last_seen`);
/// serde ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The user's id.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
}

impl RosterEntry {
    /// Creates a roster entry.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent: server → client
// ---------------------------------------------------------------------------

/// A decoded frame from the server.
///
/// Internally tagged: `{ "type": "chat_started", "pair": ["u1", "u2"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The server assigned this connection an identity.
    ///
    /// `name` is the display name the server settled on, which may differ
    /// from the one requested.
    Registered {
        user_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Full roster of connected users, including the caller.
    Presence { users: Vec<RosterEntry> },

    /// A pairing involving the caller has begun.
    ChatStarted { pair: [UserId; 2] },

    /// The caller's active pairing has ended.
    ///
    /// The server names the pair that ended when it knows it; a client
    /// uses it to tell a stale confirmation from a current one.
    ChatEnded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pair: Option<Vec<UserId>>,
    },

    /// A text message within the active pairing.
    #[serde(rename = "message")]
    MessageReceived { from: UserId, content: String },

    /// The server refused something and sent `{ "error": "..." }`.
    ///
    /// These frames carry no `type` tag, so they are recognized by
    /// [`decode_event`](crate::decode_event) rather than by serde.
    #[serde(skip)]
    Rejected { reason: String },
}

impl ServerEvent {
    /// Every `type` tag a server frame may carry.
    pub const TAGS: &'static [&'static str] = &[
        "registered",
        "presence",
        "chat_started",
        "chat_ended",
        "message",
    ];

    /// A short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
            Self::Presence { .. } => "presence",
            Self::ChatStarted { .. } => "chat_started",
            Self::ChatEnded { .. } => "chat_ended",
            Self::MessageReceived { .. } => "message",
            Self::Rejected { .. } => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// ClientIntent: client → server
// ---------------------------------------------------------------------------

/// A request sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Ask for an identity. The server answers with
    /// [`ServerEvent::Registered`].
    ///
    /// `user_id` asks the server to reuse an id from an earlier
    /// connection; the server is free to ignore it.
    Register {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
    },

    /// Ask to be paired with `target_id`.
    StartChat { target_id: UserId },

    /// Deliver a text message to the current peer.
    #[serde(rename = "message")]
    SendMessage { to: UserId, content: String },

    /// Ask to end the pairing with `target_id`.
    EndChat { target_id: UserId },
}

impl ClientIntent {
    /// A short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::StartChat { .. } => "start_chat",
            Self::SendMessage { .. } => "message",
            Self::EndChat { .. } => "end_chat",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

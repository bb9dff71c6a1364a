//! Session types: configuration, lifecycle phase, and the read-only
//! snapshot handed to the presentation layer.

use std::fmt;
use std::sync::Arc;

use parley_protocol::{RosterEntry, UserId};
use rand::Rng;

use crate::Message;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name to register with. Advisory: the server may substitute its own.
    ///
    /// Default: `None`, which registers as `anon-` followed by eight random
    /// hex digits.
    pub display_name: Option<String>,

    /// An id from an earlier connection to ask the server to reuse.
    pub requested_user_id: Option<UserId>,

    /// Drop incoming messages whose sender is ourselves.
    ///
    /// The server echoes every message back to its sender, but a sent
    /// message is already in the log. Default: `true`.
    pub suppress_echo: bool,
}

impl SessionConfig {
    /// Sets the display name to register with.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the id to ask the server to reuse.
    pub fn with_requested_user_id(mut self, id: impl Into<UserId>) -> Self {
        self.requested_user_id = Some(id.into());
        self
    }

    /// Enables or disables echo suppression.
    pub fn with_suppress_echo(mut self, suppress: bool) -> Self {
        self.suppress_echo = suppress;
        self
    }

    /// The configured display name, or a freshly generated anonymous one.
    pub(crate) fn resolve_display_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => anonymous_name(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: None,
            requested_user_id: None,
            suppress_echo: true,
        }
    }
}

/// `anon-` plus 32 random bits in hex.
fn anonymous_name() -> String {
    let bytes: [u8; 4] = rand::rng().random();
    let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("anon-{suffix}")
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
///   Unregistered ──(registered)──→ Idle ──(chat_started)──→ Paired
///                                   ↑                          │
///                                   └──(chat_ended / end_chat)─┘
///
///   any phase ──(channel closed)──→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connected (or connecting), no identity yet.
    Unregistered,
    /// Registered, not chatting.
    Idle,
    /// Registered and paired with exactly one peer.
    Paired,
    /// The channel closed. Terminal.
    Closed,
}

impl Phase {
    /// Returns `true` if the session has an identity and is still live.
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Idle | Self::Paired)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => write!(f, "Unregistered"),
            Self::Idle => write!(f, "Idle"),
            Self::Paired => write!(f, "Paired"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable point-in-time view of a session, for rendering.
///
/// Roster and messages are shared `Arc`s: taking a snapshot is cheap, and
/// the session never mutates a vector a snapshot still points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Lifecycle phase.
    pub phase: Phase,
    /// Our server-assigned id, once registered.
    pub user_id: Option<UserId>,
    /// Our display name.
    pub display_name: String,
    /// Other connected users, never including ourselves.
    pub roster: Arc<Vec<RosterEntry>>,
    /// The peer we are chatting with.
    pub peer: Option<UserId>,
    /// Messages exchanged with `peer`, in the order this endpoint saw them.
    pub messages: Arc<Vec<Message>>,
}

impl Snapshot {
    /// Looks up a display name in the roster.
    pub fn name_of(&self, id: &UserId) -> Option<&str> {
        self.roster
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert!(config.display_name.is_none());
        assert!(config.requested_user_id.is_none());
        assert!(config.suppress_echo);
    }

    #[test]
    fn test_resolve_display_name_uses_trimmed_name() {
        let config = SessionConfig::default().with_display_name("  Ada ");
        assert_eq!(config.resolve_display_name(), "Ada");
    }

    #[test]
    fn test_resolve_display_name_blank_generates_anonymous() {
        let config = SessionConfig::default().with_display_name("   ");
        let name = config.resolve_display_name();
        assert!(name.starts_with("anon-"));
        assert_eq!(name.len(), "anon-".len() + 8);
        assert!(name["anon-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_phase_is_registered() {
        assert!(!Phase::Unregistered.is_registered());
        assert!(Phase::Idle.is_registered());
        assert!(Phase::Paired.is_registered());
        assert!(!Phase::Closed.is_registered());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Paired.to_string(), "Paired");
        assert_eq!(Phase::Closed.to_string(), "Closed");
    }
}

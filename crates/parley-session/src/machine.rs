//! The session state machine: identity, roster, pairing, and message log
//! for one connection.
//!
//! # Concurrency note
//!
//! `Session` is a plain single-owner value with no interior locking. The
//! client that owns it feeds it one event or intent at a time, so every
//! transition runs to completion before the next one starts.

use std::collections::HashSet;
use std::sync::Arc;

use parley_protocol::{ClientIntent, RosterEntry, ServerEvent, UserId};

use crate::{
    Message, MessageLog, Outbound, Phase, SessionConfig, SessionError,
    Snapshot, Violation,
};

/// What applying a server event did.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed; publish a new snapshot.
    Updated,
    /// Nothing changed (duplicate, stale, or informational event).
    Unchanged,
    /// The event broke a protocol invariant and was dropped.
    Discarded(Violation),
}

impl Outcome {
    /// Returns `true` if state changed.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// One connection's chat state.
///
/// Events from the server go through [`apply`](Self::apply); intents from
/// the user go through [`register`](Self::register),
/// [`start_chat`](Self::start_chat), [`send_message`](Self::send_message)
/// and [`end_chat`](Self::end_chat), which transmit through the
/// [`Outbound`] seam.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ register() ──→ apply(Registered) ──→ start_chat()
///                                                    │
///            apply(ChatStarted) ←────────────────────┘
///                   │
///                   ▼
///   send_message() / apply(MessageReceived) ──→ end_chat() / apply(ChatEnded)
///
///   close() at any point ──→ [Closed]
/// ```
pub struct Session<O> {
    config: SessionConfig,
    outbound: O,
    display_name: String,
    user_id: Option<UserId>,
    registration_sent: bool,
    roster: Arc<Vec<RosterEntry>>,
    peer: Option<UserId>,
    log: MessageLog,
    closed: bool,
}

impl<O: Outbound> Session<O> {
    /// Creates an unregistered session that sends through `outbound`.
    pub fn new(config: SessionConfig, outbound: O) -> Self {
        let display_name = config.resolve_display_name();
        Self {
            config,
            outbound,
            display_name,
            user_id: None,
            registration_sent: false,
            roster: Arc::default(),
            peer: None,
            log: MessageLog::new(),
            closed: false,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        if self.closed {
            Phase::Closed
        } else if self.user_id.is_none() {
            Phase::Unregistered
        } else if self.peer.is_some() {
            Phase::Paired
        } else {
            Phase::Idle
        }
    }

    /// Our server-assigned id, once registered.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Our display name (the server's choice once registered).
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Other connected users.
    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    /// The peer we are chatting with.
    pub fn peer(&self) -> Option<&UserId> {
        self.peer.as_ref()
    }

    /// Messages of the current pairing.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// The outbound this session sends through.
    pub fn outbound(&self) -> &O {
        &self.outbound
    }

    /// An immutable view of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            roster: Arc::clone(&self.roster),
            peer: self.peer.clone(),
            messages: self.log.snapshot(),
        }
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Asks the server for an identity.
    ///
    /// Permitted once, before registration. State changes only when the
    /// server's `registered` reply is applied.
    pub fn register(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if let Some(id) = &self.user_id {
            return Err(SessionError::AlreadyRegistered(id.clone()));
        }
        if self.registration_sent {
            return Err(SessionError::RegistrationPending);
        }

        self.outbound.deliver(&ClientIntent::Register {
            name: self.display_name.clone(),
            user_id: self.config.requested_user_id.clone(),
        })?;
        self.registration_sent = true;
        tracing::info!(name = %self.display_name, "registration requested");
        Ok(())
    }

    /// Asks the server to pair us with `target`.
    ///
    /// Permitted only while idle. Does not change state: the pairing
    /// begins when the server's `chat_started` is applied.
    pub fn start_chat(&mut self, target: &UserId) -> Result<(), SessionError> {
        let local = self.registered_id()?;
        if let Some(peer) = &self.peer {
            return Err(SessionError::NotIdle(peer.clone()));
        }
        if target.as_str().is_empty() || target == local {
            return Err(SessionError::InvalidTarget(target.to_string()));
        }

        self.outbound.deliver(&ClientIntent::StartChat {
            target_id: target.clone(),
        })?;
        tracing::info!(%target, "chat requested");
        Ok(())
    }

    /// Sends `text` to the current peer and appends it to the log.
    ///
    /// The text is trimmed. Nothing is sent or appended unless we are
    /// paired, the trimmed text is non-empty, and the outbound accepts it.
    pub fn send_message(&mut self, text: &str) -> Result<(), SessionError> {
        let local = self.registered_id()?.clone();
        let peer = self.peer.clone().ok_or(SessionError::NotPaired)?;
        let content = text.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.outbound.deliver(&ClientIntent::SendMessage {
            to: peer,
            content: content.to_owned(),
        })?;
        self.log.append(Message::new(local, content));
        Ok(())
    }

    /// Ends the current pairing.
    ///
    /// Local state returns to idle immediately, whether or not the
    /// `end_chat` request could be sent. A failed send is still reported
    /// to the caller, after the reset.
    pub fn end_chat(&mut self) -> Result<(), SessionError> {
        self.registered_id()?;
        let peer = self.peer.take().ok_or(SessionError::NotPaired)?;

        let sent = self.outbound.deliver(&ClientIntent::EndChat {
            target_id: peer.clone(),
        });
        self.log.clear();

        match &sent {
            Ok(()) => tracing::info!(%peer, "chat ended"),
            Err(e) => tracing::warn!(
                %peer, error = %e, "chat ended locally, server not told"
            ),
        }
        sent
    }

    // -----------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------

    /// Applies one decoded server event.
    ///
    /// Never fails: events that would corrupt state come back as
    /// [`Outcome::Discarded`] and are logged here.
    pub fn apply(&mut self, event: ServerEvent) -> Outcome {
        if self.closed {
            tracing::debug!(kind = event.kind(), "event after close ignored");
            return Outcome::Unchanged;
        }

        let outcome = match event {
            ServerEvent::Registered { user_id, name } => {
                self.on_registered(user_id, name)
            }
            ServerEvent::Presence { users } => self.on_presence(users),
            ServerEvent::ChatStarted { pair } => self.on_chat_started(pair),
            ServerEvent::ChatEnded { pair } => {
                self.on_chat_ended(pair.as_deref())
            }
            ServerEvent::MessageReceived { from, content } => {
                self.on_message(from, content)
            }
            ServerEvent::Rejected { reason } => {
                tracing::warn!(%reason, "server rejected a request");
                Outcome::Unchanged
            }
        };

        if let Outcome::Discarded(violation) = &outcome {
            tracing::warn!(%violation, "discarding event");
        }
        outcome
    }

    /// Tears the session down after the channel closed. Terminal.
    pub fn close(&mut self) -> Outcome {
        if self.closed {
            return Outcome::Unchanged;
        }
        self.closed = true;
        self.user_id = None;
        self.registration_sent = false;
        self.roster = Arc::default();
        self.peer = None;
        self.log.clear();
        tracing::info!("session closed");
        Outcome::Updated
    }

    fn registered_id(&self) -> Result<&UserId, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.user_id.as_ref().ok_or(SessionError::NotRegistered)
    }

    fn on_registered(
        &mut self,
        user_id: UserId,
        name: Option<String>,
    ) -> Outcome {
        if let Some(current) = &self.user_id {
            return Outcome::Discarded(Violation::DuplicateRegistration {
                current: current.clone(),
                received: user_id,
            });
        }

        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.display_name = name;
        }
        // A roster that arrived before we knew our id still lists us.
        if self.roster.iter().any(|entry| entry.id == user_id) {
            self.roster = Arc::new(
                self.roster
                    .iter()
                    .filter(|entry| entry.id != user_id)
                    .cloned()
                    .collect(),
            );
        }

        tracing::info!(%user_id, name = %self.display_name, "registered");
        self.user_id = Some(user_id);
        Outcome::Updated
    }

    fn on_presence(&mut self, users: Vec<RosterEntry>) -> Outcome {
        let mut seen = HashSet::new();
        let roster: Vec<RosterEntry> = users
            .into_iter()
            .filter(|entry| self.user_id.as_ref() != Some(&entry.id))
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect();

        tracing::debug!(online = roster.len(), "roster updated");
        self.roster = Arc::new(roster);
        Outcome::Updated
    }

    fn on_chat_started(&mut self, pair: [UserId; 2]) -> Outcome {
        let Some(local) = &self.user_id else {
            return Outcome::Discarded(Violation::Unregistered {
                kind: "chat_started",
            });
        };
        let other = match (&pair[0] == local, &pair[1] == local) {
            (true, false) => pair[1].clone(),
            (false, true) => pair[0].clone(),
            _ => return Outcome::Discarded(Violation::ForeignPairing { pair }),
        };

        match &self.peer {
            Some(peer) if *peer == other => {
                tracing::debug!(%peer, "duplicate chat_started ignored");
                return Outcome::Unchanged;
            }
            Some(peer) => {
                tracing::warn!(previous = %peer, peer = %other, "server replaced pairing");
            }
            None => {}
        }

        self.log.clear();
        tracing::info!(peer = %other, "chat started");
        self.peer = Some(other);
        Outcome::Updated
    }

    fn on_chat_ended(&mut self, pair: Option<&[UserId]>) -> Outcome {
        let Some(peer) = &self.peer else {
            tracing::debug!("chat_ended while idle ignored");
            return Outcome::Unchanged;
        };
        if let Some(pair) = pair {
            let ours = self.user_id.as_ref().is_some_and(|me| pair.contains(me));
            if !ours || !pair.contains(peer) {
                tracing::debug!(%peer, ?pair, "chat_ended for another pairing ignored");
                return Outcome::Unchanged;
            }
        }

        tracing::info!(%peer, "chat ended by server");
        self.peer = None;
        self.log.clear();
        Outcome::Updated
    }

    fn on_message(&mut self, from: UserId, content: String) -> Outcome {
        let from_self = self.user_id.as_ref() == Some(&from);
        if from_self && self.config.suppress_echo {
            tracing::debug!("echo of own message dropped");
            return Outcome::Unchanged;
        }

        let Some(peer) = &self.peer else {
            return Outcome::Discarded(Violation::MessageWhileUnpaired { from });
        };
        if !from_self && from != *peer {
            return Outcome::Discarded(Violation::MessageFromStranger {
                from,
                peer: peer.clone(),
            });
        }

        self.log.append(Message::new(from, content));
        Outcome::Updated
    }
}

// =========================================================================
// Tests
// =========================================================================

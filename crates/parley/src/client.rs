//! `ChatClient` builder and event loop.
//!
//! This is where the layers meet: channel events are decoded by the
//! protocol codec and applied to the session, and session intents are
//! encoded and handed back to the channel.
//!
//! ```text
//! ChannelEvent ──decode_event──→ Session::apply ──→ Snapshot (watch)
//! intent ──→ Session ──→ ChannelOutbound ──encode_intent──→ Channel::send
//! ```

use parley_protocol::{
    ClientIntent, JsonCodec, ProtocolError, RosterEntry, UserId,
    decode_event, encode_intent,
};
use parley_session::{
    Message, Outbound, Outcome, Phase, Session, SessionConfig, SessionError,
    Snapshot,
};
use parley_transport::{
    Channel, ChannelConfig, ChannelEvent, ChannelEvents, ChannelState,
    TransportError, WebSocketChannel,
};
use tokio::sync::watch;

use crate::ParleyError;

/// Where the client connects unless told otherwise.
pub const DEFAULT_URL: &str = "ws://localhost:8000/ws";

/// Sends session intents over a channel as JSON text frames.
struct ChannelOutbound<C> {
    channel: C,
    codec: JsonCodec,
}

impl<C> Outbound for ChannelOutbound<C>
where
    C: Channel<Error = TransportError>,
{
    fn deliver(&self, intent: &ClientIntent) -> Result<(), SessionError> {
        if !self.channel.is_open() {
            return Err(SessionError::ChannelNotReady);
        }
        let frame = encode_intent(&self.codec, intent)
            .map_err(|e| SessionError::Delivery(e.to_string()))?;
        self.channel.send(&frame).map_err(|e| match e {
            TransportError::NotReady(_) => SessionError::ChannelNotReady,
            TransportError::Backpressure => SessionError::Backpressure,
            other => SessionError::Delivery(other.to_string()),
        })?;
        tracing::debug!(
            conn_id = %self.channel.id(),
            kind = intent.kind(),
            "intent sent"
        );
        Ok(())
    }
}

/// What one step of [`ChatClient::next_event`] did.
#[derive(Debug)]
pub enum ClientUpdate {
    /// The channel opened (and registration was requested, if enabled).
    Connected,
    /// A server event was decoded and applied.
    Applied {
        /// The event's wire tag.
        kind: &'static str,
        /// What applying it did.
        outcome: Outcome,
    },
    /// A frame could not be decoded and was dropped.
    Discarded(ProtocolError),
    /// The channel closed. The session is over.
    Disconnected {
        /// Why, when known.
        reason: Option<String>,
    },
}

/// Builder for configuring and connecting a [`ChatClient`].
///
/// # Example
///
/// ```rust,no_run
/// use parley::prelude::*;
///
/// # async fn demo() -> Result<(), ParleyError> {
/// let mut client = ChatClient::builder()
///     .url("ws://localhost:8000/ws")
///     .display_name("Ada")
///     .connect()?;
///
/// while let Some(update) = client.next_event().await {
///     println!("{update:?}: {}", client.phase());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChatClientBuilder {
    url: String,
    session_config: SessionConfig,
    channel_config: ChannelConfig,
    auto_register: bool,
}

impl ChatClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            session_config: SessionConfig::default(),
            channel_config: ChannelConfig::default(),
            auto_register: true,
        }
    }

    /// Sets the server URL.
    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Sets the display name to register with.
    pub fn display_name(mut self, name: &str) -> Self {
        self.session_config = self.session_config.with_display_name(name);
        self
    }

    /// Asks the server to reuse an id from an earlier connection.
    pub fn requested_user_id(mut self, id: &str) -> Self {
        self.session_config = self.session_config.with_requested_user_id(id);
        self
    }

    /// Replaces the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Replaces the channel configuration.
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Whether to send `register` as soon as the channel opens.
    ///
    /// Default: `true`. When off, call [`ChatClient::register`] yourself.
    pub fn auto_register(mut self, enabled: bool) -> Self {
        self.auto_register = enabled;
        self
    }

    /// Starts connecting over WebSocket. Returns before the connection is
    /// established; [`ClientUpdate::Connected`] reports when it is.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(self) -> Result<ChatClient<WebSocketChannel>, ParleyError> {
        let (channel, events) =
            WebSocketChannel::open(self.url.clone(), &self.channel_config)?;
        Ok(self.with_channel(channel, events))
    }

    /// Builds a client over an already-opened channel.
    pub fn with_channel<C: Channel<Error = TransportError>>(
        self,
        channel: C,
        events: ChannelEvents,
    ) -> ChatClient<C> {
        let session = Session::new(
            self.session_config,
            ChannelOutbound {
                channel,
                codec: JsonCodec,
            },
        );
        let (snapshots, _) = watch::channel(session.snapshot());
        ChatClient {
            session,
            events,
            snapshots,
            auto_register: self.auto_register,
            done: false,
        }
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected chat client: one channel, one session.
///
/// The client is driven from a single task. [`next_event`](Self::next_event)
/// is the only `await` point; intents are plain synchronous calls. Every
/// change of state publishes a fresh [`Snapshot`] to
/// [`subscribe`](Self::subscribe)rs.
pub struct ChatClient<C: Channel> {
    session: Session<ChannelOutbound<C>>,
    events: ChannelEvents,
    snapshots: watch::Sender<Snapshot>,
    auto_register: bool,
    done: bool,
}

impl ChatClient<WebSocketChannel> {
    /// Creates a new builder.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }
}

impl<C: Channel<Error = TransportError>> ChatClient<C> {
    /// Waits for the next channel event and applies it.
    ///
    /// Returns `None` once the channel has closed and the final
    /// [`ClientUpdate::Disconnected`] has been returned.
    pub async fn next_event(&mut self) -> Option<ClientUpdate> {
        if self.done {
            return None;
        }
        let event = self.events.recv().await.unwrap_or(ChannelEvent::Closed {
            reason: Some("channel event stream ended".into()),
        });
        Some(self.handle(event))
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Requests an identity. Only needed with `auto_register(false)`.
    pub fn register(&mut self) -> Result<(), ParleyError> {
        self.session.register()?;
        Ok(())
    }

    /// Requests a pairing with `target`.
    pub fn start_chat(&mut self, target: &UserId) -> Result<(), ParleyError> {
        self.session.start_chat(target)?;
        Ok(())
    }

    /// Sends a message to the current peer.
    pub fn send_message(&mut self, text: &str) -> Result<(), ParleyError> {
        self.session.send_message(text)?;
        self.publish();
        Ok(())
    }

    /// Ends the current pairing. Local state resets even if the request
    /// could not be sent.
    pub fn end_chat(&mut self) -> Result<(), ParleyError> {
        let was_paired = self.session.phase() == Phase::Paired;
        let result = self.session.end_chat();
        if was_paired {
            self.publish();
        }
        result.map_err(ParleyError::from)
    }

    /// Closes the connection and ends the session.
    pub fn close(&mut self) {
        self.session.outbound().channel.close();
        if self.session.close().is_updated() {
            self.publish();
        }
    }

    // -----------------------------------------------------------------
    // State
    // -----------------------------------------------------------------

    /// The current state.
    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    /// A receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Current session phase.
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Our server-assigned id, once registered.
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.user_id()
    }

    /// The peer we are chatting with.
    pub fn peer(&self) -> Option<&UserId> {
        self.session.peer()
    }

    /// Other connected users.
    pub fn roster(&self) -> &[RosterEntry] {
        self.session.roster()
    }

    /// Messages of the current pairing.
    pub fn messages(&self) -> &[Message] {
        self.session.log().as_slice()
    }

    /// Lifecycle state of the underlying channel.
    pub fn channel_state(&self) -> ChannelState {
        self.session.outbound().channel.state()
    }

    fn handle(&mut self, event: ChannelEvent) -> ClientUpdate {
        let conn_id = self.session.outbound().channel.id();
        match event {
            ChannelEvent::Opened => {
                tracing::info!(%conn_id, "connected");
                if self.auto_register {
                    if let Err(e) = self.session.register() {
                        tracing::warn!(%conn_id, error = %e, "registration not sent");
                    }
                }
                ClientUpdate::Connected
            }

            ChannelEvent::Frame(text) => {
                match decode_event(&self.session.outbound().codec, text.as_bytes()) {
                    Ok(event) => {
                        let kind = event.kind();
                        tracing::debug!(%conn_id, kind, "event received");
                        let outcome = self.session.apply(event);
                        if outcome.is_updated() {
                            self.publish();
                        }
                        ClientUpdate::Applied { kind, outcome }
                    }
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "discarding frame");
                        ClientUpdate::Discarded(e)
                    }
                }
            }

            ChannelEvent::Closed { reason } => {
                tracing::info!(
                    %conn_id,
                    reason = reason.as_deref().unwrap_or("none"),
                    "disconnected"
                );
                if self.session.close().is_updated() {
                    self.publish();
                }
                self.done = true;
                ClientUpdate::Disconnected { reason }
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}

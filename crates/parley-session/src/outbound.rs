//! The seam between the session and the wire.
//!
//! The session decides *what* to send; an [`Outbound`] implementation
//! decides *how*. The client implements it by encoding the intent and
//! handing the frame to its channel. Tests implement it with a recorder,
//! so the state machine runs without a socket.

use parley_protocol::ClientIntent;

use crate::SessionError;

/// Transmits intents on behalf of a [`Session`](crate::Session).
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
///
/// use parley_protocol::ClientIntent;
/// use parley_session::{Outbound, SessionError};
///
/// /// Remembers every intent instead of sending it.
/// #[derive(Default)]
/// struct Recorder(RefCell<Vec<ClientIntent>>);
///
/// impl Outbound for Recorder {
///     fn deliver(&self, intent: &ClientIntent) -> Result<(), SessionError> {
///         self.0.borrow_mut().push(intent.clone());
///         Ok(())
///     }
/// }
/// ```
pub trait Outbound {
    /// Sends one intent. Must not block.
    ///
    /// # Errors
    /// - [`SessionError::ChannelNotReady`]: the channel is not open
    /// - [`SessionError::Backpressure`]: the channel's send queue is full
    /// - [`SessionError::Delivery`]: encoding failed or the channel
    ///   refused the frame for another reason
    fn deliver(&self, intent: &ClientIntent) -> Result<(), SessionError>;
}

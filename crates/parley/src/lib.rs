//! # Parley
//!
//! Client for presence-based one-to-one real-time chat.
//!
//! Parley connects to a chat server over WebSocket, registers an identity,
//! tracks who else is online, pairs with one of them, and keeps the
//! messages of the current pairing. The work is split across crates:
//!
//! - `parley-transport`: the [`Channel`](prelude::Channel) (connection
//!   lifecycle, text frames)
//! - `parley-protocol`: the JSON wire vocabulary
//! - `parley-session`: the state machine and message log
//!
//! This crate wires them together as a [`ChatClient`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::prelude::*;
//!
//! # async fn run() -> Result<(), ParleyError> {
//! let mut client = ChatClient::builder()
//!     .url(DEFAULT_URL)
//!     .display_name("Ada")
//!     .connect()?;
//!
//! while let Some(update) = client.next_event().await {
//!     if let ClientUpdate::Applied { kind: "chat_started", .. } = update {
//!         client.send_message("hello")?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{ChatClient, ChatClientBuilder, ClientUpdate, DEFAULT_URL};
pub use error::ParleyError;

/// Everything needed to drive a chat client.
pub mod prelude {
    pub use crate::{
        ChatClient, ChatClientBuilder, ClientUpdate, DEFAULT_URL, ParleyError,
    };
    pub use parley_protocol::{
        ClientIntent, ProtocolError, RosterEntry, ServerEvent, UserId,
    };
    pub use parley_session::{
        Message, Outcome, Phase, SessionConfig, SessionError, Snapshot,
        Violation,
    };
    pub use parley_transport::{
        Channel, ChannelConfig, ChannelEvent, ChannelState, TransportError,
        WebSocketChannel,
    };
}

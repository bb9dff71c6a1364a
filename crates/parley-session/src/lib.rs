//! Chat session state for Parley.
//!
//! This crate is the core of the client. It reconciles events pushed by
//! the server with locally held state:
//!
//! 1. **Identity**: the id the server assigned us ([`Session::user_id`])
//! 2. **Roster**: who else is online ([`Session::roster`])
//! 3. **Pairing**: the one peer we are chatting with ([`Session::peer`])
//! 4. **Message log**: what was said in the current pairing ([`MessageLog`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Presentation (above)  ← renders Snapshots, calls intents
//!     ↕
//! Session (this crate)  ← validates intents, applies events
//!     ↕
//! Protocol (below)      ← provides ServerEvent, ClientIntent, UserId
//! ```
//!
//! The session never touches a socket. Intents leave through the
//! [`Outbound`] trait, so the whole state machine can be driven in tests
//! with plain values.

mod error;
mod log;
mod machine;
mod outbound;
mod session;

pub use error::{SessionError, Violation};
pub use log::{Message, MessageLog};
pub use machine::{Outcome, Session};
pub use outbound::Outbound;
pub use session::{Phase, SessionConfig, Snapshot};

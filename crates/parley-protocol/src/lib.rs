//! Wire protocol for Parley.
//!
//! This crate defines the "language" the client and the chat server speak:
//!
//! - **Types** ([`ServerEvent`], [`ClientIntent`], [`UserId`],
//!   [`RosterEntry`]): the frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`decode_event`],
//!   [`encode_intent`]): how frames are converted to/from bytes, and
//!   how a frame's `type` tag is validated before dispatch.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between the channel (raw text frames) and the
//! session (chat state). It doesn't know about sockets or pairings.
//!
//! ```text
//! Channel (frames) → Protocol (ServerEvent) → Session (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, decode_event, encode_intent};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientIntent, RosterEntry, ServerEvent, UserId};

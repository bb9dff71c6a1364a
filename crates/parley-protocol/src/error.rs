//! Error types for the protocol layer.
//!
//! Every variant describes a frame that could not be turned into a
//! [`ServerEvent`](crate::ServerEvent) or an intent that could not be
//! turned into bytes. Decode errors are never fatal to a session: the
//! offending frame is logged and dropped.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: invalid JSON, or a known `type` whose
    /// fields are missing or have the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is a JSON object without a `type` tag.
    #[error("frame has no type tag")]
    MissingType,

    /// The frame's `type` tag is not one this client understands.
    #[error("unknown frame type {0:?}")]
    UnknownType(String),

    /// The message is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

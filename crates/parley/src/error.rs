//! Unified error type for the Parley client.

use parley_protocol::ProtocolError;
use parley_session::SessionError;
use parley_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `parley` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    /// A channel-level error (bad URL, not ready, backpressure).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown frame type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A refused intent (not registered, not paired, empty message).
    #[error(transparent)]
    Session(#[from] SessionError),
}

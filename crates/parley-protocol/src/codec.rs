//! Codec trait, the JSON implementation, and frame-level helpers.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The [`Codec`] trait keeps the rest of the client independent of the
//! serialization format; [`decode_event`] and [`encode_intent`] add the
//! frame rules on top of it (tag validation, text frames).

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{ClientIntent, ProtocolError, ServerEvent};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a codec can live inside a client that is
/// moved into a Tokio task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`), the server's only format.
///
/// ## Example
///
/// ```rust
/// use parley_protocol::{JsonCodec, Codec, ClientIntent, UserId};
///
/// let codec = JsonCodec;
/// let intent = ClientIntent::StartChat { target_id: UserId::new("u2") };
///
/// let bytes = codec.encode(&intent).unwrap();
/// let decoded: ClientIntent = codec.decode(&bytes).unwrap();
/// assert_eq!(intent, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Frame helpers
// ---------------------------------------------------------------------------

/// The parts of a frame needed to route it, read before the full decode.
#[derive(Deserialize)]
struct FrameHeader {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decodes one server frame into a [`ServerEvent`].
///
/// The `type` tag is checked before the full decode so that an unknown
/// tag and a malformed known frame are reported differently:
///
/// - no `type`, but an `error` field → [`ServerEvent::Rejected`]
/// - no `type` at all → [`ProtocolError::MissingType`]
/// - a `type` not in [`ServerEvent::TAGS`] → [`ProtocolError::UnknownType`]
/// - anything else that fails to parse → [`ProtocolError::Decode`]
pub fn decode_event<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<ServerEvent, ProtocolError> {
    let header: FrameHeader = codec.decode(data)?;
    match header.kind {
        None => match header.error {
            Some(reason) => Ok(ServerEvent::Rejected { reason }),
            None => Err(ProtocolError::MissingType),
        },
        Some(kind) if !ServerEvent::TAGS.contains(&kind.as_str()) => {
            Err(ProtocolError::UnknownType(kind))
        }
        Some(_) => codec.decode(data),
    }
}

/// Encodes an intent as the text of one frame.
pub fn encode_intent<C: Codec>(
    codec: &C,
    intent: &ClientIntent,
) -> Result<String, ProtocolError> {
    let bytes = codec.encode(intent)?;
    String::from_utf8(bytes).map_err(|_| {
        ProtocolError::InvalidMessage("encoded frame is not UTF-8".into())
    })
}

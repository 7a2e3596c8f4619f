//! JSON datagram codec for the remote control protocol.
//!
//! Wire format: one UTF-8 JSON object per UDP datagram, no framing, no length
//! prefix.  The object's `"type"` string selects the message kind.
//!
//! Decoding happens in two stages so that the dispatcher can tell apart the
//! three ways a datagram can be unusable:
//!
//! 1. The bytes are not a JSON object with a string `"type"` field, or the
//!    fields of a known kind have the wrong shape → [`ProtocolError::Malformed`].
//! 2. The `"type"` names no known kind → [`ProtocolError::UnknownType`].
//! 3. The `"type"` names a kind only the server sends →
//!    [`ProtocolError::UnexpectedDirection`].
//!
//! The dispatcher needs this split because an unknown type is answered with
//! `"Unauthorized"` before authentication but with `"Unknown message type: …"`
//! afterwards, while a malformed datagram always gets `"Invalid message format"`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{ClientMessage, MessageKind, ServerMessage};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The datagram is not valid JSON, is not an object, has no string
    /// `"type"`, or carries fields of the wrong shape for its kind.
    #[error("malformed datagram: {0}")]
    Malformed(String),

    /// The `"type"` field names no known message kind.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The `"type"` field names a kind that only flows server → client.
    #[error("message type {0} is not accepted from clients")]
    UnexpectedDirection(MessageKind),

    /// A server message could not be serialized.
    #[error("failed to encode {kind}: {source}")]
    Encode {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Returns the raw `"type"` string for errors that carry one.
    ///
    /// Used by the dispatcher to build the `"Unknown message type: …"` reply.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ProtocolError::UnknownType(name) => Some(name),
            ProtocolError::UnexpectedDirection(kind) => Some(kind.as_str()),
            _ => None,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one client datagram into a [`ClientMessage`].
///
/// # Errors
///
/// See the module docs for the three failure classes.
///
/// # Examples
///
/// ```rust
/// use remote_core::protocol::{decode_client_message, ClientMessage};
///
/// let msg = decode_client_message(br#"{"type":"keyboard","key":"enter"}"#).unwrap();
/// assert_eq!(msg, ClientMessage::Keyboard { key: "enter".to_string() });
/// ```
pub fn decode_client_message(bytes: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let type_name = match value.as_object().and_then(|obj| obj.get("type")) {
        Some(Value::String(name)) => name.as_str(),
        Some(_) => return Err(ProtocolError::Malformed("\"type\" is not a string".into())),
        None if value.is_object() => {
            return Err(ProtocolError::Malformed("missing \"type\" field".into()))
        }
        None => return Err(ProtocolError::Malformed("datagram is not a JSON object".into())),
    };

    let kind: MessageKind = type_name
        .parse()
        .map_err(|_| ProtocolError::UnknownType(type_name.to_string()))?;
    if !kind.is_client_to_server() {
        return Err(ProtocolError::UnexpectedDirection(kind));
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encodes a [`ServerMessage`] into the bytes of one datagram.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails, which cannot
/// happen for the message shapes defined in this crate but is surfaced rather
/// than hidden.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(msg).map_err(|source| ProtocolError::Encode {
        kind: msg.kind(),
        source,
    })
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
///
/// A clock set before 1970 yields 0 rather than an error.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ── Tests ─────────────────────────────────────────────────────────────────────

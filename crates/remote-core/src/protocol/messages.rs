//! All remote control protocol message types.
//!
//! Every datagram carries exactly one JSON object with a string `"type"` field
//! that names the message kind.  All other fields sit next to it in the same
//! object, for example:
//!
//! ```json
//! {"type":"mouse_move_relative","dx":0.25,"dy":-0.1}
//! ```
//!
//! Serde's `#[serde(tag = "type")]` attribute handles this layout
//! automatically.
//!
//! # Why separate client→server and server→client enums?
//!
//! The two directions carry different information.  The phone *sends*
//! commands (auth, motion, clicks, keys, frame requests) and the host *sends*
//! replies (auth_response, keepalive_response, frame, error).  Two distinct
//! enums make it a compile-time error to route a reply kind into the command
//! dispatcher, and the dispatcher's `match` over [`ClientMessage`] is checked
//! for exhaustiveness by the compiler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::codec::current_timestamp_ms;

// ── Error texts sent to clients ───────────────────────────────────────────────

/// Fixed `message` strings used in `error` replies.
///
/// The mobile client matches on some of these, so they are part of the wire
/// contract.
pub mod error_text {
    pub const INVALID_FORMAT: &str = "Invalid message format";
    pub const UNAUTHORIZED: &str = "Unauthorized";
    pub const INVALID_CODE: &str = "Invalid connection code";
    pub const SLOT_TAKEN: &str = "Another client is already connected";
    pub const SESSION_TAKEN_OVER: &str = "Session taken over by another client";
    pub const SESSION_EXPIRED: &str = "Session expired due to inactivity";
    pub const SHUTTING_DOWN: &str = "Server is shutting down";
}

// ── Message kinds ─────────────────────────────────────────────────────────────

/// Every message kind the protocol knows about, in both directions.
///
/// The string form (see [`MessageKind::as_str`]) is the value of the JSON
/// `"type"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Auth,
    AuthResponse,
    Error,
    MouseMoveRelative,
    MouseClick,
    Keyboard,
    Keepalive,
    KeepaliveResponse,
    Disconnect,
    Frame,
    RequestFrame,
}

impl MessageKind {
    /// All kinds, in declaration order.
    pub const ALL: [MessageKind; 11] = [
        MessageKind::Auth,
        MessageKind::AuthResponse,
        MessageKind::Error,
        MessageKind::MouseMoveRelative,
        MessageKind::MouseClick,
        MessageKind::Keyboard,
        MessageKind::Keepalive,
        MessageKind::KeepaliveResponse,
        MessageKind::Disconnect,
        MessageKind::Frame,
        MessageKind::RequestFrame,
    ];

    /// Returns the wire name used in the `"type"` field.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Auth => "auth",
            MessageKind::AuthResponse => "auth_response",
            MessageKind::Error => "error",
            MessageKind::MouseMoveRelative => "mouse_move_relative",
            MessageKind::MouseClick => "mouse_click",
            MessageKind::Keyboard => "keyboard",
            MessageKind::Keepalive => "keepalive",
            MessageKind::KeepaliveResponse => "keepalive_response",
            MessageKind::Disconnect => "disconnect",
            MessageKind::Frame => "frame",
            MessageKind::RequestFrame => "request_frame",
        }
    }

    /// Returns `true` for kinds a client is allowed to send to the server.
    pub fn is_client_to_server(self) -> bool {
        matches!(
            self,
            MessageKind::Auth
                | MessageKind::MouseMoveRelative
                | MessageKind::MouseClick
                | MessageKind::Keyboard
                | MessageKind::Keepalive
                | MessageKind::Disconnect
                | MessageKind::RequestFrame
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

// ── Client → server ───────────────────────────────────────────────────────────

/// Which mouse click a `mouse_click` message asks for.
///
/// Absent, `null`, or unrecognised values all mean a plain left click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickType {
    Right,
    Double,
    #[default]
    #[serde(other)]
    Left,
}

impl ClickType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClickType::Left => "left",
            ClickType::Right => "right",
            ClickType::Double => "double",
        }
    }
}

fn click_type_or_left<'de, D>(deserializer: D) -> Result<ClickType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ClickType>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts any JSON value for the auth code.  Only a string can ever match,
/// so numbers, booleans and objects are read as "no code".
fn code_text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(code)) => Ok(Some(code)),
        _ => Ok(None),
    }
}

/// All messages a client may send to the server.
///
/// # Serde representation
///
/// ```json
/// {"type":"auth","code":"AB12CD"}
/// {"type":"mouse_move_relative","dx":0.3,"dy":0.0}
/// {"type":"mouse_click","click_type":"double"}
/// {"type":"keyboard","key":"enter"}
/// {"type":"keepalive"}
/// {"type":"request_frame"}
/// {"type":"disconnect"}
/// ```
///
/// Extra fields are ignored.  Missing optional fields take the defaults shown
/// on each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Presents the pairing code.  A missing or non-string code never matches.
    Auth {
        #[serde(default, deserialize_with = "code_text_or_none")]
        code: Option<String>,
    },

    /// Raw relative motion from the phone's motion sensors.  Missing axes are 0.
    MouseMoveRelative {
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
    },

    MouseClick {
        #[serde(default, deserialize_with = "click_type_or_left")]
        click_type: ClickType,
    },

    /// A single key press by name.  An empty name is accepted and ignored.
    Keyboard {
        #[serde(default)]
        key: String,
    },

    Keepalive,

    /// Pulls one screen frame.
    RequestFrame,

    Disconnect,
}

impl ClientMessage {
    /// Returns the kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            ClientMessage::Auth { .. } => MessageKind::Auth,
            ClientMessage::MouseMoveRelative { .. } => MessageKind::MouseMoveRelative,
            ClientMessage::MouseClick { .. } => MessageKind::MouseClick,
            ClientMessage::Keyboard { .. } => MessageKind::Keyboard,
            ClientMessage::Keepalive => MessageKind::Keepalive,
            ClientMessage::RequestFrame => MessageKind::RequestFrame,
            ClientMessage::Disconnect => MessageKind::Disconnect,
        }
    }
}

// ── Server → client ───────────────────────────────────────────────────────────

/// Outcome reported in an `auth_response`.
///
/// Failures are reported as `error` messages instead, so `success` is the
/// only value ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Success,
}

/// All messages the server sends to clients.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthResponse { status: AuthStatus, timestamp: u64 },

    Error { message: String, timestamp: u64 },

    KeepaliveResponse { timestamp: u64 },

    /// A JPEG screen frame, base64 encoded.
    ///
    /// When the encoded frame does not fit in one datagram, `data` holds one
    /// piece of it and the three chunk fields describe how to reassemble the
    /// pieces.  Single-datagram frames omit the chunk fields entirely.
    Frame {
        data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame_id: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chunk_index: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chunk_count: Option<u32>,
    },
}

impl ServerMessage {
    /// Builds a successful `auth_response` stamped with the current time.
    pub fn auth_success() -> Self {
        ServerMessage::AuthResponse {
            status: AuthStatus::Success,
            timestamp: current_timestamp_ms(),
        }
    }

    /// Builds an `error` reply stamped with the current time.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            timestamp: current_timestamp_ms(),
        }
    }

    /// Builds a `keepalive_response` stamped with the current time.
    pub fn keepalive_response() -> Self {
        ServerMessage::KeepaliveResponse {
            timestamp: current_timestamp_ms(),
        }
    }

    /// Builds a single-datagram `frame`.
    pub fn frame(data: String) -> Self {
        ServerMessage::Frame {
            data,
            frame_id: None,
            chunk_index: None,
            chunk_count: None,
        }
    }

    /// Returns the kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::AuthResponse { .. } => MessageKind::AuthResponse,
            ServerMessage::Error { .. } => MessageKind::Error,
            ServerMessage::KeepaliveResponse { .. } => MessageKind::KeepaliveResponse,
            ServerMessage::Frame { .. } => MessageKind::Frame,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! # remote-core
//!
//! Shared library for the remote control server containing the datagram wire
//! protocol, the session store, the pairing secret and the relative-motion
//! filter.
//!
//! It has zero dependencies on OS APIs, sockets, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A phone (the "client") pairs with a desktop computer (the "host") by
//! scanning a QR code that contains a short pairing code plus the host's IP
//! address and UDP port.  The phone then sends small JSON datagrams to the
//! host: "move the pointer by this much", "click", "press this key", "send me
//! a screenshot".
//!
//! This crate is the pure foundation of that exchange:
//!
//! - **`protocol`** – The JSON message types, the codec that turns raw
//!   datagram bytes into typed Rust enums (and back), and the helpers that
//!   base64-encode a screen frame and split it into datagram-sized pieces.
//!
//! - **`domain`** – Business rules with no I/O: the pairing secret, the
//!   per-endpoint session store with its single-session policy, and the
//!   motion filter that turns noisy sensor deltas into pixel moves.
//!
//! - **`keymap`** – Translation of client key names (`"enter"`, `"f5"`, `"a"`)
//!   into a canonical [`keymap::Key`] and from there into X11 KeySyms.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `remote_core::SessionStore` instead of `remote_core::domain::session::SessionStore`.
pub use domain::motion::{MotionConfig, MotionFilter, PixelDelta, ScreenSize};
pub use domain::pairing::{PairingError, PairingPayload, PairingSecret};
pub use domain::session::{AuthGrant, Session, SessionError, SessionPolicy, SessionStore};
pub use keymap::{Key, KeyError};
pub use protocol::codec::{decode_client_message, encode_server_message, ProtocolError};
pub use protocol::frame::{encode_base64, frame_messages};
pub use protocol::messages::{ClickType, ClientMessage, MessageKind, ServerMessage};

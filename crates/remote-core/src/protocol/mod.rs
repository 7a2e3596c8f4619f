//! Protocol module containing message types, the JSON datagram codec, and the
//! frame payload helpers.

pub mod codec;
pub mod frame;
pub mod messages;

pub use codec::{current_timestamp_ms, decode_client_message, encode_server_message, ProtocolError};
pub use frame::{encode_base64, frame_messages};
pub use messages::*;

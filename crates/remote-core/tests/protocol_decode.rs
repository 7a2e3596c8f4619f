//! Integration tests for the remote-core datagram codec.
//!
//! The fixtures are datagrams as the mobile client actually sends them,
//! including the extra fields and loose typing real clients produce.

use remote_core::protocol::messages::error_text;
use remote_core::{
    decode_client_message, encode_server_message, ClickType, ClientMessage, MessageKind,
    ProtocolError, ServerMessage,
};
use serde_json::Value;

fn decode_str(json: &str) -> Result<ClientMessage, ProtocolError> {
    decode_client_message(json.as_bytes())
}

#[test]
fn test_every_client_kind_decodes() {
    let cases = [
        (r#"{"type":"auth","code":"K7Q2ZP"}"#, MessageKind::Auth),
        (
            r#"{"type":"mouse_move_relative","dx":0.12,"dy":-0.4}"#,
            MessageKind::MouseMoveRelative,
        ),
        (
            r#"{"type":"mouse_click","click_type":"right"}"#,
            MessageKind::MouseClick,
        ),
        (r#"{"type":"keyboard","key":"f5"}"#, MessageKind::Keyboard),
        (r#"{"type":"keepalive"}"#, MessageKind::Keepalive),
        (r#"{"type":"request_frame"}"#, MessageKind::RequestFrame),
        (r#"{"type":"disconnect"}"#, MessageKind::Disconnect),
    ];

    for (json, kind) in cases {
        let msg = decode_str(json).unwrap_or_else(|e| panic!("{json} failed: {e}"));
        assert_eq!(msg.kind(), kind, "{json}");
    }
}

#[test]
fn test_auth_without_code_decodes_to_none() {
    assert_eq!(
        decode_str(r#"{"type":"auth"}"#).unwrap(),
        ClientMessage::Auth { code: None }
    );
}

#[test]
fn test_integer_motion_values_are_accepted() {
    assert_eq!(
        decode_str(r#"{"type":"mouse_move_relative","dx":1,"dy":-2}"#).unwrap(),
        ClientMessage::MouseMoveRelative { dx: 1.0, dy: -2.0 }
    );
}

#[test]
fn test_double_click_decodes() {
    assert_eq!(
        decode_str(r#"{"type":"mouse_click","click_type":"double","ts":99}"#).unwrap(),
        ClientMessage::MouseClick {
            click_type: ClickType::Double
        }
    );
}

#[test]
fn test_keyboard_without_key_is_empty_name() {
    assert_eq!(
        decode_str(r#"{"type":"keyboard"}"#).unwrap(),
        ClientMessage::Keyboard { key: String::new() }
    );
}

#[test]
fn test_garbage_bytes_are_malformed() {
    let inputs: [&[u8]; 5] = [b"", b"\xff\xfe", b"{", b"null", b"\"auth\""];
    for bytes in inputs {
        let err = decode_client_message(bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)), "{bytes:?}: {err:?}");
    }
}

#[test]
fn test_unknown_and_reply_kinds_are_distinguished_from_malformed() {
    assert!(matches!(
        decode_str(r#"{"type":"teleport"}"#),
        Err(ProtocolError::UnknownType(name)) if name == "teleport"
    ));
    assert!(matches!(
        decode_str(r#"{"type":"auth_response","status":"success"}"#),
        Err(ProtocolError::UnexpectedDirection(MessageKind::AuthResponse))
    ));
}

#[test]
fn test_encoded_replies_parse_as_single_json_objects() {
    let replies = [
        ServerMessage::auth_success(),
        ServerMessage::keepalive_response(),
        ServerMessage::error(error_text::UNAUTHORIZED),
        ServerMessage::frame("/9j/4AAQ".to_string()),
    ];

    for reply in replies {
        let bytes = encode_server_message(&reply).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], reply.kind().as_str());
    }
}

#[test]
fn test_chunked_frame_carries_chunk_fields() {
    let reply = ServerMessage::Frame {
        data: "AAAA".to_string(),
        frame_id: Some(3),
        chunk_index: Some(0),
        chunk_count: Some(2),
    };

    let value: Value = serde_json::from_slice(&encode_server_message(&reply).unwrap()).unwrap();

    assert_eq!(value["frame_id"], 3);
    assert_eq!(value["chunk_index"], 0);
    assert_eq!(value["chunk_count"], 2);
}

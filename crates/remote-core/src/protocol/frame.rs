//! Frame payload helpers: base64 text encoding and datagram chunking.
//!
//! A captured screen frame travels as JPEG bytes encoded with the standard
//! base64 alphabet (RFC 4648 §4, padded) inside the `data` field of a
//! `frame` message.  A 50 %-scaled desktop at quality 50 usually fits in one
//! datagram; when it does not, [`frame_messages`] splits the text into
//! ordered pieces that each fit.
//!
//! # Chunk layout
//!
//! ```text
//! {"type":"frame","data":"<piece 0>","frame_id":7,"chunk_index":0,"chunk_count":3}
//! {"type":"frame","data":"<piece 1>","frame_id":7,"chunk_index":1,"chunk_count":3}
//! {"type":"frame","data":"<piece 2>","frame_id":7,"chunk_index":2,"chunk_count":3}
//! ```
//!
//! The receiver concatenates the pieces of one `frame_id` in `chunk_index`
//! order and decodes the result as a whole.

use crate::protocol::messages::ServerMessage;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Bytes of `{"type":"frame","data":""}`, the envelope around a single frame.
const SINGLE_ENVELOPE_BYTES: usize = 26;

/// Upper bound on the envelope of a chunked frame: the single envelope plus
/// the three chunk fields with ten-digit values, rounded up.
const CHUNK_ENVELOPE_BYTES: usize = 128;

/// Encodes `data` as padded standard base64.
pub fn encode_base64(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    let sextet = |v: u32, shift: u32| BASE64_ALPHABET[((v >> shift) & 0x3F) as usize] as char;

    let mut groups = data.chunks_exact(3);
    for group in &mut groups {
        let v = u32::from(group[0]) << 16 | u32::from(group[1]) << 8 | u32::from(group[2]);
        out.extend([sextet(v, 18), sextet(v, 12), sextet(v, 6), sextet(v, 0)]);
    }

    match *groups.remainder() {
        [a] => {
            let v = u32::from(a) << 16;
            out.extend([sextet(v, 18), sextet(v, 12), '=', '=']);
        }
        [a, b] => {
            let v = u32::from(a) << 16 | u32::from(b) << 8;
            out.extend([sextet(v, 18), sextet(v, 12), sextet(v, 6), '=']);
        }
        _ => {}
    }
    out
}

/// Wraps base64 frame text in one or more `frame` messages, none of which
/// encodes to more than `max_datagram_bytes`.
///
/// Text that fits is returned as a single message without chunk fields.
/// Otherwise every piece carries `frame_id`, its `chunk_index` and the shared
/// `chunk_count`.  `data` must be ASCII, which base64 always is.
pub fn frame_messages(data: String, frame_id: u32, max_datagram_bytes: usize) -> Vec<ServerMessage> {
    if data.len() + SINGLE_ENVELOPE_BYTES <= max_datagram_bytes {
        return vec![ServerMessage::frame(data)];
    }

    let piece_len = max_datagram_bytes.saturating_sub(CHUNK_ENVELOPE_BYTES).max(1);
    let chunk_count = data.len().div_ceil(piece_len);
    let chunk_count_u32 = u32::try_from(chunk_count).unwrap_or(u32::MAX);

    data.as_bytes()
        .chunks(piece_len)
        .zip(0u32..)
        .map(|(piece, chunk_index)| ServerMessage::Frame {
            data: String::from_utf8_lossy(piece).into_owned(),
            frame_id: Some(frame_id),
            chunk_index: Some(chunk_index),
            chunk_count: Some(chunk_count_u32),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode_server_message;

    #[test]
    fn test_base64_rfc4648_vectors() {
        assert_eq!(encode_base64(b""), "");
        assert_eq!(encode_base64(b"f"), "Zg==");
        assert_eq!(encode_base64(b"fo"), "Zm8=");
        assert_eq!(encode_base64(b"foo"), "Zm9v");
        assert_eq!(encode_base64(b"foob"), "Zm9vYg==");
        assert_eq!(encode_base64(b"fooba"), "Zm9vYmE=");
        assert_eq!(encode_base64(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn test_base64_uses_plus_and_slash() {
        assert_eq!(encode_base64(&[0xFB, 0xFF, 0xBF]), "+/+/");
    }

    #[test]
    fn test_jpeg_magic_encodes_to_known_prefix() {
        // Every JPEG starts with FF D8 FF, which base64-encodes to "/9j/".
        assert!(encode_base64(&[0xFF, 0xD8, 0xFF, 0xE0]).starts_with("/9j/"));
    }

    #[test]
    fn test_small_frame_is_single_message_without_chunk_fields() {
        // Arrange
        let data = "A".repeat(100);

        // Act
        let messages = frame_messages(data.clone(), 1, 60_000);

        // Assert
        assert_eq!(messages, vec![ServerMessage::frame(data)]);
    }

    #[test]
    fn test_exact_fit_is_not_chunked() {
        let data = "A".repeat(1000 - SINGLE_ENVELOPE_BYTES);
        let messages = frame_messages(data, 1, 1000);
        assert_eq!(messages.len(), 1);
        assert_eq!(encode_server_message(&messages[0]).unwrap().len(), 1000);
    }

    #[test]
    fn test_large_frame_is_chunked_in_order() {
        // Arrange: 2500 chars with 1000-byte datagrams → 872-char pieces → 3 chunks
        let data: String = (0..2500).map(|i| (b'A' + (i % 26) as u8) as char).collect();

        // Act
        let messages = frame_messages(data.clone(), 42, 1000);

        // Assert
        assert_eq!(messages.len(), 3);
        let mut rebuilt = String::new();
        for (i, msg) in messages.iter().enumerate() {
            match msg {
                ServerMessage::Frame {
                    data,
                    frame_id,
                    chunk_index,
                    chunk_count,
                } => {
                    assert_eq!(*frame_id, Some(42));
                    assert_eq!(*chunk_index, Some(i as u32));
                    assert_eq!(*chunk_count, Some(3));
                    rebuilt.push_str(data);
                }
                other => panic!("expected Frame, got {other:?}"),
            }
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn test_every_chunk_fits_the_datagram_limit() {
        let data = "Q".repeat(200_000);
        for msg in frame_messages(data, u32::MAX, 60_000) {
            let len = encode_server_message(&msg).unwrap().len();
            assert!(len <= 60_000, "chunk encodes to {len} bytes");
        }
    }
}

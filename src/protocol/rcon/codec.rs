//! RCON wire format.
//!
//! Every frame is `size:i32 LE | id:i32 LE | type:i32 LE | body | 0x00 0x00`,
//! where `size` counts everything after the size field itself.

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::common::error::ConsoleError;

/// Client -> server: authenticate with the RCON password.
pub const SERVERDATA_AUTH: i32 = 3;
/// Client -> server: run a console command.
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
/// Server -> client: result of an auth request.
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
/// Server -> client: command output.
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// Id the server answers with when the password is wrong.
pub const AUTH_FAILED_ID: i32 = -1;

/// Smallest valid size field: id + type + two terminators.
const MIN_FRAME_SIZE: usize = 10;
/// Largest size field accepted in either direction.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconPacket {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl RconPacket {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }
}

/// Codec for RCON frames.
#[derive(Debug, Default)]
pub struct RconCodec;

impl Decoder for RconCodec {
    type Item = RconPacket;
    type Error = ConsoleError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let size = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let size = usize::try_from(size).unwrap_or(0);
        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&size) {
            return Err(ConsoleError::Protocol {
                message: format!("frame size {} out of range", size),
            });
        }

        if src.len() < 4 + size {
            src.reserve(4 + size - src.len());
            return Ok(None);
        }

        src.advance(4);
        let id = src.get_i32_le();
        let kind = src.get_i32_le();
        let body = src.split_to(size - MIN_FRAME_SIZE);
        src.advance(2);

        Ok(Some(RconPacket {
            id,
            kind,
            body: String::from_utf8_lossy(&body).into_owned(),
        }))
    }
}

impl Encoder<RconPacket> for RconCodec {
    type Error = ConsoleError;

    fn encode(&mut self, item: RconPacket, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = MIN_FRAME_SIZE + item.body.len();
        if size > MAX_FRAME_SIZE {
            return Err(ConsoleError::Protocol {
                message: format!("command of {} bytes is too long", item.body.len()),
            });
        }

        dst.reserve(4 + size);
        dst.put_i32_le(size as i32);
        dst.put_i32_le(item.id);
        dst.put_i32_le(item.kind);
        dst.put_slice(item.body.as_bytes());
        dst.put_u8(0);
        dst.put_u8(0);

        Ok(())
    }
}

/// A framed RCON connection.
pub type RconFramed<S> = Framed<S, RconCodec>;

pub fn new_rcon_framed<S: AsyncRead + AsyncWrite>(stream: S) -> RconFramed<S> {
    Framed::new(stream, RconCodec)
}

/// Encode a frame to raw bytes.
#[cfg(test)]
pub fn frame_bytes(id: i32, kind: i32, body: &str) -> Vec<u8> {
    let mut buf = BytesMut::new();
    RconCodec
        .encode(RconPacket::new(id, kind, body), &mut buf)
        .expect("test frame fits");
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = frame_bytes(7, SERVERDATA_EXECCOMMAND, "/seed");
        assert_eq!(
            bytes,
            vec![
                15, 0, 0, 0, // size
                7, 0, 0, 0, // id
                2, 0, 0, 0, // type
                b'/', b's', b'e', b'e', b'd', 0, 0,
            ]
        );
    }

    #[test]
    fn test_decode_waits_for_full_frame() {
        let bytes = frame_bytes(1, SERVERDATA_RESPONSE_VALUE, "Online players (2):");
        let mut codec = RconCodec;

        let mut buf = BytesMut::from(&bytes[..3]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&bytes[3..bytes.len() - 1]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&bytes[bytes.len() - 1..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(RconPacket::new(1, SERVERDATA_RESPONSE_VALUE, "Online players (2):"))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_back_to_back_frames() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame_bytes(1, SERVERDATA_RESPONSE_VALUE, ""));
        buf.extend_from_slice(&frame_bytes(1, SERVERDATA_AUTH_RESPONSE, ""));
        let mut codec = RconCodec;

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().kind, SERVERDATA_RESPONSE_VALUE);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().kind, SERVERDATA_AUTH_RESPONSE);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_bad_sizes() {
        let mut codec = RconCodec;

        let mut short = BytesMut::from(&9i32.to_le_bytes()[..]);
        assert!(matches!(codec.decode(&mut short), Err(ConsoleError::Protocol { .. })));

        let mut negative = BytesMut::from(&(-5i32).to_le_bytes()[..]);
        assert!(matches!(codec.decode(&mut negative), Err(ConsoleError::Protocol { .. })));

        let huge = (MAX_FRAME_SIZE as i32) + 1;
        let mut oversized = BytesMut::from(&huge.to_le_bytes()[..]);
        assert!(matches!(codec.decode(&mut oversized), Err(ConsoleError::Protocol { .. })));
    }

    #[test]
    fn test_encode_rejects_oversized_command() {
        let mut buf = BytesMut::new();
        let body = "x".repeat(MAX_FRAME_SIZE);
        let result = RconCodec.encode(RconPacket::new(1, SERVERDATA_EXECCOMMAND, body), &mut buf);
        assert!(matches!(result, Err(ConsoleError::Protocol { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_replaces_invalid_utf8() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(12);
        buf.put_i32_le(3);
        buf.put_i32_le(SERVERDATA_RESPONSE_VALUE);
        buf.put_slice(&[b'a', 0xff, 0, 0]);

        let packet = RconCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(packet.body, "a\u{FFFD}");
    }
}

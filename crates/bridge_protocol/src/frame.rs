use bytes::{Buf, BufMut, BytesMut};

use crate::error::DecodeError;

/// Natural limit of the `u16` size prefix; also the recommended cap.
pub const MAX_PACKET_SIZE: u16 = u16::MAX;

const HEADER_LEN: usize = 3;

/// One fully-framed packet: its type byte and payload (header stripped).
#[derive(Clone, Debug)]
pub struct Frame {
    pub ty: u8,
    pub body: BytesMut,
}

/// Incrementally decodes packets out of a growing byte buffer.
///
/// Feed bytes in with [`queue_bytes`](Self::queue_bytes), then call
/// [`try_next_frame`](Self::try_next_frame) in a loop until it returns
/// `Ok(None)` (need more data) or an error (which poisons the stream — the
/// caller should close the connection).
#[derive(Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly-read bytes to the internal buffer.
    pub fn queue_bytes(&mut self, bytes: BytesMut) {
        self.buf.unsplit(bytes);
    }

    /// Reserves capacity and hands back a writable tail for the next
    /// `AsyncRead`, mirroring the zero-copy read pattern of splitting off
    /// spare capacity and re-queuing it after the read completes.
    pub fn reserve(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    pub fn take_capacity(&mut self) -> BytesMut {
        self.buf.split_off(self.buf.len())
    }

    /// Attempts to decode one frame from the buffered bytes.
    ///
    /// Returns `Ok(None)` if the buffer doesn't yet hold a complete frame.
    /// Returns `Err` if the framing itself is malformed (bad size prefix);
    /// this is fatal to the stream.
    pub fn try_next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        if self.buf.len() < 2 {
            return Ok(None);
        }

        let size = u16::from_le_bytes([self.buf[0], self.buf[1]]);

        if size < HEADER_LEN as u16 {
            return Err(DecodeError::TooSmall { size });
        }
        if size > MAX_PACKET_SIZE {
            return Err(DecodeError::TooLarge {
                size,
                max: MAX_PACKET_SIZE,
            });
        }

        if self.buf.len() < size as usize {
            // Truncated final packet; wait for more data or a timeout.
            return Ok(None);
        }

        let mut frame_bytes = self.buf.split_to(size as usize);
        frame_bytes.advance(2);
        let ty = frame_bytes.get_u8();

        Ok(Some(Frame {
            ty,
            body: frame_bytes,
        }))
    }
}

/// Encodes one outgoing packet as contiguous wire bytes.
///
/// Fails if `3 + payload.len()` would not fit in a `u16`.
pub fn encode_frame(ty: u8, payload: &[u8]) -> Result<BytesMut, DecodeError> {
    let total_len = HEADER_LEN + payload.len();
    let size: u16 = total_len
        .try_into()
        .map_err(|_| DecodeError::TooLarge {
            size: u16::MAX,
            max: MAX_PACKET_SIZE,
        })?;

    let mut out = BytesMut::with_capacity(total_len);
    out.put_u16_le(size);
    out.put_u8(ty);
    out.put_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_frame_round_trips() {
        let wire = encode_frame(42, &[]).unwrap();
        assert_eq!(&wire[..], &[3, 0, 42]);

        let mut dec = FrameDecoder::new();
        dec.queue_bytes(wire);
        let frame = dec.try_next_frame().unwrap().unwrap();
        assert_eq!(frame.ty, 42);
        assert!(frame.body.is_empty());
        assert!(dec.try_next_frame().unwrap().is_none());
    }

    #[test]
    fn needs_more_on_truncated_frame() {
        let wire = encode_frame(5, b"hello").unwrap();
        let mut dec = FrameDecoder::new();
        dec.queue_bytes(BytesMut::from(&wire[..4]));
        assert!(dec.try_next_frame().unwrap().is_none());

        dec.queue_bytes(BytesMut::from(&wire[4..]));
        let frame = dec.try_next_frame().unwrap().unwrap();
        assert_eq!(frame.ty, 5);
        assert_eq!(&frame.body[..], b"hello");
    }

    #[test]
    fn size_below_header_len_is_an_error() {
        let mut dec = FrameDecoder::new();
        dec.queue_bytes(BytesMut::from(&[2u8, 0, 9][..]));
        assert!(matches!(
            dec.try_next_frame(),
            Err(DecodeError::TooSmall { size: 2 })
        ));
    }

    #[test]
    fn two_frames_back_to_back_decode_independently() {
        let mut wire = encode_frame(1, b"a").unwrap();
        wire.unsplit(encode_frame(2, b"bc").unwrap());

        let mut dec = FrameDecoder::new();
        dec.queue_bytes(wire);

        let f1 = dec.try_next_frame().unwrap().unwrap();
        assert_eq!(f1.ty, 1);
        assert_eq!(&f1.body[..], b"a");

        let f2 = dec.try_next_frame().unwrap().unwrap();
        assert_eq!(f2.ty, 2);
        assert_eq!(&f2.body[..], b"bc");
    }
}

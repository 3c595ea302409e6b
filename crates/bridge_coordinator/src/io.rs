use bridge_protocol::{encode_frame, DecodeError, Frame, FrameDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const READ_BUF_SIZE: usize = 4096;

/// Thin wrapper pairing a [`TcpStream`] with a [`FrameDecoder`].
///
/// Mirrors the read-loop-until-a-frame-decodes pattern used throughout this
/// codebase's connection handling: reserve capacity, read into it, queue it
/// back into the decoder, and retry.
pub struct CoordinatorIo {
    stream: TcpStream,
    dec: FrameDecoder,
}

impl CoordinatorIo {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            dec: FrameDecoder::new(),
        }
    }

    pub async fn send_frame(&mut self, ty: u8, payload: &[u8]) -> std::io::Result<()> {
        let wire = encode_frame(ty, payload)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.stream.write_all(&wire).await
    }

    /// Reads from the socket until one full frame is available.
    ///
    /// Returns `Ok(None)` on a clean EOF. Bubbles up a [`DecodeError`] if the
    /// framing itself is malformed.
    pub async fn recv_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        loop {
            if let Some(frame) = self.dec.try_next_frame()? {
                return Ok(Some(frame));
            }

            self.dec.reserve(READ_BUF_SIZE);
            let mut buf = self.dec.take_capacity();

            match self.stream.read_buf(&mut buf).await {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(_) => return Ok(None),
            }

            self.dec.queue_bytes(buf);
        }
    }
}

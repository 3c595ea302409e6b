use crate::error::DecodeError;

/// A bounds-checked reader over a single packet's payload.
///
/// Every `read_*` method either advances the cursor and returns the decoded
/// value, or returns [`DecodeError::UnexpectedEof`]/[`DecodeError::UnterminatedString`]
/// without advancing past the end of the slice. Field readers never panic.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes left unread.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                wanted: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, DecodeError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.take(n)
    }

    pub fn read_md5(&mut self) -> Result<[u8; 16], DecodeError> {
        let b = self.take(16)?;
        let mut out = [0u8; 16];
        out.copy_from_slice(b);
        Ok(out)
    }

    /// Reads bytes up to (and consuming) the next `0x00`, decoding them as
    /// UTF-8. A missing terminator before the end of the payload is an
    /// error.
    pub fn read_zstring(&mut self) -> Result<String, DecodeError> {
        let rest = &self.buf[self.pos..];
        let nul_offset = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::UnterminatedString)?;

        let s = std::str::from_utf8(&rest[..nul_offset]).map_err(DecodeError::InvalidUtf8)?;
        let owned = s.to_owned();
        self.pos += nul_offset + 1;
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_in_order() {
        let data = [0x01, 0x02, 0x00, 0x34, 0x12, b'h', b'i', 0x00];
        let mut c = Cursor::new(&data);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.read_u16_le().unwrap(), 0x0002);
        assert_eq!(c.read_u16_le().unwrap(), 0x1234);
        assert_eq!(c.read_zstring().unwrap(), "hi");
        assert!(c.is_empty());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let data = [b'h', b'i'];
        let mut c = Cursor::new(&data);
        assert!(matches!(
            c.read_zstring(),
            Err(DecodeError::UnterminatedString)
        ));
    }

    #[test]
    fn reading_past_end_is_an_error() {
        let data = [0x01];
        let mut c = Cursor::new(&data);
        assert!(matches!(
            c.read_u32_le(),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}

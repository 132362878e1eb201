use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::protocol::SendError;

pub const CRLF: &[u8] = b"\r\n";
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Chunked transfer encoding framing for an outbound body.
///
/// Every chunk is `<hex-size>\r\n<data>\r\n`. The caller writes the data and
/// its trailing CRLF itself so large payloads are never copied. The body ends
/// with the zero-size chunk `0\r\n\r\n`, which is emitted at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }

    /// Writes the size line that precedes `size` bytes of chunk data.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Disposed`] once the terminal chunk was written.
    pub fn encode_size(&self, size: usize, dst: &mut BytesMut) -> Result<(), SendError> {
        if self.eof {
            return Err(SendError::Disposed);
        }
        write!(helper::Writer(dst), "{size:x}\r\n")?;
        Ok(())
    }

    /// Writes the terminal chunk unless it was already written.
    ///
    /// Returns true if the terminal chunk was written by this call.
    pub fn encode_eof(&mut self, dst: &mut BytesMut) -> bool {
        if self.eof {
            return false;
        }
        self.eof = true;
        dst.put_slice(LAST_CHUNK);
        true
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

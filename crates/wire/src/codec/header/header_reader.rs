//! Header block reader for HTTP messages read straight off a byte stream.
//!
//! The reader pulls one byte at a time until the blank line ending the header
//! block, so no byte of the entity body is consumed. Wrap the stream in a
//! `tokio::io::BufReader` if per-byte reads hit the socket directly and the
//! body is read through the same buffered reader.
//!
//! # Limits
//!
//! - Maximum header block size: 8KB by default
//!
//! # Output
//!
//! The raw block is decoded as UTF-8 (invalid sequences are replaced), folded
//! continuation lines are merged into their field, and the result is split into
//! non-empty lines: the start line followed by one line per header field.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::protocol::ParseError;

/// Default maximum size in bytes allowed for the entire header block
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Reads a header block and returns its unfolded lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderReader {
    max_bytes: usize,
}

impl Default for HeaderReader {
    fn default() -> Self {
        Self::new(MAX_HEADER_BYTES)
    }
}

impl HeaderReader {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Reads until `CRLF CRLF`, failing once `max_bytes` bytes are read without it.
    ///
    /// # Errors
    ///
    /// - [`ParseError::TooLargeHeader`] when the limit is reached first
    /// - [`ParseError::Io`] when the stream fails or ends early
    pub async fn read_lines<R>(&self, reader: &mut R) -> Result<Vec<String>, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = BytesMut::with_capacity(self.max_bytes.min(1024));

        while buf.len() < self.max_bytes {
            let byte = reader.read_u8().await?;
            buf.put_u8(byte);

            if buf.ends_with(HEADER_END) {
                trace!(header_size = buf.len(), "read header block");
                return Ok(unfold_lines(&buf));
            }
        }

        Err(ParseError::too_large_header(buf.len(), self.max_bytes))
    }
}

/// Merges folded continuation lines and splits a raw header block into lines.
///
/// A CRLF followed by spaces or tabs is an obsolete line fold; the CRLF and the
/// whole whitespace run are replaced with a single space. Empty lines are dropped.
pub fn unfold_lines(raw: &[u8]) -> Vec<String> {
    let mut folded = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i..].starts_with(CRLF) && matches!(raw.get(i + 2), Some(b' ' | b'\t')) {
            folded.push(b' ');
            i += CRLF.len();
            while matches!(raw.get(i), Some(b' ' | b'\t')) {
                i += 1;
            }
        } else {
            folded.push(raw[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&folded).split("\r\n").filter(|line| !line.is_empty()).map(str::to_owned).collect()
}

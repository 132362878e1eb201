//! Reader for entity bodies delimited by a `Content-Length` header.
//!
//! The whole body is buffered in memory. Large bodies are pulled off the
//! stream in bounded increments so the transport never sees one enormous read
//! request, and a configurable limit rejects oversized declarations before
//! anything is allocated.

use std::cmp;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Default upper bound for a single underlying read call
pub const READ_CHUNK_SIZE: usize = 1024;

/// Default upper bound for a buffered entity body
pub const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

/// Parses a `Content-Length` value as a non-negative 64-bit integer.
///
/// Surrounding whitespace is tolerated.
///
/// # Errors
///
/// Returns [`ParseError::InvalidContentLength`] if the value is not a number or is negative.
pub fn parse_content_length(value: &str) -> Result<u64, ParseError> {
    let length = value
        .trim()
        .parse::<i64>()
        .map_err(|_e| ParseError::invalid_content_length(format!("value {value:?} is not an i64")))?;

    u64::try_from(length).map_err(|_e| ParseError::invalid_content_length(format!("value {length} is less than zero")))
}

/// Reads a body of a declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthReader {
    chunk_size: usize,
    max_length: Option<u64>,
}

impl Default for LengthReader {
    fn default() -> Self {
        Self::new(READ_CHUNK_SIZE, Some(MAX_BODY_BYTES))
    }
}

impl LengthReader {
    /// Creates a reader issuing reads of at most `chunk_size` bytes.
    ///
    /// `max_length` of `None` accepts any declared length.
    pub fn new(chunk_size: usize, max_length: Option<u64>) -> Self {
        Self { chunk_size: chunk_size.max(1), max_length }
    }

    /// Reads exactly the number of bytes declared by `content_length`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::InvalidContentLength`] if the value can't be parsed
    /// - [`ParseError::TooLargeBody`] if the length exceeds the configured limit
    /// - [`ParseError::InvalidBody`] or [`ParseError::Io`] if the stream ends early or fails
    pub async fn read_body<R>(&self, reader: &mut R, content_length: &str) -> Result<Bytes, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let length = parse_content_length(content_length)?;
        if let Some(max_length) = self.max_length {
            ensure!(length <= max_length, ParseError::too_large_body(length, max_length));
        }

        if length == 0 {
            return Ok(Bytes::new());
        }

        let length = usize::try_from(length).map_err(|_e| ParseError::too_large_body(length, usize::MAX as u64))?;
        trace!(body_size = length, "reading entity body");

        if length <= self.chunk_size {
            let mut body = vec![0; length];
            reader.read_exact(&mut body).await?;
            return Ok(Bytes::from(body));
        }

        // grows with the bytes actually received, never sized by the declaration alone
        let mut body = BytesMut::with_capacity(self.chunk_size);
        let mut chunk = vec![0; self.chunk_size];
        while body.len() < length {
            let want = cmp::min(self.chunk_size, length - body.len());
            let read = reader.read(&mut chunk[..want]).await?;
            ensure!(read != 0, ParseError::invalid_body(format!("stream ended after {} of {length} body bytes", body.len())));
            body.extend_from_slice(&chunk[..read]);
        }

        Ok(body.freeze())
    }
}

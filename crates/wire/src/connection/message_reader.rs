//! Deadline-bound reading of a complete inbound HTTP message.
//!
//! A read consists of the header block, a caller-supplied parse of its lines
//! into a typed head, and the entity body if `Content-Length` declares one. The
//! whole sequence runs under one deadline. On expiry the in-flight read is
//! dropped and the stream is shut down, so the peer observes the connection
//! closing. The outcome is tagged explicitly: a deadline expiry is always
//! reported as [`ParseError::Timeout`], any other failure as
//! [`ParseError::Malformed`] wrapping its cause.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::codec::{HeaderReader, LengthReader, MAX_BODY_BYTES, MAX_HEADER_BYTES, READ_CHUNK_SIZE};
use crate::protocol::{HttpHead, InboundMessage, ParseError, RequestHeader, ResponseHeader};

/// Default deadline for reading one message
pub const READ_TIMEOUT: Duration = Duration::from_secs(90);

/// Limits applied while reading a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadConfig {
    /// Maximum size of the header block in bytes
    pub max_header_bytes: usize,
    /// Maximum size of a single underlying body read
    pub read_chunk_size: usize,
    /// Maximum declared body length, `None` for no limit
    pub max_body_bytes: Option<u64>,
    /// Deadline for the whole message
    pub timeout: Duration,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: MAX_HEADER_BYTES,
            read_chunk_size: READ_CHUNK_SIZE,
            max_body_bytes: Some(MAX_BODY_BYTES),
            timeout: READ_TIMEOUT,
        }
    }
}

impl ReadConfig {
    #[must_use]
    pub fn with_max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    #[must_use]
    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: Option<u64>) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Reads inbound HTTP messages off a duplex stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageReader {
    config: ReadConfig,
}

impl MessageReader {
    pub fn new(config: ReadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Reads one message, building its head with `parser`.
    ///
    /// `parser` receives the unfolded header lines, start line first, and must not
    /// perform I/O. On deadline expiry the stream is shut down before returning.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Timeout`] if the deadline expired, whatever else went wrong
    /// - [`ParseError::Malformed`] wrapping the cause of any other failure
    pub async fn read<S, T, F>(&self, stream: &mut S, parser: F) -> Result<InboundMessage<T>, ParseError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        T: HttpHead,
        F: FnOnce(Vec<String>) -> Result<T, ParseError>,
    {
        let timeout = self.config.timeout;
        let outcome = tokio::time::timeout(timeout, self.read_message(stream, parser)).await;

        match outcome {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(e)) => {
                debug!(cause = %e, "can't read http message");
                Err(ParseError::malformed(e))
            }
            Err(_elapsed) => {
                warn!(timeout_ms = timeout.as_millis(), "http message read timed out, shutting stream down");
                if let Err(e) = stream.shutdown().await {
                    debug!(cause = %e, "shutdown after read timeout failed");
                }
                Err(ParseError::timeout(timeout))
            }
        }
    }

    /// Reads one request, see [`MessageReader::read`].
    ///
    /// # Errors
    ///
    /// Same as [`MessageReader::read`].
    pub async fn read_request<S>(&self, stream: &mut S) -> Result<InboundMessage<RequestHeader>, ParseError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.read(stream, |lines| RequestHeader::from_lines(&lines)).await
    }

    /// Reads one response, see [`MessageReader::read`].
    ///
    /// # Errors
    ///
    /// Same as [`MessageReader::read`].
    pub async fn read_response<S>(&self, stream: &mut S) -> Result<InboundMessage<ResponseHeader>, ParseError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.read(stream, |lines| ResponseHeader::from_lines(&lines)).await
    }

    async fn read_message<S, T, F>(&self, stream: &mut S, parser: F) -> Result<InboundMessage<T>, ParseError>
    where
        S: AsyncRead + Unpin,
        T: HttpHead,
        F: FnOnce(Vec<String>) -> Result<T, ParseError>,
    {
        let lines = HeaderReader::new(self.config.max_header_bytes).read_lines(stream).await?;
        let mut message = InboundMessage::new(parser(lines)?);

        let content_length = match message.headers().get(http::header::CONTENT_LENGTH) {
            Some(value) => Some(value.to_str().map_err(|_e| ParseError::invalid_content_length("value is not visible ascii"))?.to_owned()),
            None => None,
        };

        if let Some(content_length) = content_length.filter(|value| !value.is_empty()) {
            let body = LengthReader::new(self.config.read_chunk_size, self.config.max_body_bytes)
                .read_body(stream, &content_length)
                .await?;
            message.set_body(body);
        }

        trace!(body_size = message.body().map_or(0, bytes::Bytes::len), "read http message");
        Ok(message)
    }
}

/// Reads one message with the default limits and the given deadline.
///
/// # Errors
///
/// Same as [`MessageReader::read`].
pub async fn read_message<S, T, F>(stream: &mut S, parser: F, timeout: Duration) -> Result<InboundMessage<T>, ParseError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: HttpHead,
    F: FnOnce(Vec<String>) -> Result<T, ParseError>,
{
    MessageReader::new(ReadConfig::default().with_timeout(timeout)).read(stream, parser).await
}

//! HTTP header encoder for serializing outbound response heads
//!
//! This module serializes a status line and header fields into raw bytes. The
//! framing headers (`Content-Length` / `Transfer-Encoding`) are derived from the
//! body mode at the moment of sending, without touching the caller's header map.
//!
//! # Features
//!
//! - HTTP/1.1 and HTTP/1.0 status lines
//! - Chunked transfer encoding replaces any declared content length
//! - Heads sent on close without a declared length get `content-length: 0`

use crate::protocol::{ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use http::header;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::head::{encode_fields, version_str};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// How the body following a head is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadFraming {
    /// The body is sent with chunked transfer encoding
    pub chunked: bool,
    /// The head is sent because the response is closing, so no body follows
    pub closing: bool,
}

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl<'a> Encoder<(&'a ResponseHead, HeadFraming)> for HeaderEncoder {
    type Error = SendError;

    /// Encodes the response head into the provided bytes buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::InvalidHead`] if the HTTP version can't be written as text.
    fn encode(&mut self, item: (&'a ResponseHead, HeadFraming), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, framing) = item;

        let Some(version) = version_str(head.version()) else {
            error!(http_version = ?head.version(), "unsupported http version");
            return Err(SendError::invalid_head(format!("unsupported http version {:?}", head.version())));
        };

        dst.reserve(INIT_HEADER_SIZE);
        let status = head.status();
        write!(FastWrite(dst), "{version} {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or(""))?;

        let headers = head.headers();
        if framing.chunked {
            for (name, value) in headers {
                if *name == header::CONTENT_LENGTH || *name == header::TRANSFER_ENCODING {
                    continue;
                }
                put_field(dst, name.as_ref(), value.as_bytes());
            }
            put_field(dst, header::TRANSFER_ENCODING.as_ref(), b"chunked");
        } else {
            encode_fields(headers, dst);
            if framing.closing && !headers.contains_key(header::CONTENT_LENGTH) {
                put_field(dst, header::CONTENT_LENGTH.as_ref(), b"0");
            }
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn put_field(dst: &mut BytesMut, name: &[u8], value: &[u8]) {
    dst.put_slice(name);
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
}

/// Writer adapter for formatting straight into a `BytesMut`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

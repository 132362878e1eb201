//! Common view over request and response heads.
//!
//! The message reader only needs the protocol version and the header map of a
//! freshly parsed head, so the concrete request and response types meet behind
//! [`HttpHead`].

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Version};

use crate::protocol::ParseError;

/// A parsed HTTP start line together with its header fields.
pub trait HttpHead {
    /// Returns the protocol version declared on the start line.
    fn version(&self) -> Version;

    /// Returns the header fields in insertion order.
    fn headers(&self) -> &HeaderMap;

    /// Writes the start line, without its trailing CRLF.
    fn encode_start_line(&self, dst: &mut BytesMut);

    /// Writes the start line, all header fields and the blank line ending the block.
    fn encode(&self, dst: &mut BytesMut) {
        self.encode_start_line(dst);
        dst.put_slice(b"\r\n");
        encode_fields(self.headers(), dst);
        dst.put_slice(b"\r\n");
    }
}

pub(crate) fn encode_fields(headers: &HeaderMap, dst: &mut BytesMut) {
    for (name, value) in headers {
        dst.put_slice(name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
}

pub(crate) fn parse_version(version: &str) -> Result<Version, ParseError> {
    match version {
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        // http2 and http3 are never framed as text
        _ => Err(ParseError::invalid_version(version)),
    }
}

pub(crate) fn version_str(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_11 => Some("HTTP/1.1"),
        Version::HTTP_10 => Some("HTTP/1.0"),
        _ => None,
    }
}

/// Parses `Name: value` lines into a header map, keeping repeated names.
pub(crate) fn parse_fields<S: AsRef<str>>(lines: &[S]) -> Result<HeaderMap, ParseError> {
    let mut headers = HeaderMap::with_capacity(lines.len());
    for line in lines {
        let line = line.as_ref();
        let (name, value) = line.split_once(':').ok_or_else(|| ParseError::invalid_header(format!("missing colon in {line:?}")))?;

        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_str(value.trim()).map_err(ParseError::invalid_header)?;
        headers.append(name, value);
    }
    Ok(headers)
}

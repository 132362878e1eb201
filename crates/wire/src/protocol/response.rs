//! HTTP response head handling.
//!
//! Outbound responses are described by [`ResponseHead`], the standard
//! `http::Response` with an empty body placeholder. Inbound responses, read off
//! the wire by a client, are parsed into [`ResponseHeader`], which additionally
//! keeps the reason phrase exactly as the peer sent it.

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, Response, StatusCode, Version};

use crate::protocol::ParseError;
use crate::protocol::head::{self, HttpHead};

/// Type alias for outbound HTTP response heads.
///
/// The body is written separately through a response stream.
pub type ResponseHead = Response<()>;

/// Represents an inbound HTTP response head.
#[derive(Debug)]
pub struct ResponseHeader {
    inner: Response<()>,
    reason: String,
}

impl ResponseHeader {
    /// Builds a response head from the lines of a header block.
    ///
    /// The first line must be the status line (`HTTP/1.x code [reason]`), the
    /// remaining lines are `Name: value` fields.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the status line or any header field is invalid.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, ParseError> {
        let (status_line, fields) = lines.split_first().ok_or_else(|| ParseError::invalid_header("empty header block"))?;

        let mut parts = status_line.as_ref().splitn(3, ' ');
        let version = head::parse_version(parts.next().unwrap_or_default())?;
        let code = parts.next().unwrap_or_default();
        let status = StatusCode::from_bytes(code.as_bytes()).map_err(|_e| ParseError::invalid_status(code))?;
        let reason = parts.next().unwrap_or_default().trim().to_owned();

        let mut response = Response::new(());
        *response.status_mut() = status;
        *response.version_mut() = version;
        *response.headers_mut() = head::parse_fields(fields)?;

        Ok(Self { inner: response, reason })
    }

    /// Returns the response status code.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Returns the reason phrase as received, which may be empty.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Consumes the header and returns the inner `Response<()>`.
    pub fn into_inner(self) -> Response<()> {
        self.inner
    }
}

impl HttpHead for ResponseHeader {
    fn version(&self) -> Version {
        self.inner.version()
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn encode_start_line(&self, dst: &mut BytesMut) {
        dst.put_slice(head::version_str(self.version()).unwrap_or("HTTP/1.1").as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.status().as_str().as_bytes());
        if !self.reason.is_empty() {
            dst.put_u8(b' ');
            dst.put_slice(self.reason.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_protocols() {
        let lines = [
            "HTTP/1.1 101 Switching Protocols",
            "Upgrade: websocket",
            "Connection: Upgrade",
            "Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=",
        ];

        let header = ResponseHeader::from_lines(&lines).unwrap();

        assert_eq!(header.status(), StatusCode::SWITCHING_PROTOCOLS);
        assert_eq!(header.reason(), "Switching Protocols");
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.headers().len(), 3);
    }

    #[test]
    fn reason_phrase_is_optional() {
        let header = ResponseHeader::from_lines(&["HTTP/1.0 204"]).unwrap();
        assert_eq!(header.status(), StatusCode::NO_CONTENT);
        assert_eq!(header.reason(), "");
        assert_eq!(header.version(), Version::HTTP_10);
    }

    #[test]
    fn invalid_status_lines() {
        assert!(matches!(ResponseHeader::from_lines(&["HTTP/1.1 abc OK"]).unwrap_err(), ParseError::InvalidStatus { .. }));
        assert!(matches!(ResponseHeader::from_lines(&["HTTP/1.1"]).unwrap_err(), ParseError::InvalidStatus { .. }));
        assert!(matches!(ResponseHeader::from_lines(&["ICY 200 OK"]).unwrap_err(), ParseError::InvalidVersion { .. }));
    }

    #[test]
    fn encode_keeps_custom_reason() {
        let header = ResponseHeader::from_lines(&["HTTP/1.1 200 Fine Thanks", "Content-Length: 0"]).unwrap();
        let mut dst = BytesMut::new();
        header.encode(&mut dst);
        assert_eq!(&dst[..], b"HTTP/1.1 200 Fine Thanks\r\ncontent-length: 0\r\n\r\n");
    }
}

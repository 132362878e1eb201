//! HTTP request head handling.
//!
//! This module wraps the standard `http::Request` type so that a request head
//! can be built straight from the unfolded header lines of the wire.

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, Method, Request, Uri, Version};

use crate::protocol::ParseError;
use crate::protocol::head::{self, HttpHead};

/// Inbound HTTP request head: request line plus header fields.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Builds a request head from the lines of a header block.
    ///
    /// The first line must be the request line (`METHOD target HTTP/1.x`), the
    /// remaining lines are `Name: value` fields.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the request line or any header field is invalid.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, ParseError> {
        let (request_line, fields) = lines.split_first().ok_or_else(|| ParseError::invalid_header("empty header block"))?;

        let mut parts = request_line.as_ref().split_ascii_whitespace();
        let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
            return Err(ParseError::invalid_header(format!("invalid request line {:?}", request_line.as_ref())));
        };

        let method = Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::InvalidMethod)?;
        let uri = target.parse::<Uri>().map_err(|_e| ParseError::InvalidUri)?;
        let version = head::parse_version(version)?;

        let mut request = Request::new(());
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.version_mut() = version;
        *request.headers_mut() = head::parse_fields(fields)?;

        Ok(Self { inner: request })
    }

    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }
}

impl HttpHead for RequestHeader {
    fn version(&self) -> Version {
        self.inner.version()
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn encode_start_line(&self, dst: &mut BytesMut) {
        dst.put_slice(self.method().as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.uri().to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(head::version_str(self.version()).unwrap_or("HTTP/1.1").as_bytes());
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

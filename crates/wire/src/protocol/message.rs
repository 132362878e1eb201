use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderMap, Version, header};

use crate::protocol::ParseError;
use crate::protocol::charset::encoding_for_content_type;
use crate::protocol::head::HttpHead;

/// A fully read inbound HTTP message: a parsed head plus its entity body.
///
/// The body is buffered in memory and owned by the message. `None` means the
/// head declared no `Content-Length`; a zero length yields an empty body.
#[derive(Debug)]
pub struct InboundMessage<T> {
    head: T,
    body: Option<Bytes>,
}

impl<T: HttpHead> InboundMessage<T> {
    /// Creates a message without a body.
    pub fn new(head: T) -> Self {
        Self { head, body: None }
    }

    /// Creates a message with the given body bytes.
    pub fn with_body(head: T, body: Bytes) -> Self {
        Self { head, body: Some(body) }
    }

    #[inline]
    pub fn head(&self) -> &T {
        &self.head
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.head.version()
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    /// Returns the raw entity body, if one was read.
    #[inline]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns true if no entity body bytes are attached.
    pub fn is_body_empty(&self) -> bool {
        self.body.as_ref().is_none_or(Bytes::is_empty)
    }

    /// Decodes the entity body into text using the charset declared by `Content-Type`.
    ///
    /// An absent or empty body decodes to an empty string without consulting the header.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedCharset`] if the declared charset is unknown.
    pub fn entity_body(&self) -> Result<Cow<'_, str>, ParseError> {
        let Some(body) = self.body.as_ref().filter(|body| !body.is_empty()) else {
            return Ok(Cow::Borrowed(""));
        };

        let content_type = self.headers().get(header::CONTENT_TYPE).map(|value| String::from_utf8_lossy(value.as_bytes()));
        let encoding = encoding_for_content_type(content_type.as_deref())?;
        Ok(encoding.decode_without_bom_handling(body).0)
    }

    /// Serializes the message back into its wire form.
    pub fn to_bytes(&self) -> Bytes {
        let body_len = self.body.as_ref().map_or(0, Bytes::len);
        let mut dst = BytesMut::with_capacity(256 + body_len);
        self.head.encode(&mut dst);
        if let Some(body) = &self.body {
            dst.put_slice(body);
        }
        dst.freeze()
    }

    /// Consumes the message and returns its head and body.
    pub fn into_parts(self) -> (T, Option<Bytes>) {
        (self.head, self.body)
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{RequestHeader, ResponseHeader};

    fn request(lines: &[&str], body: &[u8]) -> InboundMessage<RequestHeader> {
        InboundMessage::with_body(RequestHeader::from_lines(lines).unwrap(), Bytes::copy_from_slice(body))
    }

    #[test]
    fn entity_body_defaults_to_utf8() {
        let message = request(&["POST / HTTP/1.1", "Content-Length: 6"], "héllo".as_bytes());
        assert_eq!(message.entity_body().unwrap(), "héllo");
    }

    #[test]
    fn entity_body_uses_declared_charset() {
        let message = request(&["POST / HTTP/1.1", "Content-Type: text/plain; charset=\"iso-8859-1\""], b"caf\xe9");
        assert_eq!(message.entity_body().unwrap(), "café");
    }

    #[test]
    fn charset_is_found_next_to_non_ascii_parameters() {
        let message = request(&["POST / HTTP/1.1", "Content-Type: text/plain; charset=iso-8859-1; title=\"café\""], b"caf\xe9");
        assert_eq!(message.entity_body().unwrap(), "café");
    }

    #[test]
    fn entity_body_unknown_charset_is_reported() {
        let message = request(&["POST / HTTP/1.1", "Content-Type: text/plain; charset=x-unknown"], b"abc");
        assert!(matches!(message.entity_body().unwrap_err(), ParseError::UnsupportedCharset { .. }));
    }

    #[test]
    fn empty_body_skips_charset_resolution() {
        let message = request(&["POST / HTTP/1.1", "Content-Type: text/plain; charset=x-unknown"], b"");
        assert_eq!(message.entity_body().unwrap(), "");
        assert!(message.is_body_empty());

        let message = InboundMessage::new(RequestHeader::from_lines(&["GET / HTTP/1.1"]).unwrap());
        assert_eq!(message.entity_body().unwrap(), "");
        assert!(message.body().is_none());
    }

    #[test]
    fn to_bytes_writes_head_and_body() {
        let message = InboundMessage::with_body(
            ResponseHeader::from_lines(&["HTTP/1.1 200 OK", "Content-Length: 2"]).unwrap(),
            Bytes::from_static(b"ok"),
        );
        assert_eq!(&message.to_bytes()[..], b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok");
    }
}

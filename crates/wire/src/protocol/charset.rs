//! Text encoding resolution from a `Content-Type` header value.
//!
//! Only the `charset=` parameter is inspected, everything else in the media type
//! is ignored. Charset labels are resolved through the WHATWG label table, so
//! `iso-8859-1` and `latin1` resolve to `windows-1252` like they do in browsers.

use encoding_rs::{Encoding, UTF_8};

use crate::protocol::ParseError;

const CHARSET_TOKEN: &str = "charset=";

/// Resolves the text encoding declared by a `Content-Type` header value.
///
/// Absent or empty values, and values without a `charset=` parameter, resolve to UTF-8.
/// The token match is case-sensitive.
///
/// # Errors
///
/// Returns [`ParseError::UnsupportedCharset`] if the declared charset has no known encoding.
pub fn encoding_for_content_type(content_type: Option<&str>) -> Result<&'static Encoding, ParseError> {
    let Some(content_type) = content_type.filter(|value| !value.is_empty()) else {
        return Ok(UTF_8);
    };

    let Some(index) = content_type.find(CHARSET_TOKEN) else {
        return Ok(UTF_8);
    };

    let charset = &content_type[index + CHARSET_TOKEN.len()..];
    let charset = match charset.find(';') {
        Some(end) => &charset[..end],
        None => charset,
    };

    let charset = charset.trim_end();
    let charset = charset.strip_prefix('"').and_then(|c| c.strip_suffix('"')).unwrap_or(charset).trim();

    Encoding::for_label(charset.as_bytes()).ok_or_else(|| ParseError::unsupported_charset(charset))
}

//! Wire-level encoding and decoding of HTTP/1.x messages
//!
//! # Architecture
//!
//! - Read side:
//!   - [`HeaderReader`]: reads and unfolds a raw header block under a size limit
//!   - [`LengthReader`]: reads a `Content-Length` delimited entity body
//!
//! - Write side:
//!   - [`HeaderEncoder`]: serializes an outbound response head
//!   - [`ChunkedEncoder`]: chunked transfer encoding framing
//!
//! The pieces are orchestrated by [`crate::connection::MessageReader`] and
//! [`crate::connection::ResponseStream`].

mod body;
mod header;

pub use body::{CRLF, ChunkedEncoder, LengthReader, MAX_BODY_BYTES, READ_CHUNK_SIZE, parse_content_length};
pub use header::{HeadFraming, HeaderEncoder, HeaderReader, MAX_HEADER_BYTES, unfold_lines};

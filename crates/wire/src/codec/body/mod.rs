//! HTTP entity body processing
//!
//! - [`LengthReader`]: reads a `Content-Length` delimited body into memory
//! - [`ChunkedEncoder`]: frames outbound body bytes with chunked transfer encoding

mod chunked_encoder;
mod length_reader;

pub use chunked_encoder::{CRLF, ChunkedEncoder};
pub use length_reader::{LengthReader, MAX_BODY_BYTES, READ_CHUNK_SIZE, parse_content_length};

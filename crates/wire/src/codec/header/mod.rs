//! HTTP header block processing
//!
//! # Components
//!
//! - [`HeaderReader`]: reads a raw header block off a stream
//!   - Enforces the header size limit
//!   - Unfolds continuation lines and splits the block into lines
//!
//! - [`HeaderEncoder`]: encodes an outbound response head to bytes
//!   - Writes the status line and header fields
//!   - Derives the framing headers from the body mode

mod header_encoder;
mod header_reader;

pub use header_encoder::{HeadFraming, HeaderEncoder};
pub use header_reader::{HeaderReader, MAX_HEADER_BYTES, unfold_lines};

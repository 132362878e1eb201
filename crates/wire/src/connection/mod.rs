//! Connection-level reading and writing of HTTP messages
//!
//! # Components
//!
//! - [`MessageReader`]: reads one complete inbound message under a deadline,
//!   tagging the outcome as timed out or malformed
//! - [`SharedResponse`]: the outbound response head plus its sent/chunked/closed
//!   state, shared by every writer of the response
//! - [`ResponseStream`]: write-only body stream that sends the head once,
//!   applies chunked framing and terminates the body on close

mod message_reader;
mod response_stream;
mod shared_response;

pub use message_reader::{MessageReader, READ_TIMEOUT, ReadConfig, read_message};
pub use response_stream::{COALESCE_LIMIT, ResponseStream};
pub use shared_response::SharedResponse;

//! Core HTTP protocol types shared by the reader and the writer.
//!
//! # Architecture
//!
//! - **Heads**: typed start line plus header map
//!   - [`HttpHead`]: what the message reader needs from any parsed head
//!   - [`RequestHeader`]: inbound request head, built from header lines
//!   - [`ResponseHeader`]: inbound response head, built from header lines
//!   - [`ResponseHead`]: outbound response head written by a response stream
//!
//! - **Messages**: [`InboundMessage`] pairs a head with its buffered body
//!   and decodes the body text through [`charset`]
//!
//! - **Error Handling**:
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Message reading errors
//!   - [`SendError`]: Response writing errors

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod charset;
pub use charset::encoding_for_content_type;

pub(crate) mod head;
pub use head::HttpHead;

mod message;
pub use message::InboundMessage;

mod request;
pub use request::RequestHeader;

mod response;
pub use response::ResponseHead;
pub use response::ResponseHeader;

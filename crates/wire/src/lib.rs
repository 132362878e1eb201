//! HTTP/1.x message framing over async byte streams
//!
//! This crate reads inbound HTTP messages and writes outbound response bodies
//! on top of tokio streams. It does not route, dispatch or keep connections
//! alive; it only frames bytes.
//!
//! # Features
//!
//! - Header block reading with a size limit and obsolete line folding
//! - `Content-Length` bodies read in bounded increments
//! - One deadline for a whole message, with the stream shut down on expiry
//! - Response bodies with chunked transfer encoding or plain passthrough
//! - Response head sent exactly once, even with several writers
//! - Charset resolution from `Content-Type` for body decoding
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use http::{Response, StatusCode};
//! use micro_wire::connection::{MessageReader, ResponseStream, SharedResponse};
//! use micro_wire::protocol::HttpError;
//! use tokio::net::TcpStream;
//!
//! async fn echo(mut stream: TcpStream) -> Result<(), HttpError> {
//!     let request = MessageReader::default().read_request(&mut stream).await?;
//!
//!     let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
//!     let response = Arc::new(SharedResponse::chunked(head));
//!     let mut body = ResponseStream::new(&mut stream, response);
//!     body.write(&request.to_bytes()).await?;
//!     body.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: heads, messages, charsets and error types
//! - [`codec`]: header and body encoders and decoders
//! - [`connection`]: the message reader and the response stream
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: Message reading errors
//! - [`protocol::SendError`]: Response writing errors
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - Inbound chunked bodies are not decoded
//! - Bodies are buffered in memory, 8MB by default

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;

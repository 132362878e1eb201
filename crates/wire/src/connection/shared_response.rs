use std::sync::atomic::{AtomicBool, Ordering};

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio_util::codec::Encoder;
use tracing::debug;

use crate::codec::{HeadFraming, HeaderEncoder};
use crate::protocol::{ResponseHead, SendError};

/// Response state shared by every writer of one logical response.
///
/// The head is serialized at most once for the lifetime of this object: the
/// check of the headers-sent flag, the serialization and the flip of the flag
/// happen under one lock. The lock is held only for that step, never for the
/// write to the underlying stream.
#[derive(Debug)]
pub struct SharedResponse {
    head: Mutex<ResponseHead>,
    headers_sent: AtomicBool,
    chunked: AtomicBool,
    closed: AtomicBool,
}

impl SharedResponse {
    pub fn new(head: ResponseHead) -> Self {
        Self {
            head: Mutex::new(head),
            headers_sent: AtomicBool::new(false),
            chunked: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a response whose body is sent with chunked transfer encoding.
    pub fn chunked(head: ResponseHead) -> Self {
        let response = Self::new(head);
        response.chunked.store(true, Ordering::Relaxed);
        response
    }

    /// Switches chunked transfer encoding on or off.
    ///
    /// Returns false, leaving the mode untouched, once the headers are out.
    pub fn set_chunked(&self, chunked: bool) -> bool {
        let _head = self.head.lock();
        if self.headers_sent() {
            return false;
        }
        self.chunked.store(chunked, Ordering::Release);
        true
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.chunked.load(Ordering::Acquire)
    }

    #[inline]
    pub fn headers_sent(&self) -> bool {
        self.headers_sent.load(Ordering::Acquire)
    }

    /// Edits the response head.
    ///
    /// Returns false without calling `f` once the headers are out.
    pub fn modify_head<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut ResponseHead),
    {
        let mut head = self.head.lock();
        if self.headers_sent() {
            return false;
        }
        f(&mut head);
        true
    }

    /// Serializes the head into `dst` unless it was already sent.
    ///
    /// `closing` tells the encoder no body will follow. Returns true if this call
    /// wrote the head; exactly one caller ever sees true.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::InvalidHead`] if the head can't be serialized; the
    /// headers-sent flag stays false in that case.
    pub fn send_headers(&self, dst: &mut BytesMut, closing: bool) -> Result<bool, SendError> {
        if self.headers_sent() {
            return Ok(false);
        }

        let head = self.head.lock();
        if self.headers_sent() {
            return Ok(false);
        }

        let framing = HeadFraming { chunked: self.is_chunked(), closing };
        HeaderEncoder.encode((&*head, framing), dst)?;
        self.headers_sent.store(true, Ordering::Release);

        debug!(status = head.status().as_u16(), chunked = framing.chunked, closing, "response headers sent");
        Ok(true)
    }

    /// Marks the response as finished.
    ///
    /// Returns true only for the first call.
    pub fn close(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        if first {
            debug!(headers_sent = self.headers_sent(), "response closed");
        }
        first
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

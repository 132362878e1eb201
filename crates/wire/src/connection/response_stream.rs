//! Write-only body stream for an outbound HTTP response.
//!
//! The first write (or the close, for a response without a body) sends the
//! response head through the [`SharedResponse`]. In chunked mode every write
//! becomes one chunk and closing appends the terminal zero-size chunk.
//!
//! Three entry points share the same framing:
//!
//! - blocking: [`ResponseStream::blocking_write`] / [`ResponseStream::blocking_close`]
//!   and `std::io::Write`, for a `W: std::io::Write`
//! - async: [`ResponseStream::write`] / [`ResponseStream::close`], for a `W: AsyncWrite`
//! - poll based: the `tokio::io::AsyncWrite` implementation, which buffers each
//!   framed write until the next poll drains it, and closes on `poll_shutdown`
//!
//! The stream must be closed explicitly; dropping it sends nothing.

use std::io;
use std::io::{SeekFrom, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::codec::{CRLF, ChunkedEncoder};
use crate::connection::SharedResponse;
use crate::ensure;
use crate::protocol::SendError;

/// Maximum payload bytes sent together with the response head in one write
pub const COALESCE_LIMIT: usize = 16 * 1024;

/// Result of framing one write: what still has to follow the scratch buffer.
#[derive(Debug, Clone, Copy)]
struct Framed {
    /// payload bytes already copied into the scratch buffer
    coalesced: usize,
    /// a chunk is open and needs its trailing CRLF
    chunked: bool,
}

/// Outbound response body stream.
#[derive(Debug)]
pub struct ResponseStream<W> {
    writer: W,
    response: Arc<SharedResponse>,
    ignore_errors: bool,
    disposed: bool,
    chunked_encoder: ChunkedEncoder,
    scratch: BytesMut,
    pending: BytesMut,
}

impl<W> ResponseStream<W> {
    /// Creates a stream writing the body of `response` to `writer`.
    ///
    /// Underlying write errors are propagated; see [`ResponseStream::ignore_errors`].
    pub fn new(writer: W, response: Arc<SharedResponse>) -> Self {
        Self {
            writer,
            response,
            ignore_errors: false,
            disposed: false,
            chunked_encoder: ChunkedEncoder::new(),
            scratch: BytesMut::new(),
            pending: BytesMut::new(),
        }
    }

    /// Swallows underlying write errors when set, for peers that may already be gone.
    #[must_use]
    pub fn ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn response(&self) -> &Arc<SharedResponse> {
        &self.response
    }

    /// Returns true once the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.disposed
    }

    /// Returns true once the terminal chunk has been written.
    pub fn is_finished(&self) -> bool {
        self.chunked_encoder.is_finish()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn can_read(&self) -> bool {
        false
    }

    pub fn can_seek(&self) -> bool {
        false
    }

    pub fn can_write(&self) -> bool {
        true
    }

    /// # Errors
    ///
    /// Always fails with [`SendError::Unsupported`], the stream is write-only.
    pub fn read(&mut self, _buf: &mut [u8]) -> Result<usize, SendError> {
        Err(SendError::unsupported("read"))
    }

    /// # Errors
    ///
    /// Always fails with [`SendError::Unsupported`], the stream is append-only.
    pub fn seek(&mut self, _pos: SeekFrom) -> Result<u64, SendError> {
        Err(SendError::unsupported("seek"))
    }

    /// # Errors
    ///
    /// Always fails with [`SendError::Unsupported`], the stream is append-only.
    pub fn set_len(&mut self, _len: u64) -> Result<(), SendError> {
        Err(SendError::unsupported("set_len"))
    }

    /// # Errors
    ///
    /// Always fails with [`SendError::Unsupported`], the body length is not known up front.
    pub fn len(&self) -> Result<u64, SendError> {
        Err(SendError::unsupported("len"))
    }

    /// # Errors
    ///
    /// Always fails with [`SendError::Unsupported`], the stream has no position.
    pub fn position(&self) -> Result<u64, SendError> {
        Err(SendError::unsupported("position"))
    }

    /// Frames the start of a write into the scratch buffer.
    ///
    /// The scratch buffer receives the head if it is still pending, the chunk
    /// size line in chunked mode, and when the head goes out now, the first
    /// `limit` payload bytes. An empty write only flushes a pending head.
    fn frame_write(&mut self, buf: &[u8], limit: usize) -> Result<Framed, SendError> {
        ensure!(!self.disposed, SendError::Disposed);

        self.scratch.clear();
        let head_pending = self.response.send_headers(&mut self.scratch, false)?;

        let chunked = self.response.is_chunked() && !buf.is_empty();
        if chunked {
            self.chunked_encoder.encode_size(buf.len(), &mut self.scratch)?;
        }

        let coalesced = if head_pending { buf.len().min(limit) } else { 0 };
        self.scratch.extend_from_slice(&buf[..coalesced]);

        trace!(size = buf.len(), coalesced, chunked, "framed response write");
        Ok(Framed { coalesced, chunked })
    }

    /// Marks the stream closed and frames whatever the close has to send.
    fn frame_close(&mut self) -> Result<(), SendError> {
        self.disposed = true;
        self.scratch.clear();
        self.response.send_headers(&mut self.scratch, true)?;
        if self.response.is_chunked() {
            self.chunked_encoder.encode_eof(&mut self.scratch);
        }
        Ok(())
    }

    fn finish_close(&self) {
        if self.response.close() {
            debug!(terminal_chunk = self.chunked_encoder.is_finish(), "response stream closed");
        }
    }

    fn suppress(&self, result: io::Result<()>) -> Result<(), SendError> {
        match result {
            Err(e) if self.ignore_errors => {
                warn!(cause = %e, "ignore response write error");
                Ok(())
            }
            result => result.map_err(SendError::io),
        }
    }
}

impl<W> ResponseStream<W>
where
    W: Write,
{
    /// Writes `buf` as (part of) the response body, blocking on the underlying writer.
    ///
    /// # Errors
    ///
    /// - [`SendError::Disposed`] after the stream was closed
    /// - [`SendError::InvalidHead`] if the pending head can't be serialized
    /// - [`SendError::Io`] if the underlying write fails and errors aren't ignored
    pub fn blocking_write(&mut self, buf: &[u8]) -> Result<(), SendError> {
        let framed = self.frame_write(buf, COALESCE_LIMIT)?;

        if !self.scratch.is_empty() {
            self.put_blocking(Part::Scratch)?;
        }
        if framed.coalesced < buf.len() {
            self.put_blocking(Part::Payload(&buf[framed.coalesced..]))?;
        }
        if framed.chunked {
            self.put_blocking(Part::Payload(CRLF))?;
        }
        Ok(())
    }

    /// Closes the stream, sending the head and the terminal chunk if still due.
    ///
    /// Closing an already closed stream does nothing.
    ///
    /// # Errors
    ///
    /// Fails like [`ResponseStream::blocking_write`], except that it never reports `Disposed`.
    pub fn blocking_close(&mut self) -> Result<(), SendError> {
        if self.disposed {
            return Ok(());
        }

        let mut result = self.frame_close();
        if result.is_ok() && !self.scratch.is_empty() {
            result = self.put_blocking(Part::Scratch);
        }
        if result.is_ok() {
            let flushed = self.writer.flush();
            result = self.suppress(flushed);
        }

        self.finish_close();
        result
    }

    fn put_blocking(&mut self, part: Part<'_>) -> Result<(), SendError> {
        let bytes = match part {
            Part::Scratch => &self.scratch[..],
            Part::Payload(bytes) => bytes,
        };
        let written = self.writer.write_all(bytes);
        self.suppress(written)
    }
}

impl<W> ResponseStream<W>
where
    W: AsyncWrite + Unpin,
{
    /// Writes `buf` as (part of) the response body.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseStream::blocking_write`].
    pub async fn write(&mut self, buf: &[u8]) -> Result<(), SendError> {
        let framed = self.frame_write(buf, COALESCE_LIMIT)?;

        if !self.scratch.is_empty() {
            self.put(Part::Scratch).await?;
        }
        if framed.coalesced < buf.len() {
            self.put(Part::Payload(&buf[framed.coalesced..])).await?;
        }
        if framed.chunked {
            self.put(Part::Payload(CRLF)).await?;
        }
        Ok(())
    }

    /// Closes the stream, sending the head and the terminal chunk if still due.
    ///
    /// Closing an already closed stream does nothing.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseStream::blocking_close`].
    pub async fn close(&mut self) -> Result<(), SendError> {
        if self.disposed {
            return Ok(());
        }

        let mut result = self.frame_close();
        if result.is_ok() && !self.scratch.is_empty() {
            result = self.put(Part::Scratch).await;
        }
        if result.is_ok() {
            let flushed = self.writer.flush().await;
            result = self.suppress(flushed);
        }

        self.finish_close();
        result
    }

    async fn put(&mut self, part: Part<'_>) -> Result<(), SendError> {
        let bytes = match part {
            Part::Scratch => &self.scratch[..],
            Part::Payload(bytes) => bytes,
        };
        let written = self.writer.write_all(bytes).await;
        self.suppress(written)
    }

    /// Writes out the bytes buffered by `poll_write`.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.pending.is_empty() {
            let result = match Pin::new(&mut self.writer).poll_write(cx, &self.pending) {
                Poll::Ready(Ok(0)) => Err(io::ErrorKind::WriteZero.into()),
                Poll::Ready(Ok(n)) => {
                    self.pending.advance(n);
                    continue;
                }
                Poll::Ready(Err(e)) => Err(e),
                Poll::Pending => return Poll::Pending,
            };

            self.pending.clear();
            return Poll::Ready(self.suppress(result).map_err(io::Error::from));
        }
        Poll::Ready(Ok(()))
    }
}

/// The bytes for one underlying write: the scratch buffer or caller-owned bytes.
enum Part<'a> {
    Scratch,
    Payload(&'a [u8]),
}

impl<W> Write for ResponseStream<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.blocking_write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let flushed = self.writer.flush();
        Ok(self.suppress(flushed)?)
    }
}

impl<W> AsyncWrite for ResponseStream<W>
where
    W: AsyncWrite + Unpin,
{
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;

        let framed = this.frame_write(buf, usize::MAX)?;
        this.pending.extend_from_slice(&this.scratch);
        this.pending.extend_from_slice(&buf[framed.coalesced..]);
        if framed.chunked {
            this.pending.extend_from_slice(CRLF);
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;

        let flushed = ready!(Pin::new(&mut this.writer).poll_flush(cx));
        Poll::Ready(this.suppress(flushed).map_err(io::Error::from))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.disposed {
            ready!(this.poll_drain(cx))?;

            if let Err(e) = this.frame_close() {
                this.finish_close();
                return Poll::Ready(Err(e.into()));
            }
            this.pending.extend_from_slice(&this.scratch);
        }

        if let Err(e) = ready!(this.poll_drain(cx)) {
            this.finish_close();
            return Poll::Ready(Err(e));
        }
        let flushed = ready!(Pin::new(&mut this.writer).poll_flush(cx));
        this.finish_close();
        Poll::Ready(this.suppress(flushed).map_err(io::Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Response, StatusCode};

    const HEAD: &str = "HTTP/1.1 200 OK\r\nserver: micro\r\n";

    /// Records every underlying write call separately.
    #[derive(Debug, Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        fail: bool,
    }

    impl Recorder {
        fn failing() -> Self {
            Self { writes: Vec::new(), fail: true }
        }

        fn output(&self) -> Vec<u8> {
            self.writes.concat()
        }
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::ErrorKind::ConnectionReset.into());
            }
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl AsyncWrite for Recorder {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Write::write(self.get_mut(), buf))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn response(chunked: bool) -> Arc<SharedResponse> {
        let head = Response::builder().status(StatusCode::OK).header("Server", "micro").body(()).unwrap();
        let response = SharedResponse::new(head);
        response.set_chunked(chunked);
        Arc::new(response)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|window| *window == needle).count()
    }

    #[test]
    fn chunked_writes_then_close() {
        let mut stream = ResponseStream::new(Recorder::default(), response(true));

        stream.blocking_write(b"ab").unwrap();
        stream.blocking_write(b"cde").unwrap();
        stream.blocking_close().unwrap();

        let expected = format!("{HEAD}transfer-encoding: chunked\r\n\r\n2\r\nab\r\n3\r\ncde\r\n0\r\n\r\n");
        assert_eq!(stream.get_ref().output(), expected.as_bytes());
        assert!(stream.is_finished());
        assert!(stream.response().is_closed());
    }

    #[test]
    fn headers_are_written_once_over_many_writes() {
        let mut stream = ResponseStream::new(Recorder::default(), response(false));

        for _ in 0..5 {
            stream.blocking_write(b"hello").unwrap();
        }
        stream.blocking_close().unwrap();

        let output = stream.get_ref().output();
        assert_eq!(count(&output, b"HTTP/1.1 200 OK"), 1);
        assert!(output.ends_with(b"\r\n\r\nhellohellohellohellohello"));
    }

    #[test]
    fn first_write_is_coalesced_with_head() {
        let mut stream = ResponseStream::new(Recorder::default(), response(false));

        stream.blocking_write(b"hello").unwrap();
        stream.blocking_write(b" world").unwrap();

        let writes = &stream.get_ref().writes;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], format!("{HEAD}\r\nhello").into_bytes());
        assert_eq!(writes[1], b" world");
    }

    #[test]
    fn large_first_write_is_split_at_coalesce_limit() {
        let mut stream = ResponseStream::new(Recorder::default(), response(false));
        let payload = vec![b'x'; COALESCE_LIMIT + 100];

        stream.blocking_write(&payload).unwrap();

        let writes = &stream.get_ref().writes;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].len(), HEAD.len() + 2 + COALESCE_LIMIT);
        assert_eq!(writes[1].len(), 100);
    }

    #[test]
    fn close_twice_is_a_no_op() {
        let mut once = ResponseStream::new(Recorder::default(), response(true));
        once.blocking_write(b"abc").unwrap();
        once.blocking_close().unwrap();

        let mut twice = ResponseStream::new(Recorder::default(), response(true));
        twice.blocking_write(b"abc").unwrap();
        twice.blocking_close().unwrap();
        twice.blocking_close().unwrap();

        assert_eq!(once.get_ref().output(), twice.get_ref().output());
        assert_eq!(count(&twice.get_ref().output(), b"0\r\n\r\n"), 1);
    }

    #[test]
    fn close_without_body_sends_empty_response() {
        let mut stream = ResponseStream::new(Recorder::default(), response(false));

        stream.blocking_close().unwrap();

        assert_eq!(stream.get_ref().output(), format!("{HEAD}content-length: 0\r\n\r\n").into_bytes());
    }

    #[test]
    fn chunked_close_without_body_sends_head_and_terminal_chunk_together() {
        let mut stream = ResponseStream::new(Recorder::default(), response(true));

        stream.blocking_close().unwrap();

        let writes = &stream.get_ref().writes;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], format!("{HEAD}transfer-encoding: chunked\r\n\r\n0\r\n\r\n").into_bytes());
    }

    #[test]
    fn empty_write_never_emits_a_terminal_chunk() {
        let mut stream = ResponseStream::new(Recorder::default(), response(true));

        stream.blocking_write(b"").unwrap();
        stream.blocking_write(b"a").unwrap();

        let output = stream.get_ref().output();
        assert!(output.ends_with(b"\r\n\r\n1\r\na\r\n"));
        assert!(stream.response().headers_sent());
    }

    #[test]
    fn write_after_close_fails() {
        let mut stream = ResponseStream::new(Recorder::default(), response(false));
        stream.blocking_close().unwrap();

        assert!(matches!(stream.blocking_write(b"late"), Err(SendError::Disposed)));
        assert!(stream.is_closed());
    }

    #[test]
    fn random_access_is_unsupported() {
        let mut stream = ResponseStream::new(Recorder::default(), response(false));

        assert!(!stream.can_read());
        assert!(!stream.can_seek());
        assert!(stream.can_write());
        assert!(matches!(stream.read(&mut [0; 4]), Err(SendError::Unsupported { operation: "read" })));
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(SendError::Unsupported { operation: "seek" })));
        assert!(matches!(stream.set_len(0), Err(SendError::Unsupported { operation: "set_len" })));
        assert!(matches!(stream.len(), Err(SendError::Unsupported { operation: "len" })));
        assert!(matches!(stream.position(), Err(SendError::Unsupported { operation: "position" })));
    }

    #[test]
    fn strict_mode_propagates_write_errors() {
        let mut stream = ResponseStream::new(Recorder::failing(), response(false));

        let error = stream.blocking_write(b"data").unwrap_err();

        match error {
            SendError::Io { source } => assert_eq!(source.kind(), io::ErrorKind::ConnectionReset),
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn ignore_errors_mode_swallows_write_errors() {
        let mut stream = ResponseStream::new(Recorder::failing(), response(true)).ignore_errors(true);

        stream.blocking_write(b"data").unwrap();
        stream.blocking_close().unwrap();

        assert!(stream.is_closed());
        assert!(stream.response().is_closed());
    }

    #[test]
    fn std_write_trait() {
        let mut stream = ResponseStream::new(Recorder::default(), response(true));

        write!(stream, "{}-{}", 1, 2).unwrap();
        Write::flush(&mut stream).unwrap();
        stream.blocking_close().unwrap();

        // write_fmt issues one write per formatted fragment
        let expected = format!("{HEAD}transfer-encoding: chunked\r\n\r\n1\r\n1\r\n1\r\n-\r\n1\r\n2\r\n0\r\n\r\n");
        assert_eq!(stream.get_ref().output(), expected.as_bytes());
    }

    #[test]
    fn writers_sharing_a_response_send_headers_once() {
        let response = response(false);
        let mut first = ResponseStream::new(Recorder::default(), Arc::clone(&response));
        let mut second = ResponseStream::new(Recorder::default(), Arc::clone(&response));

        second.blocking_write(b"b").unwrap();
        first.blocking_write(b"a").unwrap();

        assert_eq!(first.get_ref().output(), b"a");
        assert!(second.get_ref().output().starts_with(b"HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn async_chunked_writes_then_close() {
        let mut stream = ResponseStream::new(Recorder::default(), response(true));

        stream.write(b"ab").await.unwrap();
        stream.write(b"cde").await.unwrap();
        stream.close().await.unwrap();
        stream.close().await.unwrap();

        let expected = format!("{HEAD}transfer-encoding: chunked\r\n\r\n2\r\nab\r\n3\r\ncde\r\n0\r\n\r\n");
        assert_eq!(stream.get_ref().output(), expected.as_bytes());
        assert!(matches!(stream.write(b"late").await, Err(SendError::Disposed)));
    }

    #[tokio::test]
    async fn concurrent_async_writers_send_headers_once() {
        let response = response(true);
        let mut first = ResponseStream::new(Recorder::default(), Arc::clone(&response));
        let mut second = ResponseStream::new(Recorder::default(), Arc::clone(&response));

        let (a, b) = futures::join!(first.write(b"a"), second.write(b"b"));
        a.unwrap();
        b.unwrap();

        let outputs = [first.get_ref().output(), second.get_ref().output()];
        assert_eq!(outputs.iter().map(|output| count(output, b"HTTP/1.1 200 OK")).sum::<usize>(), 1);
        assert!(outputs.iter().any(|output| output == b"1\r\na\r\n" || output == b"1\r\nb\r\n"));
    }

    #[tokio::test]
    async fn async_ignore_errors() {
        let mut stream = ResponseStream::new(Recorder::failing(), response(false)).ignore_errors(true);

        stream.write(b"data").await.unwrap();
        stream.close().await.unwrap();

        let mut strict = ResponseStream::new(Recorder::failing(), response(false));
        assert!(matches!(strict.write(b"data").await, Err(SendError::Io { .. })));
    }

    #[tokio::test]
    async fn poll_based_writes_share_framing() {
        let mut stream = ResponseStream::new(Recorder::default(), response(true));

        AsyncWriteExt::write_all(&mut stream, b"ab").await.unwrap();
        AsyncWriteExt::write_all(&mut stream, b"cde").await.unwrap();
        AsyncWriteExt::shutdown(&mut stream).await.unwrap();
        AsyncWriteExt::shutdown(&mut stream).await.unwrap();

        let expected = format!("{HEAD}transfer-encoding: chunked\r\n\r\n2\r\nab\r\n3\r\ncde\r\n0\r\n\r\n");
        assert_eq!(stream.get_ref().output(), expected.as_bytes());
        assert!(stream.response().is_closed());

        let error = AsyncWriteExt::write_all(&mut stream, b"late").await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn poll_based_failed_shutdown_still_closes_response() {
        let mut stream = ResponseStream::new(Recorder::failing(), response(true));

        let error = AsyncWriteExt::shutdown(&mut stream).await.unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
        assert!(stream.is_closed());
        assert!(stream.is_finished());
        assert!(stream.response().is_closed());
    }

    #[tokio::test]
    async fn poll_based_write_errors_surface_on_flush() {
        let mut stream = ResponseStream::new(Recorder::failing(), response(false));

        AsyncWriteExt::write_all(&mut stream, b"data").await.unwrap();
        let error = AsyncWriteExt::flush(&mut stream).await.unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
    }
}

//! Response body handling implementation.
//!
//! A response body is one of a small, closed set of variants:
//!
//! - a [`DeferredBuffer`]: the default, an in-memory buffer that can be written,
//!   read and viewed repeatedly
//! - a foreign stream: anything implementing [`BodyStream`], typically handed over
//!   by a caller or by the transport; it can be read once and closed once
//! - closed: a foreign stream that has been fully consumed
//!
//! Whatever the variant, a [`Body`] exposes the same three capabilities: write,
//! drain-to-bytes and close. When a capability needs repeatable access to a
//! foreign stream, the stream is copied into a [`DeferredBuffer`] exactly once,
//! closed, and the buffer takes its place.
//!
//! Installing a stream into a [`Body`] moves it: from then on the body is the
//! only owner, and the only place allowed to close it.

mod deferred;

pub use deferred::DeferredBuffer;

use bytes::Bytes;
use std::fmt;
use std::io;
use std::io::Read;
use std::mem;
use tracing::{trace, warn};

/// A read-once stream that can be installed as a response body.
pub trait BodyStream: io::Read + Send {
    /// Releases the underlying resource.
    ///
    /// [`Body`] calls this exactly once, after which the stream is dropped.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Returns a writer when the stream also accepts appended bytes.
    fn as_writer(&mut self) -> Option<&mut dyn io::Write> {
        None
    }
}

/// Adapts a plain reader into a [`BodyStream`] whose close does nothing.
struct NopClose<R>(R);

impl<R: io::Read> io::Read for NopClose<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: io::Read + Send> BodyStream for NopClose<R> {}

pub struct Body {
    kind: Kind,
}

enum Kind {
    Deferred(DeferredBuffer),
    Stream(Box<dyn BodyStream>),
    Closed,
}

impl Body {
    pub fn empty() -> Self {
        Self { kind: Kind::Deferred(DeferredBuffer::new()) }
    }

    /// Adopts a plain reader as the body.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: io::Read + Send + 'static,
    {
        Self::from_stream(NopClose(reader))
    }

    /// Adopts a stream as the body, taking over the duty to close it.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: BodyStream + 'static,
    {
        Self { kind: Kind::Stream(Box::new(stream)) }
    }

    /// Returns true if the body is backed by a [`DeferredBuffer`]
    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, Kind::Deferred(_))
    }

    /// Returns true if the body was a stream that has been consumed and closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.kind, Kind::Closed)
    }

    pub fn as_deferred(&self) -> Option<&DeferredBuffer> {
        match &self.kind {
            Kind::Deferred(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Returns the body's writer when it can be written to without conversion.
    pub fn writer(&mut self) -> Option<&mut dyn io::Write> {
        match &mut self.kind {
            Kind::Deferred(buffer) => Some(buffer),
            Kind::Stream(stream) => stream.as_writer(),
            Kind::Closed => None,
        }
    }

    /// Drains the whole body and closes it.
    ///
    /// A deferred buffer is emptied but stays usable; a stream is closed for
    /// good and any later read fails.
    pub fn read_all(&mut self) -> io::Result<Bytes> {
        match mem::replace(&mut self.kind, Kind::Closed) {
            Kind::Deferred(mut buffer) => {
                let bytes = buffer.split_all();
                self.kind = Kind::Deferred(buffer);
                Ok(bytes)
            }
            Kind::Stream(mut stream) => {
                let mut buf = Vec::new();
                let result = stream.read_to_end(&mut buf);
                close_stream(stream);
                result.map(|_| Bytes::from(buf))
            }
            Kind::Closed => Err(consumed()),
        }
    }

    /// Returns the whole body while keeping it readable.
    ///
    /// A stream is read once into a fresh [`DeferredBuffer`] which replaces it,
    /// and the stream is closed. If reading fails midway the buffer keeps what
    /// was read before the failure.
    pub fn snapshot(&mut self) -> io::Result<Bytes> {
        let mut stream = match mem::replace(&mut self.kind, Kind::Closed) {
            Kind::Deferred(buffer) => {
                let bytes = Bytes::copy_from_slice(buffer.as_bytes());
                self.kind = Kind::Deferred(buffer);
                return Ok(bytes);
            }
            Kind::Stream(stream) => stream,
            Kind::Closed => return Err(consumed()),
        };

        trace!("copy body stream into deferred buffer");
        let mut buffer = DeferredBuffer::new();
        let result = buffer.fill_from(&mut *stream);
        close_stream(stream);

        let bytes = Bytes::copy_from_slice(buffer.as_bytes());
        self.kind = Kind::Deferred(buffer);
        result.map(|_| bytes)
    }

    /// Closes the body. Idempotent; a deferred buffer keeps its bytes.
    pub fn close(&mut self) -> io::Result<()> {
        match mem::replace(&mut self.kind, Kind::Closed) {
            Kind::Stream(mut stream) => stream.close(),
            Kind::Deferred(buffer) => {
                self.kind = Kind::Deferred(buffer);
                Ok(())
            }
            Kind::Closed => Ok(()),
        }
    }

    /// Drains a non-writable stream into a new buffer and closes it.
    ///
    /// On failure the stream stays in place, but the bytes read before the
    /// failure are gone.
    fn drain_stream(&mut self) -> io::Result<DeferredBuffer> {
        match mem::replace(&mut self.kind, Kind::Closed) {
            Kind::Stream(mut stream) => {
                trace!("drain body stream before writing");
                let mut buffer = DeferredBuffer::new();
                if let Err(e) = buffer.fill_from(&mut *stream) {
                    warn!(cause = %e, "failed to drain body stream, part of the body may be lost");
                    self.kind = Kind::Stream(stream);
                    return Err(e);
                }
                close_stream(stream);
                Ok(buffer)
            }
            Kind::Deferred(buffer) => Ok(buffer),
            Kind::Closed => Err(consumed()),
        }
    }
}

fn close_stream(mut stream: Box<dyn BodyStream>) {
    if let Err(e) = stream.close() {
        warn!(cause = %e, "failed to close body stream");
    }
}

fn consumed() -> io::Error {
    io::Error::other("body has been consumed")
}

impl io::Write for Body {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(writer) = self.writer() {
            return writer.write(buf);
        }

        let mut buffer = self.drain_stream()?;
        let n = io::Write::write(&mut buffer, buf)?;
        self.kind = Kind::Deferred(buffer);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl io::Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Deferred(buffer) => buffer.read(buf),
            Kind::Stream(stream) => stream.read(buf),
            Kind::Closed => Err(consumed()),
        }
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        if let Kind::Stream(stream) = mem::replace(&mut self.kind, Kind::Closed) {
            close_stream(stream);
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Deferred(buffer) => f.debug_tuple("Body::Deferred").field(&buffer.len()).finish(),
            Kind::Stream(_) => f.write_str("Body::Stream"),
            Kind::Closed => f.write_str("Body::Closed"),
        }
    }
}

impl From<DeferredBuffer> for Body {
    fn from(buffer: DeferredBuffer) -> Self {
        Self { kind: Kind::Deferred(buffer) }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        DeferredBuffer::from(bytes).into()
    }
}

impl From<Vec<u8>> for Body {
    fn from(vec: Vec<u8>) -> Self {
        DeferredBuffer::from(vec).into()
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        value.into_bytes().into()
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Bytes::from_static(value.as_bytes()).into()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::BodyStream;
    use std::io;
    use std::io::Read;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A read-only stream that counts how many times it was closed.
    pub(crate) struct TrackedStream {
        data: io::Cursor<Vec<u8>>,
        closes: Arc<AtomicUsize>,
        fail_after: Option<usize>,
    }

    impl TrackedStream {
        pub(crate) fn new(data: &[u8]) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            (Self { data: io::Cursor::new(data.to_vec()), closes: Arc::clone(&closes), fail_after: None }, closes)
        }

        /// Fails every read once `n` bytes have been handed out.
        pub(crate) fn failing_after(data: &[u8], n: usize) -> (Self, Arc<AtomicUsize>) {
            let (mut stream, closes) = Self::new(data);
            stream.fail_after = Some(n);
            (stream, closes)
        }
    }

    impl io::Read for TrackedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.fail_after {
                Some(limit) if self.data.position() as usize >= limit => {
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
                }
                Some(limit) => {
                    let remaining = limit - self.data.position() as usize;
                    let n = buf.len().min(remaining);
                    self.data.read(&mut buf[..n])
                }
                None => self.data.read(buf),
            }
        }
    }

    impl BodyStream for TrackedStream {
        fn close(&mut self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// A stream that also accepts writes, appending to its own contents.
    pub(crate) struct WritableStream {
        pub(crate) data: io::Cursor<Vec<u8>>,
    }

    impl io::Read for WritableStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.data.read(buf)
        }
    }

    impl io::Write for WritableStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.get_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl BodyStream for WritableStream {
        fn as_writer(&mut self) -> Option<&mut dyn io::Write> {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{TrackedStream, WritableStream};
    use super::*;
    use std::io::Write;
    use std::sync::atomic::Ordering;

    #[test]
    fn empty_body_is_deferred() {
        let mut body = Body::empty();
        assert!(body.is_deferred());
        assert!(body.writer().is_some());
        assert!(body.read_all().unwrap().is_empty());
    }

    #[test]
    fn write_to_deferred() {
        let mut body = Body::from("ab");
        body.write_all(b"cd").unwrap();
        assert_eq!(body.snapshot().unwrap(), Bytes::from_static(b"abcd"));
        assert_eq!(body.read_all().unwrap(), Bytes::from_static(b"abcd"));
        assert!(body.read_all().unwrap().is_empty());
    }

    #[test]
    fn snapshot_converts_stream_once() {
        let (stream, closes) = TrackedStream::new(b"foreign");
        let mut body = Body::from_stream(stream);
        assert!(!body.is_deferred());

        assert_eq!(body.snapshot().unwrap(), Bytes::from_static(b"foreign"));
        assert!(body.is_deferred());
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        assert_eq!(body.snapshot().unwrap(), Bytes::from_static(b"foreign"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn read_all_closes_stream() {
        let (stream, closes) = TrackedStream::new(b"once");
        let mut body = Body::from_stream(stream);

        assert_eq!(body.read_all().unwrap(), Bytes::from_static(b"once"));
        assert!(body.is_closed());
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        assert!(body.read_all().is_err());
        let mut buf = [0u8; 4];
        assert!(body.read(&mut buf).is_err());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn write_drains_read_only_stream() {
        let (stream, closes) = TrackedStream::new(b"head-");
        let mut body = Body::from_stream(stream);

        assert_eq!(body.write(b"tail").unwrap(), 4);
        assert!(body.is_deferred());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(body.snapshot().unwrap(), Bytes::from_static(b"head-tail"));
    }

    #[test]
    fn write_to_writable_stream_directly() {
        let stream = WritableStream { data: io::Cursor::new(b"x".to_vec()) };
        let mut body = Body::from_stream(stream);

        body.write_all(b"yz").unwrap();
        assert!(!body.is_deferred());
        assert_eq!(body.read_all().unwrap(), Bytes::from_static(b"xyz"));
    }

    #[test]
    fn failed_drain_keeps_stream() {
        let (stream, closes) = TrackedStream::failing_after(b"0123456789", 4);
        let mut body = Body::from_stream(stream);

        assert!(body.write(b"new").is_err());
        assert!(!body.is_deferred());
        assert!(!body.is_closed());
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        drop(body);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_snapshot_keeps_partial_bytes() {
        let (stream, closes) = TrackedStream::failing_after(b"0123456789", 4);
        let mut body = Body::from_stream(stream);

        assert!(body.snapshot().is_err());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(body.as_deferred().unwrap().as_bytes(), b"0123");
    }

    #[test]
    fn drop_closes_open_stream() {
        let (stream, closes) = TrackedStream::new(b"unread");
        drop(Body::from_stream(stream));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let (stream, closes) = TrackedStream::new(b"data");
        let mut body = Body::from_stream(stream);
        body.close().unwrap();
        body.close().unwrap();
        drop(body);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let mut deferred = Body::from("kept");
        deferred.close().unwrap();
        assert_eq!(deferred.snapshot().unwrap(), Bytes::from_static(b"kept"));
    }

    #[test]
    fn plain_reader_body() {
        let mut body = Body::from_reader(io::Cursor::new(b"plain".to_vec()));
        assert!(body.writer().is_none());
        let mut s = String::new();
        body.read_to_string(&mut s).unwrap();
        assert_eq!(s, "plain");
    }
}

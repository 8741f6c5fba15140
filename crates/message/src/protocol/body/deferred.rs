use bytes::{Buf, Bytes, BytesMut};
use std::io;

const INIT_BUFFER_SIZE: usize = 512;

/// An in-memory, growable body.
///
/// Writes append to the end, reads consume from the front. Closing a
/// `DeferredBuffer` is a no-op: buffered bytes survive it, so a body that has
/// been drained can still be written to later.
#[derive(Debug, Default, Clone)]
pub struct DeferredBuffer {
    buf: BytesMut,
}

impl DeferredBuffer {
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity) }
    }

    /// Number of bytes not yet read.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// A view of the unread bytes; does not advance the read position.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Reads every remaining byte out of the buffer.
    pub fn split_all(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    /// Copies everything `reader` yields into the buffer.
    ///
    /// On error, bytes read before the failure stay buffered.
    pub fn fill_from<R: io::Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<u64> {
        if self.buf.capacity() == 0 {
            self.buf.reserve(INIT_BUFFER_SIZE);
        }
        io::copy(reader, self)
    }
}

impl From<Bytes> for DeferredBuffer {
    fn from(bytes: Bytes) -> Self {
        Self { buf: BytesMut::from(&bytes[..]) }
    }
}

impl From<Vec<u8>> for DeferredBuffer {
    fn from(vec: Vec<u8>) -> Self {
        Self { buf: BytesMut::from(&vec[..]) }
    }
}

impl AsRef<[u8]> for DeferredBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl io::Write for DeferredBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for DeferredBuffer {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let n = dst.len().min(self.buf.len());
        dst[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        Ok(n)
    }
}

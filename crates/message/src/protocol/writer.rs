//! Adapters letting handler code written against a plain response writer
//! populate a [`Response`].
//!
//! The adapters hold no state of their own: headers, status and body all go
//! straight to the wrapped response.

use std::io;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};

use crate::protocol::{Connection, Hijacker, Response, ResponseError};

/// The output side of a handler: status, headers and a streaming body.
pub trait ResponseWriter: io::Write {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_header(&mut self, status: StatusCode);

    /// Records a terminal error on the response.
    fn write_error(&mut self, error: ResponseError);

    /// Takes over the connection, or `None` when the transport can not hand it over.
    fn hijack(&mut self) -> Option<io::Result<Box<dyn Connection>>> {
        None
    }
}

pub(crate) struct WriterWrapper<'a> {
    response: &'a mut Response,
}

impl<'a> WriterWrapper<'a> {
    pub(crate) fn new(response: &'a mut Response) -> Self {
        Self { response }
    }
}

impl io::Write for WriterWrapper<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.response.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.response.flush()
    }
}

impl ResponseWriter for WriterWrapper<'_> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.response.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    fn write_error(&mut self, error: ResponseError) {
        self.response.set_error(error);
    }
}

pub(crate) struct HijackWriter<'a> {
    inner: WriterWrapper<'a>,
    hijacker: Arc<dyn Hijacker>,
}

impl<'a> HijackWriter<'a> {
    pub(crate) fn new(response: &'a mut Response, hijacker: Arc<dyn Hijacker>) -> Self {
        Self { inner: WriterWrapper::new(response), hijacker }
    }
}

impl io::Write for HijackWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl ResponseWriter for HijackWriter<'_> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.inner.write_header(status);
    }

    fn write_error(&mut self, error: ResponseError) {
        self.inner.write_error(error);
    }

    fn hijack(&mut self) -> Option<io::Result<Box<dyn Connection>>> {
        let result = self.hijacker.hijack();
        if result.is_ok() {
            self.inner.response.mark_hijacked();
        }
        Some(result)
    }
}

//! The response value shared by clients and servers.
//!
//! A [`Response`] bundles an `http::Response<Body>` with the payload size the
//! body has reached, an optional terminal error and a handle on the request
//! being answered. The underlying `http::Response` may be missing entirely,
//! for instance when the transport failed before anything was received; the
//! operations that need one create a `200 OK` shell on demand.
//!
//! A `Response` is not meant to be shared between threads without external
//! synchronisation: reading or writing the body may swap the stream it is
//! backed by.

use std::fmt;
use std::io;
use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, Version, header};
use http_body_util::Full;
use tracing::{debug, trace};

use crate::codec::{self, APPLICATION_JSON, APPLICATION_PROTOBUF, Decodable, Encodable};
use crate::protocol::body::Body;
use crate::protocol::writer::{HijackWriter, ResponseWriter, WriterWrapper};
use crate::protocol::{PayloadSize, RequestHeader, ResponseError, WrapDownstreamErrors};

/// Number of header slots reserved for a new response
const HEADER_CAPACITY: usize = 5;

#[derive(Debug, Default)]
pub struct Response {
    inner: Option<http::Response<Body>>,
    payload_size: PayloadSize,
    error: Option<ResponseError>,
    request: Option<Arc<RequestHeader>>,
    hijacked: bool,
}

impl Response {
    /// Creates a `200 OK` response to `request` with an empty body.
    pub fn new(request: impl Into<Arc<RequestHeader>>) -> Self {
        Self::with_status(request, StatusCode::OK)
    }

    /// Creates a response to `request` with the given status and an empty body.
    pub fn with_status(request: impl Into<Arc<RequestHeader>>, status: StatusCode) -> Self {
        let request = request.into();
        Self {
            inner: Some(new_http_response(Some(&*request), status)),
            payload_size: PayloadSize::Length(0),
            error: None,
            request: Some(request),
            hijacked: false,
        }
    }

    /// A response that carries nothing but an error.
    pub fn from_error(request: Option<Arc<RequestHeader>>, error: ResponseError) -> Self {
        Self { error: Some(error), request, ..Self::default() }
    }

    /// Wraps a response received from the transport.
    ///
    /// The payload size is taken from `Content-Length`, or unknown without it.
    pub fn from_http(request: Option<Arc<RequestHeader>>, response: http::Response<Body>) -> Self {
        let payload_size = PayloadSize::from_headers(response.headers());
        Self { inner: Some(response), payload_size, error: None, request, hijacked: false }
    }

    fn ensure_inner(&mut self) -> &mut http::Response<Body> {
        let request = self.request.as_deref();
        self.inner.get_or_insert_with(|| {
            trace!("response has no head yet, create a 200 one");
            new_http_response(request, StatusCode::OK)
        })
    }

    /// Returns the status, or `None` if there is no underlying response.
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.as_ref().map(http::Response::status)
    }

    pub fn set_status(&mut self, status: StatusCode) {
        *self.ensure_inner().status_mut() = status;
    }

    pub fn version(&self) -> Option<Version> {
        self.inner.as_ref().map(http::Response::version)
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.inner.as_ref().map(http::Response::headers)
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.ensure_inner().headers_mut()
    }

    pub fn body(&self) -> Option<&Body> {
        self.inner.as_ref().map(http::Response::body)
    }

    pub fn body_mut(&mut self) -> &mut Body {
        self.ensure_inner().body_mut()
    }

    /// Replaces the body; the previous one is closed.
    ///
    /// The payload size becomes the buffered length for an in-memory body and
    /// unknown for a stream.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        let body = body.into();
        self.payload_size = body.as_deferred().map_or(PayloadSize::Chunked, |buffer| PayloadSize::Length(buffer.len() as u64));
        *self.body_mut() = body;
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    pub fn set_payload_size(&mut self, payload_size: PayloadSize) {
        self.payload_size = payload_size;
    }

    pub fn error(&self) -> Option<&ResponseError> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, error: ResponseError) {
        self.error = Some(error);
    }

    pub fn take_error(&mut self) -> Option<ResponseError> {
        self.error.take()
    }

    /// The request this response answers.
    pub fn request(&self) -> Option<&RequestHeader> {
        self.request.as_deref()
    }

    /// Returns true once the connection has been handed over to a handler.
    pub fn is_hijacked(&self) -> bool {
        self.hijacked
    }

    pub(crate) fn mark_hijacked(&mut self) {
        self.hijacked = true;
    }

    fn accepts_protobuf(&self) -> bool {
        self.request.as_deref().and_then(RequestHeader::accept).is_some_and(codec::accepts_protobuf)
    }

    fn wraps_downstream_errors(&self) -> bool {
        self.request
            .as_deref()
            .and_then(RequestHeader::wrap_downstream_errors)
            .is_some_and(WrapDownstreamErrors::is_active)
    }

    /// Serialises `value` into the body and sets the matching `Content-Type`.
    ///
    /// Raw bodies are adopted as they are, with an unknown length and no
    /// `Content-Type`. Other values are encoded as protobuf when the request
    /// accepts it and the value supports it, and as JSON otherwise.
    ///
    /// Failures are not returned: they are recorded in [`Response::error`],
    /// nothing is written to the body and the `Content-Type` is left unset.
    pub fn encode<T: Encodable>(&mut self, value: T) -> &mut Self {
        self.ensure_inner();

        let value = match value.into_body() {
            Ok(body) => {
                trace!("adopt raw stream as response body");
                *self.body_mut() = body;
                self.payload_size = PayloadSize::Chunked;
                return self;
            }
            Err(value) => value,
        };

        if self.accepts_protobuf() {
            if let Some(encoded) = value.encode_protobuf() {
                return self.write_protobuf(encoded);
            }
        }

        let mut encoded = Vec::new();
        if let Err(e) = value.encode_json(&mut encoded) {
            debug!(cause = %e, "failed to encode response body as json");
            self.error = Some(ResponseError::from(e).wrap());
            return self;
        }
        if let Err(e) = self.write_all(&encoded) {
            debug!(cause = %e, "failed to write json body");
            self.error = Some(ResponseError::io(e).wrap());
            return self;
        }
        self.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self
    }

    /// Serialises `message` as protobuf into the body.
    ///
    /// The `Content-Type` and the payload size are overwritten: the payload is
    /// always complete, so its length is exactly the number of bytes written.
    pub fn encode_protobuf<M: prost::Message>(&mut self, message: &M) -> &mut Self {
        self.write_protobuf(codec::marshal(message))
    }

    fn write_protobuf(&mut self, encoded: Result<Bytes, prost::EncodeError>) -> &mut Self {
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(cause = %e, "failed to marshal protobuf message");
                self.error = Some(ResponseError::from(e).wrap());
                return self;
            }
        };

        let written = match self.write(&bytes) {
            Ok(n) => n,
            Err(e) => {
                debug!(cause = %e, "failed to write protobuf body");
                self.error = Some(ResponseError::io(e).wrap());
                0
            }
        };
        self.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_PROTOBUF));
        self.payload_size = PayloadSize::Length(written as u64);
        self
    }

    /// Deserialises the body.
    ///
    /// If an error is already recorded the body is left alone and the error is
    /// returned, rewrapped as a `downstream` error when the request asks for it.
    /// Otherwise the body is consumed and decoded according to its
    /// `Content-Type`: protobuf media types need a target with a protobuf form,
    /// anything else is read as JSON.
    pub fn decode<T: Decodable>(&mut self) -> Result<T, ResponseError> {
        if let Some(error) = &self.error {
            if self.wraps_downstream_errors() {
                return Err(ResponseError::downstream(error.clone()));
            }
            return Err(error.clone());
        }

        let content_type = self.inner.as_ref().map(|inner| {
            inner.headers().get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()).is_some_and(codec::is_protobuf)
        });
        let Some(protobuf) = content_type else {
            return Err(self.record(ResponseError::no_body()));
        };

        let bytes = match self.body_bytes(true) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.record(ResponseError::bad_response(e))),
        };

        if protobuf {
            match T::decode_protobuf(&bytes) {
                Some(result) => result.map_err(|e| self.record(e.into())),
                None => Err(ResponseError::invalid_type("could not decode proto message")),
            }
        } else {
            T::decode_json(&bytes).map_err(|e| self.record(e.into()))
        }
    }

    fn record(&mut self, error: ResponseError) -> ResponseError {
        debug!(cause = %error, "failed to decode response");
        self.error = Some(error.clone());
        error
    }

    /// Reads the whole body.
    ///
    /// With `consume` the body is drained and closed: a stream can not be read
    /// again afterwards. Without it the body stays readable; a stream is read
    /// once into an in-memory buffer that takes its place.
    pub fn body_bytes(&mut self, consume: bool) -> io::Result<Bytes> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "response has no body"));
        };

        if consume { inner.body_mut().read_all() } else { inner.body_mut().snapshot() }
    }

    /// Returns an adapter for handler code written against a plain response writer.
    ///
    /// When the request's transport can hand over its connection, the adapter
    /// exposes that through [`ResponseWriter::hijack`].
    pub fn writer(&mut self) -> Box<dyn ResponseWriter + '_> {
        match self.request.as_deref().and_then(RequestHeader::hijacker).cloned() {
            Some(hijacker) => Box::new(HijackWriter::new(self, hijacker)),
            None => Box::new(WriterWrapper::new(self)),
        }
    }

    /// Hands the response over to the transport.
    ///
    /// The body is drained, and framed with `Content-Length` when its length
    /// is known or `Transfer-Encoding: chunked` when it is not. A known length
    /// is always the number of bytes drained, even if the payload size says
    /// otherwise. A recorded error is returned instead.
    pub fn into_http(mut self) -> Result<http::Response<Full<Bytes>>, ResponseError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        let Some(inner) = self.inner.take() else {
            return Err(ResponseError::no_body());
        };

        let (mut parts, mut body) = inner.into_parts();
        let bytes = body.read_all().map_err(|e| ResponseError::io(e).wrap())?;

        match self.payload_size {
            PayloadSize::Length(n) => {
                let len = bytes.len() as u64;
                if n != len {
                    debug!(payload_size = n, body_len = len, "payload size does not match body, frame with body length");
                }
                parts.headers.remove(header::TRANSFER_ENCODING);
                parts.headers.insert(header::CONTENT_LENGTH, len.into());
            }
            PayloadSize::Chunked => {
                parts.headers.remove(header::CONTENT_LENGTH);
                parts.headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            }
        }

        Ok(http::Response::from_parts(parts, Full::new(bytes)))
    }
}

/// Writes to the body, tracking the payload size.
///
/// A body stream that can not be written to is first read into memory and
/// closed; if reading it fails the write fails, and whatever was read is lost.
impl io::Write for Response {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.ensure_inner().body_mut().write(buf)?;
        self.payload_size = self.payload_size.advance(n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.body_mut().flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Response(")?;
        match self.status() {
            Some(status) => write!(f, "{}", status.as_u16())?,
            None => f.write_str("???")?,
        }
        if let Some(error) = &self.error {
            write!(f, ", error: {error}")?;
        }
        f.write_str(")")
    }
}

fn new_http_response(request: Option<&RequestHeader>, status: StatusCode) -> http::Response<Body> {
    let mut response = http::Response::new(Body::empty());
    *response.status_mut() = status;
    *response.version_mut() = request.map_or(Version::HTTP_11, RequestHeader::version);
    response.headers_mut().reserve(HEADER_CAPACITY);
    response
}

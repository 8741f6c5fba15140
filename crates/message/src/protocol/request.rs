//! HTTP request header handling implementation.
//!
//! A response keeps a shared, read-only handle on the request it answers. This
//! module provides that handle: the request's method, uri, version and headers,
//! plus the per-request settings the response consults.

use std::fmt;
use std::io;
use std::sync::Arc;

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version, header};

/// A connection the transport has handed over to the caller.
pub trait Connection: io::Read + io::Write + Send {}

impl<T: io::Read + io::Write + Send> Connection for T {}

/// Transport capability to give up a connection to whoever asks for it.
pub trait Hijacker: Send + Sync {
    fn hijack(&self) -> io::Result<Box<dyn Connection>>;
}

/// Enables rewrapping of downstream errors on a per-request basis.
///
/// When attached to a request with a non-empty value, decoding a response that
/// carries an error returns a fresh internal error tagged `downstream` with the
/// original as its cause, instead of the original itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapDownstreamErrors(pub String);

impl WrapDownstreamErrors {
    pub fn is_active(&self) -> bool {
        !self.0.is_empty()
    }
}

/// Represents an HTTP request header.
///
/// This struct wraps a `http::Request<()>` to provide:
/// - Access to standard HTTP header fields
/// - The downstream error policy for responses to this request
/// - The transport's hijacking capability, when there is one
pub struct RequestHeader {
    inner: Request<()>,
    wrap_downstream_errors: Option<WrapDownstreamErrors>,
    hijacker: Option<Arc<dyn Hijacker>>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns the `Accept` header, if present and valid ascii.
    pub fn accept(&self) -> Option<&str> {
        self.headers().get(header::ACCEPT).and_then(|value| value.to_str().ok())
    }

    pub fn wrap_downstream_errors(&self) -> Option<&WrapDownstreamErrors> {
        self.wrap_downstream_errors.as_ref()
    }

    #[must_use]
    pub fn with_wrap_downstream_errors(mut self, policy: WrapDownstreamErrors) -> Self {
        self.wrap_downstream_errors = Some(policy);
        self
    }

    pub fn hijacker(&self) -> Option<&Arc<dyn Hijacker>> {
        self.hijacker.as_ref()
    }

    #[must_use]
    pub fn with_hijacker(mut self, hijacker: Arc<dyn Hijacker>) -> Self {
        self.hijacker = Some(hijacker);
        self
    }
}

impl Default for RequestHeader {
    fn default() -> Self {
        Request::new(()).into()
    }
}

impl fmt::Debug for RequestHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHeader")
            .field("inner", &self.inner)
            .field("wrap_downstream_errors", &self.wrap_downstream_errors)
            .field("hijacker", &self.hijacker.is_some())
            .finish()
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Request::from_parts(parts, ()).into()
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner, wrap_downstream_errors: None, hijacker: None }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn from_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/greet?name=zava")
            .version(Version::HTTP_11)
            .header(header::ACCEPT, "application/protobuf, application/json")
            .body(())
            .unwrap();

        let header = RequestHeader::from(request);

        assert_eq!(header.method(), &Method::POST);
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.uri().path(), "/greet");
        assert_eq!(header.uri().query(), Some("name=zava"));
        assert_eq!(header.accept(), Some("application/protobuf, application/json"));
        assert!(header.wrap_downstream_errors().is_none());
        assert!(header.hijacker().is_none());
    }

    #[test]
    fn accept_must_be_ascii() {
        let mut header = RequestHeader::default();
        header.as_mut().headers_mut().insert(header::ACCEPT, HeaderValue::from_bytes(b"\xff").unwrap());
        assert_eq!(header.accept(), None);
    }

    #[test]
    fn downstream_policy() {
        let header = RequestHeader::default().with_wrap_downstream_errors(WrapDownstreamErrors("on".into()));
        assert!(header.wrap_downstream_errors().unwrap().is_active());
        assert!(!WrapDownstreamErrors(String::new()).is_active());
    }
}

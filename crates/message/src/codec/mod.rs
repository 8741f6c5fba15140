//! Serialization format negotiation.
//!
//! A response body is encoded as JSON unless the request asked for protobuf
//! and the payload can be encoded as protobuf. On the way back, the response's
//! `Content-Type` decides which codec reads the body.
//!
//! Payloads are described by wrapper types, in the same way extractors are:
//!
//! - [`Json`]: always JSON
//! - [`Protobuf`]: protobuf when negotiated, JSON otherwise
//! - [`Body`]: a raw byte stream, adopted as-is
//!
//! # Example
//! ```
//! # use serde::{Deserialize, Serialize};
//! # use micro_message::codec::Json;
//! # use micro_message::protocol::Response;
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Greeting {
//!     message: String,
//! }
//!
//! let mut response = Response::default();
//! response.encode(Json(Greeting { message: "hello".into() }));
//!
//! let Json(greeting): Json<Greeting> = response.decode().unwrap();
//! assert_eq!(greeting.message, "hello");
//! ```

mod json;
mod protobuf;

pub use json::Json;
pub use protobuf::{Protobuf, marshal};

use crate::protocol::body::Body;
use bytes::Bytes;
use std::io;

/// Media type of JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Media type of protobuf bodies, and the token looked for in `Accept`.
pub const APPLICATION_PROTOBUF: &str = "application/protobuf";

/// Media types accepted as protobuf when decoding.
pub const PROTOBUF_MEDIA_TYPES: [&str; 3] = [APPLICATION_PROTOBUF, "application/octet-stream", "application/x-google-protobuf"];

/// Returns true if an `Accept` header value asks for protobuf.
pub fn accepts_protobuf(accept: &str) -> bool {
    accept.contains(APPLICATION_PROTOBUF)
}

/// Returns true if a `Content-Type` value names one of the protobuf media types.
///
/// Parameters such as `charset` are ignored.
pub fn is_protobuf(content_type: &str) -> bool {
    match content_type.parse::<mime::Mime>() {
        Ok(mime) => PROTOBUF_MEDIA_TYPES.contains(&mime.essence_str()),
        Err(_) => false,
    }
}

/// A value [`Response::encode`](crate::protocol::Response::encode) can put into a body.
pub trait Encodable: Sized {
    /// Hands the value over as a raw body when it is one.
    fn into_body(self) -> Result<Body, Self> {
        Err(self)
    }

    /// Encodes the value as protobuf when it supports that format.
    fn encode_protobuf(&self) -> Option<Result<Bytes, prost::EncodeError>> {
        None
    }

    /// Serializes the value as JSON into `writer`.
    fn encode_json<W: io::Write>(&self, writer: W) -> serde_json::Result<()>;
}

/// A value [`Response::decode`](crate::protocol::Response::decode) can read out of a body.
pub trait Decodable: Sized {
    fn decode_json(bytes: &[u8]) -> serde_json::Result<Self>;

    /// Decodes a protobuf body, or `None` if the type has no protobuf form.
    fn decode_protobuf(_bytes: &[u8]) -> Option<Result<Self, prost::DecodeError>> {
        None
    }
}

impl Encodable for Body {
    fn into_body(self) -> Result<Body, Self> {
        Ok(self)
    }

    fn encode_json<W: io::Write>(&self, _writer: W) -> serde_json::Result<()> {
        Err(serde::ser::Error::custom("a raw body can not be serialized as json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_token() {
        assert!(accepts_protobuf("application/protobuf"));
        assert!(accepts_protobuf("application/json, application/protobuf;q=0.9"));
        assert!(!accepts_protobuf("application/json"));
        assert!(!accepts_protobuf("*/*"));
    }

    #[test]
    fn protobuf_media_types() {
        assert!(is_protobuf("application/protobuf"));
        assert!(is_protobuf("application/octet-stream"));
        assert!(is_protobuf("application/x-google-protobuf"));
        assert!(is_protobuf("application/protobuf; charset=binary"));

        assert!(!is_protobuf("application/json"));
        assert!(!is_protobuf("text/plain"));
        assert!(!is_protobuf(""));
    }
}

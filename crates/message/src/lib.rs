//! The response value of the micro http stack
//!
//! This crate provides the response message shared by server handlers and
//! clients: an HTTP response head, a body that may be an in-memory buffer or a
//! foreign stream, the size the payload will be framed with, and the error
//! recorded while producing or consuming it.
//!
//! # Features
//!
//! - In-memory bodies that can be written, read back and drained repeatedly
//! - Foreign body streams, closed exactly once
//! - Automatic switch to chunked framing for large bodies
//! - JSON and protobuf encoding negotiated from the request's `Accept` header
//! - Decoding driven by the response's `Content-Type`
//! - Errors recorded on the response and rewrapped for downstream callers
//! - Writer adapter for handler code, with connection hijacking
//!
//! # Example
//!
//! ```
//! use http::{Request, StatusCode, header};
//! use micro_message::codec::Json;
//! use micro_message::protocol::{RequestHeader, Response};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Greeting {
//!     message: String,
//! }
//!
//! let request = Request::builder()
//!     .header(header::ACCEPT, "application/json")
//!     .body(())
//!     .unwrap();
//!
//! // server side: build the response
//! let mut response = Response::new(RequestHeader::from(request));
//! response.encode(Json(Greeting { message: "hello".into() }));
//! assert_eq!(response.status(), Some(StatusCode::OK));
//!
//! // client side: read it back
//! let Json(greeting): Json<Greeting> = response.decode().unwrap();
//! assert_eq!(greeting.message, "hello");
//! ```
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - [`protocol`]: the response, its body, the request it answers and errors
//! - [`codec`]: JSON and protobuf negotiation
//!
//! # Logging
//!
//! The crate logs through [`tracing`]. Adopting and converting bodies is
//! reported at `trace`, switches to chunked framing and decode failures at
//! `debug`, and streams that could not be drained or closed at `warn`.

pub mod codec;
pub mod protocol;

//! Response messages and the pieces they are built from.
//!
//! This module provides the response value handlers produce and clients
//! consume, together with its body, the request it answers and the errors
//! recorded along the way.
//!
//! # Architecture
//!
//! - **Message Sizing** ([`message`]): how the payload will be framed
//!   - [`PayloadSize`]: a known length, or chunked once the body grows past [`CHUNK_THRESHOLD`]
//!
//! - **Request Handling** ([`request`]): the request a response answers
//!   - [`RequestHeader`]: wraps the request head with per-request settings
//!   - [`Hijacker`]: transport capability to hand over the connection
//!
//! - **Response Handling** ([`response`]): the response value itself
//!   - [`Response`]: status, headers, body, payload size and a recorded error
//!   - [`ResponseWriter`]: adapter for handler code written against a plain writer
//!
//! - **Body Handling** ([`body`]): in-memory buffers and foreign streams
//!   - [`body::Body`]: a body that can be written to, read back and closed
//!
//! - **Error Handling** ([`error`]): the error recorded on a response
//!   - [`ResponseError`]: a service error with code, message, tag and cause
//!
//! A response may have no underlying message at all, for example when it was
//! created from an error. Read accessors then return `None`; mutating ones
//! create a `200 OK` shell first.

mod message;
pub use message::CHUNK_THRESHOLD;
pub use message::PayloadSize;

mod request;
pub use request::Connection;
pub use request::Hijacker;
pub use request::RequestHeader;
pub use request::WrapDownstreamErrors;

mod response;
pub use response::Response;

mod writer;
pub use writer::ResponseWriter;

mod error;
pub use error::DOWNSTREAM_TAG;
pub use error::ErrorCode;
pub use error::INVALID_TYPE_TAG;
pub use error::ResponseError;

pub mod body;

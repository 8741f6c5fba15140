use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Classification carried by [`ResponseError::Service`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// Something went wrong inside this service.
    InternalService,
    /// The peer sent a response we could not read.
    BadResponse,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InternalService => "internal_service",
            ErrorCode::BadResponse => "bad_response",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag attached to errors rewrapped under [`WrapDownstreamErrors`](crate::protocol::WrapDownstreamErrors).
pub const DOWNSTREAM_TAG: &str = "downstream";

/// Tag attached when a decode target lacks the capability the body requires.
pub const INVALID_TYPE_TAG: &str = "invalid_type";

/// Every failure a [`Response`](crate::protocol::Response) can record or return.
///
/// The type is cheap to clone so that an error recorded on a response can be
/// handed back verbatim from later calls.
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    #[error("{code}{}: {message}", dotted(.tag))]
    Service {
        code: ErrorCode,
        message: String,
        tag: Option<&'static str>,
        #[source]
        cause: Option<Box<ResponseError>>,
    },

    #[error("json codec error: {source}")]
    Json {
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("protobuf decode error: {source}")]
    ProtobufDecode {
        #[from]
        source: prost::DecodeError,
    },

    #[error("protobuf encode error: {source}")]
    ProtobufEncode {
        #[from]
        source: prost::EncodeError,
    },

    #[error("io error: {source}")]
    Io {
        #[source]
        source: Arc<io::Error>,
    },
}

fn dotted(tag: &Option<&'static str>) -> String {
    tag.map(|t| format!(".{t}")).unwrap_or_default()
}

impl ResponseError {
    pub fn internal<S: ToString>(message: S) -> Self {
        Self::Service { code: ErrorCode::InternalService, message: message.to_string(), tag: None, cause: None }
    }

    pub fn no_body() -> Self {
        Self::internal("Response has no body")
    }

    pub fn invalid_type<S: ToString>(message: S) -> Self {
        Self::Service {
            code: ErrorCode::InternalService,
            message: message.to_string(),
            tag: Some(INVALID_TYPE_TAG),
            cause: None,
        }
    }

    pub fn downstream(cause: ResponseError) -> Self {
        Self::Service {
            code: ErrorCode::InternalService,
            message: "Downstream request error".to_string(),
            tag: Some(DOWNSTREAM_TAG),
            cause: Some(Box::new(cause)),
        }
    }

    /// A body that could not be read, classified as a bad response.
    pub fn bad_response<E: Into<io::Error>>(e: E) -> Self {
        let cause = Self::io(e);
        Self::Service { code: ErrorCode::BadResponse, message: cause.to_string(), tag: None, cause: Some(Box::new(cause)) }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: Arc::new(e.into()) }
    }

    /// Wraps a codec or io failure into an internal service error.
    ///
    /// Errors that are already service errors are returned unchanged.
    #[must_use]
    pub fn wrap(self) -> Self {
        match self {
            service @ Self::Service { .. } => service,
            other => Self::Service {
                code: ErrorCode::InternalService,
                message: other.to_string(),
                tag: None,
                cause: Some(Box::new(other)),
            },
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Service { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Service { tag, .. } => *tag,
            _ => None,
        }
    }

    /// The error this one wraps, if any.
    pub fn cause(&self) -> Option<&ResponseError> {
        match self {
            Self::Service { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ResponseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { source: Arc::new(e) }
    }
}

impl From<io::Error> for ResponseError {
    fn from(e: io::Error) -> Self {
        Self::io(e)
    }
}

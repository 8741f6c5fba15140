use http::{HeaderMap, header};
use tracing::debug;

/// Once a body has grown to this many bytes its length is treated as unknown
/// and the response goes out with chunked transfer encoding.
pub const CHUNK_THRESHOLD: u64 = 5 * 1_000_000;

/// Represents the size information of an HTTP payload.
///
/// - Known length: the exact number of bytes written so far
/// - Chunked: unknown length, sent using chunked transfer encoding
///
/// A payload may move from a known length to chunked, never the other way.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
}

impl PayloadSize {
    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns the known length, if any
    #[inline]
    pub fn length(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(n) => Some(*n),
            PayloadSize::Chunked => None,
        }
    }

    /// Signed form used on the wire by older peers: `-1` means unknown.
    pub fn as_i64(&self) -> i64 {
        match self {
            PayloadSize::Length(n) => i64::try_from(*n).unwrap_or(-1),
            PayloadSize::Chunked => -1,
        }
    }

    /// Accounts for `written` more bytes.
    ///
    /// Crossing [`CHUNK_THRESHOLD`] switches to [`PayloadSize::Chunked`] for good.
    #[must_use]
    pub fn advance(self, written: usize) -> Self {
        match self {
            PayloadSize::Length(n) => {
                let total = n.saturating_add(written as u64);
                if total >= CHUNK_THRESHOLD {
                    debug!(total, threshold = CHUNK_THRESHOLD, "payload crossed chunk threshold, switch to chunked");
                    PayloadSize::Chunked
                } else {
                    PayloadSize::Length(total)
                }
            }
            PayloadSize::Chunked => PayloadSize::Chunked,
        }
    }

    /// Derives the payload size a peer announced in its headers.
    ///
    /// A missing or malformed `Content-Length` means the length is unknown.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map_or(PayloadSize::Chunked, PayloadSize::Length)
    }
}

impl From<Option<u64>> for PayloadSize {
    fn from(length: Option<u64>) -> Self {
        length.map_or(PayloadSize::Chunked, PayloadSize::Length)
    }
}

impl Default for PayloadSize {
    fn default() -> Self {
        PayloadSize::Length(0)
    }
}

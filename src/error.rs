/*!
 * Error Taxonomy
 *
 * Two typed error enums at the crate's two boundaries: `RespError` for
 * anything the codec can reject, and `TransportError` for anything the
 * pipelined transport can fail with (which wraps `RespError` plus the
 * transport's own lifecycle failures).
 */

use thiserror::Error;

/// Everything that can go wrong decoding or encoding a single RESP frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RespError {
    /// A `delimited` scan ran `max_len` bytes without finding its pattern.
    #[error("message exceeds maximum line length")]
    MessageTooLong,
    /// An integer or length field failed to parse as base-10, optionally signed.
    #[error("invalid number in RESP header")]
    BadNumber,
    /// The first byte of a frame did not match any of `+-:$*`.
    #[error("unrecognized RESP type byte {0:#04x}")]
    BadTypeByte(u8),
    /// A bulk string's declared length did not line up with a trailing CRLF.
    #[error("bulk string missing CRLF terminator")]
    BadBulkTerminator,
    /// The encoder was asked to encode something outside the six RESP v1 variants.
    ///
    /// The `Value` enum is closed so this is unreachable through safe code today;
    /// it exists to keep the encoder's `Result` total per spec, and as the named
    /// extension point future variants would fail through.
    #[error("value has no RESP encoding")]
    UnknownVariant,
}

/// Everything observable at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Decode(#[from] RespError),

    #[error("not connected")]
    NotConnected,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A value arrived on the wire with no pending request to match it to.
    #[error("response arrived with no matching pending request")]
    UnexpectedResponse,

    /// Surfaced only by the command-surface layer (`commands.rs`), never by
    /// the transport core, which treats `Value::Error` as an ordinary value.
    #[error("redis server error: {0}")]
    RedisServerError(String),

    /// Surfaced only by the command-surface layer: the response had a shape
    /// the coercion didn't expect.
    #[error("unexpected response shape")]
    RedisInvalidResponse,
}

impl Clone for TransportError {
    fn clone(&self) -> Self {
        match self {
            TransportError::Decode(e) => TransportError::Decode(e.clone()),
            TransportError::NotConnected => TransportError::NotConnected,
            TransportError::Io(e) => {
                TransportError::Io(std::io::Error::new(e.kind(), e.to_string()))
            }
            TransportError::UnexpectedResponse => TransportError::UnexpectedResponse,
            TransportError::RedisServerError(s) => TransportError::RedisServerError(s.clone()),
            TransportError::RedisInvalidResponse => TransportError::RedisInvalidResponse,
        }
    }
}

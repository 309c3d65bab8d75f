/*!
 * RESP Value Model
 *
 * Tagged-union representation of every value the wire grammar can carry.
 * Equality is structural and byte-exact on bulk payloads; `NullBulk` and
 * `NullArray` are distinct from their zero-length counterparts.
 */

use bytes::Bytes;

/// A single RESP v1 value.
///
/// `Simple`/`Error` carry the raw line bytes as received — no charset
/// transformation happens at decode time, so a non-UTF-8 line still
/// decodes successfully. Use [`Value::as_str`] to get a `&str` view at
/// the point of use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `+<line>\r\n`
    Simple(Bytes),
    /// `-<line>\r\n`
    Error(Bytes),
    /// `:<n>\r\n`
    Integer(i64),
    /// `$<len>\r\n<bytes>\r\n`
    BulkString(Bytes),
    /// `$-1\r\n` — distinct from `BulkString(empty)`
    NullBulk,
    /// `*<len>\r\n<elem>...` — elements may be any variant, including nested arrays
    Array(Vec<Value>),
    /// `*-1\r\n` — distinct from `Array(vec![])`
    NullArray,
}

impl Value {
    /// Lossless UTF-8 view of a `Simple`/`Error`/`BulkString` line, or `None`
    /// for non-text variants or invalid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Simple(b) | Value::Error(b) | Value::BulkString(b) => {
                std::str::from_utf8(b).ok()
            }
            _ => None,
        }
    }

    /// Convenience constructor for a bulk string from anything byte-like.
    pub fn bulk(bytes: impl Into<Bytes>) -> Value {
        Value::BulkString(bytes.into())
    }

    /// Convenience constructor for a simple string.
    pub fn simple(s: impl Into<Bytes>) -> Value {
        Value::Simple(s.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

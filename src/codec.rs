/*!
 * RESP Codec
 *
 * The streaming decoder composes the combinators in [`crate::combinators`]
 * into the grammar from spec §4.2.1; the encoder is the symmetric,
 * allocation-frugal emitter that turns a [`Value`] into an ordered list of
 * byte segments, plus an atomic all-or-nothing buffer write used by the
 * transport to keep frames from being torn across a partial socket write.
 */

use crate::combinators::{bind, delimited, fail, fixed, just, Cursor, Parser, Step};
use crate::error::RespError;
use crate::value::Value;
use bytes::{BufMut, Bytes};

const CRLF: &[u8] = b"\r\n";
const MAX_LINE_LEN: usize = 4096;

type ValueParser = Box<dyn Parser<Output = Value> + Send>;

fn boxed<P>(p: P) -> ValueParser
where
    P: Parser<Output = Value> + Send + 'static,
{
    Box::new(p)
}

fn parse_i64(bytes: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(RespError::BadNumber)
}

/// Length header for `$`/`*` frames: base-10, optionally signed, and must
/// fit in 32 bits (a bulk/array length wider than that is malformed per
/// the wire grammar, not a giant-but-legal payload).
fn parse_i32(bytes: &[u8]) -> Result<i32, RespError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or(RespError::BadNumber)
}

fn dispatch(line: Bytes) -> ValueParser {
    if line.is_empty() {
        return boxed(fail_parser(RespError::BadTypeByte(0)));
    }
    let tag = line[0];
    let rest = line.slice(1..);
    match tag {
        b'+' => boxed(just(Value::Simple(rest))),
        b'-' => boxed(just(Value::Error(rest))),
        b':' => match parse_i64(&rest) {
            Ok(n) => boxed(just(Value::Integer(n))),
            Err(e) => boxed(fail_parser(e)),
        },
        b'$' => match parse_i32(&rest) {
            Ok(n) if n < 0 => boxed(just(Value::NullBulk)),
            Ok(n) => {
                let n = n as usize;
                boxed(bind(fixed(n + 2), move |body: Bytes| -> ValueParser {
                    if &body[n..n + 2] != CRLF {
                        boxed(fail_parser(RespError::BadBulkTerminator))
                    } else {
                        boxed(just(Value::BulkString(body.slice(0..n))))
                    }
                }))
            }
            Err(e) => boxed(fail_parser(e)),
        },
        b'*' => match parse_i32(&rest) {
            Ok(n) if n < 0 => boxed(just(Value::NullArray)),
            Ok(n) => boxed(ArrayParser::new(n as usize)),
            Err(e) => boxed(fail_parser(e)),
        },
        other => boxed(fail_parser(RespError::BadTypeByte(other))),
    }
}

fn fail_parser(err: RespError) -> impl Parser<Output = Value> {
    fail::<Value>(err)
}

/// Sequences `n` recursive sub-frames, filling an `Array` by index. The
/// in-progress child parser is kept across calls so a deeply incomplete
/// element doesn't lose the siblings already decoded.
struct ArrayParser {
    target_len: usize,
    items: Vec<Value>,
    current: Option<ValueParser>,
}

impl ArrayParser {
    fn new(n: usize) -> Self {
        ArrayParser {
            target_len: n,
            items: Vec::with_capacity(n),
            current: None,
        }
    }
}

impl Parser for ArrayParser {
    type Output = Value;

    fn step(&mut self, cursor: &mut Cursor) -> Result<Step<Value>, RespError> {
        while self.items.len() < self.target_len {
            let parser = self.current.get_or_insert_with(frame);
            match parser.step(cursor)? {
                Step::Incomplete => return Ok(Step::Incomplete),
                Step::Done(v) => {
                    self.items.push(v);
                    self.current = None;
                }
            }
        }
        Ok(Step::Done(Value::Array(std::mem::take(&mut self.items))))
    }

    fn reset(&mut self) {
        self.items.clear();
        self.current = None;
    }
}

/// `frame = delimited(CRLF, 4096) bind dispatch`
fn frame() -> ValueParser {
    boxed(bind(delimited(CRLF, MAX_LINE_LEN), dispatch))
}

/// Streaming, restartable RESP decoder. One instance decodes an unbounded
/// number of frames; it self-resets after each completed value.
pub struct Decoder {
    current: ValueParser,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder { current: frame() }
    }

    /// Drive the decoder over `cursor`. Returns `Some(value)` once a full
    /// frame decodes, `None` on incomplete input (cursor left wherever the
    /// underlying primitives left it). The decoder resets itself after a
    /// successful decode so the same `Cursor` can keep driving the next
    /// frame without an intervening call to [`Decoder::reset`].
    pub fn step(&mut self, cursor: &mut Cursor) -> Result<Option<Value>, RespError> {
        match self.current.step(cursor)? {
            Step::Done(v) => {
                self.current = frame();
                Ok(Some(v))
            }
            Step::Incomplete => Ok(None),
        }
    }

    /// Discard any in-progress frame, e.g. after a decode error when the
    /// caller has decided to keep the decoder around anyway.
    pub fn reset(&mut self) {
        self.current = frame();
    }
}

/// Decode exactly one value from a complete, self-contained buffer. Used
/// by tests and by callers who already know they have a whole frame.
pub fn decode(buf: &[u8]) -> Result<Option<Value>, RespError> {
    let mut decoder = Decoder::new();
    let mut cursor = Cursor::new(buf);
    decoder.step(&mut cursor)
}

/// One piece of an encoded frame: either a literal known at compile time
/// or an owned run of bytes (a decimal length, a payload slice, ...).
#[derive(Debug, Clone)]
pub enum Segment {
    Static(&'static [u8]),
    Owned(Bytes),
}

impl Segment {
    fn len(&self) -> usize {
        match self {
            Segment::Static(b) => b.len(),
            Segment::Owned(b) => b.len(),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Segment::Static(b) => b,
            Segment::Owned(b) => b,
        }
    }
}

/// Encode `value` into an ordered scatter list of segments.
pub fn encode(value: &Value) -> Result<Vec<Segment>, RespError> {
    let mut segments = Vec::new();
    encode_into_segments(value, &mut segments)?;
    Ok(segments)
}

fn encode_into_segments(value: &Value, out: &mut Vec<Segment>) -> Result<(), RespError> {
    match value {
        Value::Simple(s) => {
            out.push(Segment::Static(b"+"));
            out.push(Segment::Owned(s.clone()));
            out.push(Segment::Static(CRLF));
        }
        Value::Error(s) => {
            out.push(Segment::Static(b"-"));
            out.push(Segment::Owned(s.clone()));
            out.push(Segment::Static(CRLF));
        }
        Value::Integer(n) => {
            out.push(Segment::Static(b":"));
            out.push(Segment::Owned(Bytes::from(n.to_string())));
            out.push(Segment::Static(CRLF));
        }
        Value::BulkString(b) => {
            out.push(Segment::Static(b"$"));
            out.push(Segment::Owned(Bytes::from(b.len().to_string())));
            out.push(Segment::Static(CRLF));
            out.push(Segment::Owned(b.clone()));
            out.push(Segment::Static(CRLF));
        }
        Value::NullBulk => out.push(Segment::Static(b"$-1\r\n")),
        Value::NullArray => out.push(Segment::Static(b"*-1\r\n")),
        Value::Array(items) => {
            out.push(Segment::Static(b"*"));
            out.push(Segment::Owned(Bytes::from(items.len().to_string())));
            out.push(Segment::Static(CRLF));
            for item in items {
                encode_into_segments(item, out)?;
            }
        }
    }
    Ok(())
}

/// Total encoded length of `value`, without allocating the segment list.
pub fn encoded_len(value: &Value) -> usize {
    match value {
        Value::Simple(s) | Value::Error(s) => 1 + s.len() + 2,
        Value::Integer(n) => 1 + decimal_len(*n) + 2,
        Value::BulkString(b) => 1 + decimal_len(b.len() as i64) + 2 + b.len() + 2,
        Value::NullBulk => 5,
        Value::NullArray => 5,
        Value::Array(items) => {
            1 + decimal_len(items.len() as i64)
                + 2
                + items.iter().map(encoded_len).sum::<usize>()
        }
    }
}

fn decimal_len(n: i64) -> usize {
    n.to_string().len()
}

/// Write the full encoding of `value` into `dst` iff it fits within
/// `buf_capacity`, the transport's configured fixed buffer size. Writes
/// nothing and returns `0` otherwise — all or nothing, so a partial frame
/// never lands on the wire.
///
/// Fit is checked against `buf_capacity`, not `dst.capacity()`: every
/// `advance()` after a socket write erodes `BytesMut`'s own capacity
/// permanently, so that alone would eventually read as exhausted even
/// with an empty buffer. The `reserve` call is what makes `bytes` reclaim
/// that eroded space by shifting the unread tail back to the front of
/// the allocation, rather than just growing.
pub fn encode_atomic(
    value: &Value,
    dst: &mut bytes::BytesMut,
    buf_capacity: usize,
) -> Result<usize, RespError> {
    let segments = encode(value)?;
    let total: usize = segments.iter().map(Segment::len).sum();
    if dst.len() + total > buf_capacity {
        return Ok(0);
    }
    dst.reserve(total);
    for seg in &segments {
        dst.put_slice(seg.as_bytes());
    }
    Ok(total)
}

/*!
 * Command Surface
 *
 * A thin, illustrative layer over [`crate::transport::Transport`] that
 * builds the RESP arrays for a handful of commands and coerces their
 * replies back into plain Rust types. Inverted from a typical command
 * dispatch table: instead of matching a parsed command to produce a
 * response, each function here builds the request array and matches
 * the eventual response.
 *
 * Deliberately narrow — PING, GET, SET, DEL only. The transport core
 * carries arbitrary `Value`s; widening the command surface to the rest
 * of the Redis command set is just more of this same shape.
 */

use crate::error::TransportError;
use crate::transport::Transport;
use crate::value::Value;
use bytes::Bytes;

fn bulk(s: impl Into<Bytes>) -> Value {
    Value::BulkString(s.into())
}

fn request_array(parts: Vec<Value>) -> Value {
    Value::Array(parts)
}

/// `Value::Error` responses are promoted to `TransportError::RedisServerError`
/// here; the transport itself never inspects reply contents.
fn reject_error(v: Value) -> Result<Value, TransportError> {
    match v {
        Value::Error(msg) => Err(TransportError::RedisServerError(
            String::from_utf8_lossy(&msg).into_owned(),
        )),
        other => Ok(other),
    }
}

/// `PING` — round-trips `+PONG\r\n`.
pub fn ping(t: &Transport) -> Result<(), TransportError> {
    let v = reject_error(t.submit(request_array(vec![bulk("PING")])).wait()?)?;
    match v {
        Value::Simple(s) if &s[..] == b"PONG" => Ok(()),
        _ => Err(TransportError::RedisInvalidResponse),
    }
}

/// `GET key` — `None` on a null bulk reply (key absent).
pub fn get(t: &Transport, key: impl Into<Bytes>) -> Result<Option<Bytes>, TransportError> {
    let v = reject_error(
        t.submit(request_array(vec![bulk("GET"), bulk(key.into())]))
            .wait()?,
    )?;
    match v {
        Value::BulkString(b) => Ok(Some(b)),
        Value::NullBulk => Ok(None),
        _ => Err(TransportError::RedisInvalidResponse),
    }
}

/// `SET key value` — succeeds on a `+OK` simple string reply.
pub fn set(t: &Transport, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<(), TransportError> {
    let v = reject_error(
        t.submit(request_array(vec![bulk("SET"), bulk(key.into()), bulk(value.into())]))
            .wait()?,
    )?;
    match v {
        Value::Simple(s) if &s[..] == b"OK" => Ok(()),
        _ => Err(TransportError::RedisInvalidResponse),
    }
}

/// `DEL key` — the number of keys actually removed (0 or 1 for this form).
pub fn del(t: &Transport, key: impl Into<Bytes>) -> Result<i64, TransportError> {
    let v = reject_error(
        t.submit(request_array(vec![bulk("DEL"), bulk(key.into())]))
            .wait()?,
    )?;
    match v {
        Value::Integer(n) => Ok(n),
        _ => Err(TransportError::RedisInvalidResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_error_passes_through_non_error_values() {
        let v = Value::Integer(7);
        assert_eq!(reject_error(v.clone()).unwrap(), v);
    }

    #[test]
    fn reject_error_surfaces_redis_error_text() {
        let v = Value::Error(Bytes::from_static(b"ERR no such key"));
        match reject_error(v) {
            Err(TransportError::RedisServerError(msg)) => assert_eq!(msg, "ERR no such key"),
            other => panic!("expected RedisServerError, got {other:?}"),
        }
    }

    #[test]
    fn request_array_shapes_match_wire_command_names() {
        assert_eq!(
            request_array(vec![bulk("PING")]),
            Value::Array(vec![Value::BulkString(Bytes::from_static(b"PING"))])
        );
        assert_eq!(
            request_array(vec![bulk("GET"), bulk("k")]),
            Value::Array(vec![
                Value::BulkString(Bytes::from_static(b"GET")),
                Value::BulkString(Bytes::from_static(b"k")),
            ])
        );
    }
}

/*!
 * Parser Combinators
 *
 * Small composable parsers over a shared byte cursor. Each parser either
 * consumes bytes and produces a value, reports "need more input" (cursor
 * left exactly where it was on entry), or fails. `Bind` is the one
 * combinator that carries state across calls — it memoizes the parser
 * produced by its continuation so a prior partial match is never redone.
 *
 * Modeled as a tagged family of structs behind one trait rather than a
 * class hierarchy.
 */

use crate::error::RespError;
use bytes::Bytes;
use std::marker::PhantomData;

/// A window into the bytes decoded so far. `position()` only ever moves
/// forward within one `step` call; a parser that returns `Incomplete`
/// must leave the cursor exactly where it found it.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }
}

/// Outcome of one `step` call.
pub enum Step<T> {
    Done(T),
    Incomplete,
}

/// A parser over a byte cursor. `reset` discards any progress so the
/// parser can be driven again for a fresh frame.
pub trait Parser {
    type Output;
    fn step(&mut self, cursor: &mut Cursor) -> Result<Step<Self::Output>, RespError>;
    fn reset(&mut self);
}

impl<T> Parser for Box<dyn Parser<Output = T> + Send> {
    type Output = T;

    fn step(&mut self, cursor: &mut Cursor) -> Result<Step<T>, RespError> {
        (**self).step(cursor)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Scan forward for `pattern`, yielding the bytes before it and consuming
/// through it. Fails with `MessageTooLong` once `max_len` bytes have
/// accumulated without a match. A naive rescan from every byte offset —
/// not just the byte after a mismatch — so a pattern like CRLF is never
/// mis-matched against a repeated prefix (`\r\r\n`).
pub struct Delimited {
    pattern: &'static [u8],
    max_len: usize,
}

impl Delimited {
    pub fn new(pattern: &'static [u8], max_len: usize) -> Self {
        Delimited { pattern, max_len }
    }
}

impl Parser for Delimited {
    type Output = Bytes;

    fn step(&mut self, cursor: &mut Cursor) -> Result<Step<Bytes>, RespError> {
        let hay = cursor.remaining();
        match find_pattern(hay, self.pattern) {
            Some(idx) => {
                let line = Bytes::copy_from_slice(&hay[..idx]);
                cursor.advance(idx + self.pattern.len());
                Ok(Step::Done(line))
            }
            None => {
                if hay.len() >= self.max_len {
                    Err(RespError::MessageTooLong)
                } else {
                    Ok(Step::Incomplete)
                }
            }
        }
    }

    fn reset(&mut self) {}
}

fn find_pattern(hay: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || hay.len() < pattern.len() {
        return None;
    }
    hay.windows(pattern.len()).position(|w| w == pattern)
}

/// Yield the next `n` bytes once available, otherwise "incomplete".
pub struct Fixed {
    n: usize,
}

impl Fixed {
    pub fn new(n: usize) -> Self {
        Fixed { n }
    }
}

impl Parser for Fixed {
    type Output = Bytes;

    fn step(&mut self, cursor: &mut Cursor) -> Result<Step<Bytes>, RespError> {
        let hay = cursor.remaining();
        if hay.len() < self.n {
            return Ok(Step::Incomplete);
        }
        let out = Bytes::copy_from_slice(&hay[..self.n]);
        cursor.advance(self.n);
        Ok(Step::Done(out))
    }

    fn reset(&mut self) {}
}

/// Yield a fixed value without consuming input.
pub struct Just<T>(T);

impl<T> Just<T> {
    pub fn new(v: T) -> Self {
        Just(v)
    }
}

impl<T: Clone> Parser for Just<T> {
    type Output = T;

    fn step(&mut self, _cursor: &mut Cursor) -> Result<Step<T>, RespError> {
        Ok(Step::Done(self.0.clone()))
    }

    fn reset(&mut self) {}
}

/// Always fail with the given error.
pub struct Fail<T> {
    err: RespError,
    _marker: PhantomData<T>,
}

impl<T> Fail<T> {
    pub fn new(err: RespError) -> Self {
        Fail {
            err,
            _marker: PhantomData,
        }
    }
}

impl<T> Parser for Fail<T> {
    type Output = T;

    fn step(&mut self, _cursor: &mut Cursor) -> Result<Step<T>, RespError> {
        Err(self.err.clone())
    }

    fn reset(&mut self) {}
}

/// Run `p`; on success, run `f(v)` to obtain a second parser and drive
/// that for the rest of the frame. `q` is memoized so an incomplete `q`
/// never re-runs `p`.
pub struct Bind<P, F, Q> {
    p: P,
    f: F,
    q: Option<Q>,
}

impl<P, F, Q> Bind<P, F, Q>
where
    P: Parser,
    F: FnMut(P::Output) -> Q,
    Q: Parser,
{
    pub fn new(p: P, f: F) -> Self {
        Bind { p, f, q: None }
    }
}

impl<P, F, Q> Parser for Bind<P, F, Q>
where
    P: Parser,
    F: FnMut(P::Output) -> Q,
    Q: Parser,
{
    type Output = Q::Output;

    fn step(&mut self, cursor: &mut Cursor) -> Result<Step<Q::Output>, RespError> {
        if self.q.is_none() {
            match self.p.step(cursor)? {
                Step::Incomplete => return Ok(Step::Incomplete),
                Step::Done(v) => self.q = Some((self.f)(v)),
            }
        }
        self.q.as_mut().expect("q populated above").step(cursor)
    }

    fn reset(&mut self) {
        self.p.reset();
        self.q = None;
    }
}

/// `map(p, f) = bind(p, v => just(f(v)))`.
pub fn map<P, F, U>(p: P, mut f: F) -> Bind<P, impl FnMut(P::Output) -> Just<U>, Just<U>>
where
    P: Parser,
    F: FnMut(P::Output) -> U,
    U: Clone,
{
    Bind::new(p, move |v| Just::new(f(v)))
}

pub fn delimited(pattern: &'static [u8], max_len: usize) -> Delimited {
    Delimited::new(pattern, max_len)
}

pub fn fixed(n: usize) -> Fixed {
    Fixed::new(n)
}

pub fn just<T: Clone>(v: T) -> Just<T> {
    Just::new(v)
}

pub fn fail<T>(err: RespError) -> Fail<T> {
    Fail::new(err)
}

pub fn bind<P, F, Q>(p: P, f: F) -> Bind<P, F, Q>
where
    P: Parser,
    F: FnMut(P::Output) -> Q,
    Q: Parser,
{
    Bind::new(p, f)
}

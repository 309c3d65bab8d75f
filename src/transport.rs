/*!
 * Pipelined Transport
 *
 * The request/response multiplexer: owns the socket, batches outgoing
 * frames, reads responses, and matches them to per-request completion
 * handles in strict FIFO order. One background thread drives a single
 * `mio` reactor over the one socket this transport owns — since there is
 * exactly one connection, a single thread already gives the "at most one
 * writer, at most one reader active" invariant for free.
 */

use crate::codec::{encode_atomic, Decoder};
use crate::combinators::Cursor;
use crate::config::ClientConfig;
use crate::error::{RespError, TransportError};
use crate::value::Value;

use bytes::{Buf, BytesMut};
use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, trace, warn};
use mio::net::TcpStream as MioTcpStream;
use mio::{Events, Interest, Poll, Token, Waker};
use parking_lot::Mutex;
use socket2::{Domain, Socket, Type};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

const STREAM_TOKEN: Token = Token(0);
const WAKER_TOKEN: Token = Token(1);
const READ_CHUNK: usize = 64 * 1024;

type Responder = Sender<Result<Value, TransportError>>;

/// Single-assignment handle for one request's response. Backed by a
/// capacity-1 channel: `complete` (internal) sends at most once,
/// `wait` blocks for it.
pub struct Completion {
    rx: Receiver<Result<Value, TransportError>>,
}

impl Completion {
    /// Block until the response for this request completes — with a
    /// value, a protocol error surfaced as an ordinary `Value::Error`,
    /// or a transport failure.
    pub fn wait(self) -> Result<Value, TransportError> {
        self.rx
            .recv()
            .unwrap_or(Err(TransportError::NotConnected))
    }

    /// Non-blocking poll for callers who want to interleave waiting
    /// with other work instead of parking a thread on `wait`.
    pub fn try_wait(&self) -> Option<Result<Value, TransportError>> {
        self.rx.try_recv().ok()
    }
}

struct State {
    connected: bool,
    writing: bool,
    reading: bool,
    request_queue: VecDeque<Value>,
    response_queue: VecDeque<Responder>,
}

impl State {
    fn new() -> Self {
        State {
            connected: false,
            writing: false,
            reading: false,
            request_queue: VecDeque::new(),
            response_queue: VecDeque::new(),
        }
    }
}

struct Inner {
    state: Mutex<State>,
    waker: OnceLock<Arc<Waker>>,
}

impl Inner {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Drain both queues to exceptional completion and flip to the
    /// terminal disconnected state. Idempotent: returns `false` (and
    /// does nothing) if the transport was already disconnected, so
    /// every handle still completes exactly once regardless of how
    /// many call sites race to report the same failure.
    fn transition_to_closed(&self, cause: TransportError) -> bool {
        let mut st = self.state.lock();
        if !st.connected {
            return false;
        }
        st.connected = false;
        st.writing = false;
        st.reading = false;
        for tx in st.response_queue.drain(..) {
            let _ = tx.send(Err(cause.clone()));
        }
        st.request_queue.clear();
        true
    }

    fn wake(&self) {
        if let Some(w) = self.waker.get() {
            let _ = w.wake();
        }
    }
}

/// A pipelined RESP client connection. Cheap to clone — clones share the
/// same socket, queues and background reactor thread.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

impl Transport {
    /// Open the TCP connection and start the background reactor. Blocks
    /// for the duration of the connect — there is no async handle to hand
    /// back mid-connect in this thread-based design, so the `Connecting`
    /// state is just the span of this call.
    pub fn connect(config: ClientConfig) -> Result<Transport, TransportError> {
        let std_stream = connect_socket(config.addr, &config)?;
        let mut mio_stream = MioTcpStream::from_std(std_stream);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut mio_stream, STREAM_TOKEN, Interest::READABLE | Interest::WRITABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER_TOKEN)?);

        let inner = Arc::new(Inner {
            state: Mutex::new(State::new()),
            waker: OnceLock::new(),
        });
        inner.waker.set(waker).ok();
        inner.state.lock().connected = true;

        let reactor_inner = Arc::clone(&inner);
        let read_buf_size = config.read_buf_size;
        let write_buf_size = config.write_buf_size;
        std::thread::Builder::new()
            .name("respipe-reactor".into())
            .spawn(move || {
                reactor_loop(reactor_inner, mio_stream, poll, read_buf_size, write_buf_size);
            })
            .map_err(TransportError::Io)?;

        Ok(Transport { inner })
    }

    /// Enqueue `value` and return a handle for its response. If the
    /// transport is not connected, the handle completes synchronously
    /// with `NotConnected`.
    pub fn submit(&self, value: Value) -> Completion {
        let (tx, rx) = bounded(1);
        let mut st = self.inner.state.lock();
        if !st.connected {
            let _ = tx.send(Err(TransportError::NotConnected));
            return Completion { rx };
        }
        // Response queue grows before request queue so R >= S + Q_pending
        // holds at every instant.
        st.response_queue.push_back(tx);
        st.request_queue.push_back(value);
        let should_wake = !st.writing;
        st.writing = true;
        drop(st);
        if should_wake {
            self.inner.wake();
        }
        Completion { rx }
    }

    /// Close the socket; every outstanding handle completes with
    /// `NotConnected`. Idempotent.
    pub fn disconnect(&self) {
        if self.inner.transition_to_closed(TransportError::NotConnected) {
            self.inner.wake();
        }
    }

    /// Current depth of the response queue (handles awaiting a value).
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().response_queue.len()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}

fn connect_socket(addr: SocketAddr, config: &ClientConfig) -> io::Result<std::net::TcpStream> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_nodelay(true)?;
    let _ = socket.set_recv_buffer_size(config.read_buf_size);
    let _ = socket.set_send_buffer_size(config.write_buf_size);
    socket.connect_timeout(&addr.into(), config.connect_timeout)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

fn would_block(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

/// Drains the request queue into `write_buf` via atomic encodes, then
/// flushes `write_buf` to the socket with non-blocking writes. Returns
/// `Err` on a fatal condition the caller must escalate through
/// `transition_to_closed`; `Ok(())` covers both "fully drained" and
/// "blocked, try again once writable".
fn try_write(
    inner: &Inner,
    stream: &mut MioTcpStream,
    write_buf: &mut BytesMut,
    write_buf_size: usize,
) -> Result<(), TransportError> {
    loop {
        {
            let mut st = inner.state.lock();
            loop {
                let Some(front) = st.request_queue.front() else {
                    break;
                };
                match encode_atomic(front, write_buf, write_buf_size) {
                    Ok(0) => break, // wouldn't fit this round; wait for the socket to drain
                    Ok(_) => {
                        st.request_queue.pop_front();
                    }
                    Err(e) => return Err(TransportError::Decode(e)),
                }
            }
            if st.request_queue.is_empty() && write_buf.is_empty() {
                st.writing = false;
            }
        }

        if write_buf.is_empty() {
            return Ok(());
        }

        match stream.write(write_buf) {
            Ok(0) => return Err(TransportError::NotConnected),
            Ok(n) => {
                write_buf.advance(n);
                if write_buf.is_empty() {
                    // loop back: more requests may have arrived while we wrote
                    continue;
                }
                return Ok(()); // partial write; wait for WRITABLE again
            }
            Err(ref e) if would_block(e) => return Ok(()),
            Err(e) => return Err(TransportError::Io(e)),
        }
    }
}

/// Reads available bytes and matches every decoded frame against the
/// front of the response queue, FIFO.
fn try_read(
    inner: &Inner,
    stream: &mut MioTcpStream,
    read_buf: &mut BytesMut,
    decoder: &mut Decoder,
) -> Result<(), TransportError> {
    loop {
        if inner.state.lock().response_queue.is_empty() {
            return Ok(()); // nothing outstanding; writer will restart us
        }

        let mut tmp = [0u8; READ_CHUNK];
        match stream.read(&mut tmp) {
            Ok(0) => return Err(TransportError::NotConnected),
            Ok(n) => read_buf.extend_from_slice(&tmp[..n]),
            Err(ref e) if would_block(e) => return Ok(()),
            Err(e) => return Err(TransportError::Io(e)),
        }

        loop {
            let mut cursor = Cursor::new(&read_buf[..]);
            let outcome = decoder.step(&mut cursor).map_err(TransportError::Decode);
            let consumed = cursor.position();
            match outcome {
                Ok(Some(value)) => {
                    read_buf.advance(consumed);
                    let responder = {
                        let mut st = inner.state.lock();
                        st.response_queue.pop_front()
                    };
                    match responder {
                        Some(tx) => {
                            let _ = tx.send(Ok(value));
                        }
                        None => return Err(TransportError::UnexpectedResponse),
                    }
                }
                Ok(None) => {
                    read_buf.advance(consumed);
                    break;
                }
                Err(e) => {
                    read_buf.advance(consumed);
                    return Err(e);
                }
            }
        }
    }
}

fn reactor_loop(
    inner: Arc<Inner>,
    mut stream: MioTcpStream,
    mut poll: Poll,
    read_buf_size: usize,
    write_buf_size: usize,
) {
    let mut read_buf = BytesMut::with_capacity(read_buf_size);
    let mut write_buf = BytesMut::with_capacity(write_buf_size);
    let mut decoder = Decoder::new();
    let mut events = Events::with_capacity(128);

    'reactor: loop {
        if let Err(e) = poll.poll(&mut events, None) {
            if would_block(&e) {
                continue;
            }
            inner.transition_to_closed(TransportError::Io(e));
            break;
        }

        if !inner.is_connected() {
            break;
        }

        for event in events.iter() {
            trace!("reactor event: token={:?} readable={} writable={}", event.token(), event.is_readable(), event.is_writable());
        }

        if let Err(e) = try_write(&inner, &mut stream, &mut write_buf, write_buf_size) {
            warn!("respipe transport write failed: {e}");
            inner.transition_to_closed(e);
            break 'reactor;
        }

        if inner.state.lock().reading || !inner.state.lock().response_queue.is_empty() {
            inner.state.lock().reading = true;
            if let Err(e) = try_read(&inner, &mut stream, &mut read_buf, &mut decoder) {
                warn!("respipe transport read failed: {e}");
                inner.transition_to_closed(e);
                break 'reactor;
            }
            inner.state.lock().reading = false;
        }

        if !inner.is_connected() {
            break;
        }
    }

    debug!("respipe reactor thread exiting");
}

use bytes::{Buf, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use respipe::codec::Decoder;
use respipe::combinators::Cursor;
use respipe::value::Value;
use respipe::{ClientConfig, Transport};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;

fn spawn_pong_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        let mut buf = BytesMut::with_capacity(1024 * 1024);
        let mut tmp = [0u8; 65536];
        let mut decoder = Decoder::new();
        loop {
            let n = match sock.read(&mut tmp) {
                Ok(0) => return,
                Ok(n) => n,
                Err(_) => return,
            };
            buf.extend_from_slice(&tmp[..n]);
            loop {
                let mut cursor = Cursor::new(&buf[..]);
                match decoder.step(&mut cursor) {
                    Ok(Some(_)) => {
                        let consumed = cursor.position();
                        buf.advance(consumed);
                        if sock.write_all(b"+PONG\r\n").is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(_) => return,
                }
            }
        }
    });
    addr
}

fn ping_array() -> Value {
    Value::Array(vec![Value::BulkString(bytes::Bytes::from_static(b"PING"))])
}

fn bench_pipeline_throughput(c: &mut Criterion) {
    let addr = spawn_pong_server();
    let transport = Transport::connect(ClientConfig::new(addr)).unwrap();

    let mut group = c.benchmark_group("transport");
    group.bench_function("pipeline_1k_pings", |b| {
        b.iter_batched(
            || (),
            |_| {
                let completions: Vec<_> = (0..1000).map(|_| transport.submit(ping_array())).collect();
                for c in completions {
                    black_box(c.wait().unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();

    transport.disconnect();
}

criterion_group!(benches, bench_pipeline_throughput);
criterion_main!(benches);

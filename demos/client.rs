// SET/GET against a live Redis-speaking server via the pipelined Transport.
use respipe::{commands, ClientConfig, Transport};

fn main() {
    let addr = "127.0.0.1:6379".parse().expect("valid socket address");
    let t = Transport::connect(ClientConfig::new(addr)).expect("connect");

    commands::set(&t, "hello", "world").expect("SET hello world");
    match commands::get(&t, "hello").expect("GET hello") {
        Some(v) => println!("{}", String::from_utf8_lossy(&v)),
        None => println!("(nil)"),
    }

    t.disconnect();
}

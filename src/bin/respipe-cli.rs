/*!
 * respipe-cli
 *
 * A minimal interactive client: connect to a host:port, read a line at a
 * time from stdin, tokenize it shell-style into a RESP array of bulk
 * strings, submit it, and print the decoded response. A demonstration
 * harness for the transport, not a REPL with history or editing.
 */

use anyhow::*;
use bytes::Bytes;
use respipe::{ClientConfig, Transport, Value};
use std::io::{self, BufRead, Write};
use std::net::ToSocketAddrs;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Shell-style tokenizer: whitespace-separated words, single or double
/// quotes group a word (no escapes, no nesting — enough to type a value
/// containing spaces without reaching for a full shell-word parser).
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut word = String::new();
        if c == '"' || c == '\'' {
            let quote = c;
            chars.next();
            for c in chars.by_ref() {
                if c == quote {
                    break;
                }
                word.push(c);
            }
        } else {
            for c in chars.by_ref() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
            }
        }
        tokens.push(word);
    }
    tokens
}

fn print_value(v: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match v {
        Value::Simple(s) => println!("{indent}{}", String::from_utf8_lossy(s)),
        Value::Error(s) => println!("{indent}(error) {}", String::from_utf8_lossy(s)),
        Value::Integer(n) => println!("{indent}(integer) {n}"),
        Value::BulkString(b) => println!("{indent}\"{}\"", String::from_utf8_lossy(b)),
        Value::NullBulk | Value::NullArray => println!("{indent}(nil)"),
        Value::Array(items) => {
            if items.is_empty() {
                println!("{indent}(empty array)");
            }
            for (i, item) in items.iter().enumerate() {
                println!("{indent}{}) ", i + 1);
                print_value(item, depth + 1);
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let target = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:6379".to_string());
    let addr = target
        .to_socket_addrs()?
        .next()
        .context("could not resolve target address")?;

    let transport = Transport::connect(ClientConfig::new(addr))?;
    eprintln!("connected to {addr}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{addr}> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let words = tokenize(&line);
        if words.is_empty() {
            continue;
        }

        let request = Value::Array(
            words
                .into_iter()
                .map(|w| Value::BulkString(Bytes::from(w.into_bytes())))
                .collect(),
        );
        match transport.submit(request).wait() {
            Ok(v) => print_value(&v, 0),
            Err(e) => {
                eprintln!("(error) {e}");
                break;
            }
        }
    }

    transport.disconnect();
    Ok(())
}

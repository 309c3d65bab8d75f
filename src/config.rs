/*!
 * Client Configuration
 *
 * Everything `Transport::connect` needs to open and size the connection.
 * Not a config-file/env-var layer — configuration stays out of the
 * transport's scope beyond what it takes to open a socket, so this is a
 * plain struct with sane defaults.
 */

use std::net::SocketAddr;
use std::time::Duration;

/// Default RESP/Redis TCP port.
pub const DEFAULT_PORT: u16 = 6379;

/// Fixed read/write buffer size the transport allocates per connection.
pub const DEFAULT_BUF_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub addr: SocketAddr,
    pub read_buf_size: usize,
    pub write_buf_size: usize,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(addr: SocketAddr) -> Self {
        ClientConfig {
            addr,
            read_buf_size: DEFAULT_BUF_SIZE,
            write_buf_size: DEFAULT_BUF_SIZE,
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_read_buf_size(mut self, size: usize) -> Self {
        self.read_buf_size = size;
        self
    }

    pub fn with_write_buf_size(mut self, size: usize) -> Self {
        self.write_buf_size = size;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

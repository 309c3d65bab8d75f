// Pipelined RESP client library.
pub mod codec; // streaming decoder + segment encoder
pub mod combinators; // parser combinator primitives the codec is built from
pub mod commands; // illustrative PING/GET/SET/DEL command surface
pub mod config; // ClientConfig
pub mod error; // RespError, TransportError
pub mod transport; // Transport, Completion, the background reactor
pub mod value; // Value (the six RESP v1 variants)

pub use config::{ClientConfig, DEFAULT_BUF_SIZE, DEFAULT_PORT};
pub use error::{RespError, TransportError};
pub use transport::{Completion, Transport};
pub use value::Value;

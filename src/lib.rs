//! Sans-IO http 1.x parsing, one byte at a time.
//!
//! This library is the receiving half of an http 1.x implementation: an
//! incremental parser that turns a stream of bytes into callbacks marking
//! the boundaries of the syntactic elements of requests and responses. It
//! does no I/O, holds no buffers, allocates nothing and never looks ahead
//! of the byte it is on. What to do with the elements, and where the bytes
//! come from, is entirely up to the caller.
//!
//! One [`Parser`] is created per logical byte stream (typically one TCP
//! connection) and reused for every message on it, including pipelined
//! messages and the trailing headers of chunked bodies.
//!
//! ```
//! use peck::{Handler, Kind, Parser};
//!
//! #[derive(Default)]
//! struct Collect {
//!     url: Vec<u8>,
//! }
//!
//! impl Handler for Collect {
//!     fn on_url(&mut self, raw: &[u8]) -> bool {
//!         // The slice borrows the input buffer. Copy to retain.
//!         self.url.extend_from_slice(raw);
//!         true
//!     }
//! }
//!
//! let mut parser = Parser::new(Kind::Request);
//! let mut collect = Collect::default();
//!
//! let input = b"GET /hello HTTP/1.1\r\nHost: example.test\r\n\r\n";
//!
//! // The input can arrive in chunks of any size, down to single bytes.
//! let consumed = parser.advance(&mut collect, input).unwrap();
//!
//! assert_eq!(consumed, input.len());
//! assert_eq!(collect.url, b"/hello");
//! assert_eq!(parser.method(), Some(peck::Method::Get));
//! assert!(parser.should_keep_alive());
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::uninlined_format_args)]

#[macro_use]
extern crate log;

// Re-export the basis for this library.
pub use http;

mod error;
pub use error::{Callback, Error};

mod handler;
pub use handler::{Handler, HeadersEnd};

mod method;
pub use method::Method;

mod tables;

mod parser;
pub use parser::{Kind, Parser, MAX_HEADER_SIZE};

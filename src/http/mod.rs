//! The request/response shape the core drives: a case-insensitive header
//! map with a standalone header-preamble parser, a multipart form
//! builder, a JSON-streaming body adapter, and a thin connection wrapper
//! over `reqwest`.

pub mod connection;
pub mod form;
pub mod headers;
pub mod json_body;

pub use connection::{ConnectOptions, Connection};
pub use form::FormBuilder;
pub use headers::{HeaderMap, HeaderParser, ResponseHead};
pub use json_body::JsonBodyWriter;

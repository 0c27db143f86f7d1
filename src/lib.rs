//! gzserve - single-request TCP server with gzip content negotiation
//!
//! Core library: line framing, request parsing, `Accept-Encoding`
//! negotiation, resource resolution and response serialization.

pub mod config;
pub mod content;
pub mod http;
pub mod server;

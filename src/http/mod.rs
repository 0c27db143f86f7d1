//! Request/response framing and content negotiation.
//!
//! # Architecture
//!
//! - **`lines`**: splits the incoming byte stream into CRLF-terminated lines
//! - **`parser`**: request line and header block parsing
//! - **`request`**: request head representation
//! - **`negotiate`**: `Accept-Encoding` handling (gzip vs identity)
//! - **`response`**: status codes, response builder, gzip body encoding
//! - **`writer`**: serializes and writes responses to the client
//! - **`mime`**: content type detection based on file extensions
//! - **`connection`**: the per-connection state machine tying these together
//!
//! # Connection State Machine
//!
//! Each connection serves a single request:
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitRequestLine │ ← Wait for "METHOD TARGET VERSION"
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │   AwaitHeaders   │ ← Header lines up to the blank line
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │     Resolve      │ ← Look up target, negotiate encoding
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │     Respond      │ ← Send response to client
//!        └────────┬─────────┘
//!                 ▼
//!              Closed
//! ```
//!
//! A malformed request or an idle timeout skips straight to `Respond` with a
//! 400 or 408; a peer that disconnects early goes straight to `Closed`.

pub mod connection;
pub mod lines;
pub mod mime;
pub mod negotiate;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
